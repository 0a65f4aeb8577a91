pub mod client;
pub mod config;
pub mod model;
pub mod protocol;
pub mod subscription;
pub mod sync;
pub mod telemetry;
pub mod transport;
