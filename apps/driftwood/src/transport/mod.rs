//! Ports to the outside world: unique-id generation, batch submission over
//! HTTP, and the long-lived push subscription. The sync engine only ever
//! talks to these traits; production implementations live in [`http`] and
//! [`websocket`], and tests substitute in-memory mocks.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::model::ItemId;
use crate::protocol::BatchEntry;

pub mod http;
pub mod websocket;

pub use http::HttpApi;
pub use websocket::WebSocketSubscriber;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    HttpStatus(StatusCode),
    #[error("subscription connect failed: {0}")]
    Connect(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Produces a globally unique opaque id on demand. Uniqueness is the
/// implementation's problem; the engine performs no collision handling.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> ItemId;
}

/// UUID v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&self) -> ItemId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Accepts one batch of mutations. A failure means the whole batch must be
/// resubmitted; partial acceptance is never assumed.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn submit(&self, batch: &[BatchEntry]) -> Result<(), TransportError>;
}

/// What a live subscription can yield. Connection loss is an event of its
/// own rather than an error so the feed can tell "nothing arrived yet"
/// apart from "the stream is gone".
#[derive(Debug)]
pub enum PushEvent {
    Message(String),
    Disconnected(String),
}

/// One open subscription. Yields payloads until the connection drops, after
/// which every call reports `Disconnected`.
#[async_trait]
pub trait PushStream: Send {
    async fn next_event(&mut self) -> PushEvent;
}

/// Opens fresh subscriptions to the canonical list resource. Called once at
/// startup and again after every drop.
#[async_trait]
pub trait PushSubscriber: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn PushStream>, TransportError>;
}
