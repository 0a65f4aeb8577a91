use std::env;

use thiserror::Error;
use url::Url;

const SERVER_ENV: &str = "DRIFTWOOD_SERVER";
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

/// Where the list server lives. Accepts bare `host:port` as well as full
/// http(s) URLs and derives the REST and websocket endpoints from one base.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid client configuration: {0}")]
    Invalid(String),
}

impl ClientConfig {
    pub fn new(server: impl AsRef<str>) -> Result<Self, ConfigError> {
        let mut base = server.as_ref().trim().to_string();
        if base.is_empty() {
            return Err(ConfigError::Invalid("server base url cannot be empty".into()));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            base = format!("http://{base}");
        }
        let base_url = Url::parse(&base)
            .map_err(|err| ConfigError::Invalid(format!("invalid server url: {err}")))?;
        Ok(Self { base_url })
    }

    /// Load from `DRIFTWOOD_SERVER`, falling back to the local default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = env::var(SERVER_ENV).unwrap_or_else(|_| DEFAULT_SERVER.to_string());
        Self::new(server)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// REST endpoint carrying the list and accepting mutation batches.
    pub fn todos_endpoint(&self) -> Result<Url, ConfigError> {
        self.base_url
            .join("api/todos")
            .map_err(|err| ConfigError::Invalid(format!("unable to construct todos endpoint: {err}")))
    }

    /// Websocket address of the push subscription for the same resource.
    pub fn watch_endpoint(&self) -> Result<Url, ConfigError> {
        let mut url = self.base_url.join("api/todos/watch").map_err(|err| {
            ConfigError::Invalid(format!("unable to construct watch endpoint: {err}"))
        })?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::Invalid("unable to derive websocket scheme".into()))?;
        Ok(url)
    }
}
