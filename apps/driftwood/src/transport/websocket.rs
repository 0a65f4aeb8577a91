use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::{PushEvent, PushStream, PushSubscriber, TransportError};

/// Push subscriber backed by a websocket to a fixed resource address. Each
/// `connect` opens a brand new socket; reconnect policy lives with the
/// caller.
pub struct WebSocketSubscriber {
    url: Url,
}

impl WebSocketSubscriber {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl PushSubscriber for WebSocketSubscriber {
    async fn connect(&self) -> Result<Box<dyn PushStream>, TransportError> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        Ok(Box::new(WebSocketPushStream { stream }))
    }
}

struct WebSocketPushStream {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushStream for WebSocketPushStream {
    async fn next_event(&mut self) -> PushEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(payload))) => return PushEvent::Message(payload),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(payload) => return PushEvent::Message(payload),
                    Err(_) => return PushEvent::Disconnected("non-utf8 payload".into()),
                },
                // Keepalive traffic; tungstenite answers pings on flush.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return PushEvent::Disconnected(reason);
                }
                Some(Err(err)) => return PushEvent::Disconnected(err.to_string()),
                None => return PushEvent::Disconnected("stream ended".into()),
            }
        }
    }
}
