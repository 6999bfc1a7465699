//! WebSocket transport over tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use crate::error::FeedError;
use crate::port::outbound::feed::{FeedTransport, Frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One WebSocket connection to a venue. Reusable across reconnects.
pub struct WebSocketTransport {
    url: String,
    ws: Option<WsStream>,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ws: None,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn stream(&mut self) -> Result<&mut WsStream, FeedError> {
        self.ws.as_mut().ok_or(FeedError::NotConnected)
    }
}

#[async_trait]
impl FeedTransport for WebSocketTransport {
    async fn connect(&mut self) -> Result<(), FeedError> {
        info!(url = %self.url, "Connecting to WebSocket");
        let (ws, response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        info!(url = %self.url, status = %response.status(), "WebSocket connected");
        self.ws = Some(ws);
        Ok(())
    }

    async fn send(&mut self, message: String) -> Result<(), FeedError> {
        trace!(bytes = message.len(), "Sending WebSocket text frame");
        self.stream()?
            .send(Message::Text(message))
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))
    }

    async fn ping(&mut self) -> Result<(), FeedError> {
        self.stream()?
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))
    }

    async fn next_frame(&mut self) -> Option<Frame> {
        let ws = self.ws.as_mut()?;
        loop {
            match ws.next().await? {
                Ok(Message::Text(text)) => return Some(Frame::Text(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Frame::Text(text)),
                    Err(_) => trace!("Ignoring non-UTF-8 binary frame"),
                },
                Ok(Message::Ping(data)) => {
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return Some(Frame::Closed {
                            reason: format!("failed to send pong: {e}"),
                        });
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!(frame = ?frame, "WebSocket closed by server");
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return Some(Frame::Closed { reason });
                }
                Ok(Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => {
                    return Some(Frame::Closed {
                        reason: e.to_string(),
                    })
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            if let Err(e) = ws.close(None).await {
                trace!(error = %e, "WebSocket close handshake failed");
            }
        }
    }
}
