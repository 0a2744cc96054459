//! Push-mode feed source.
//!
//! Maintains a persistent WebSocket connection, sends the round-result
//! subscription handshake on open, and decodes inbound frames. Frames on
//! other channels are ignored; malformed frames are logged and dropped
//! without disturbing the connection; close and transport errors surface as
//! [`FeedEvent::Disconnected`] for the ingestor to handle.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{FeedError, Result};
use crate::feed::messages::{parse_round_result, SubscribeFrame};
use crate::feed::{FeedEvent, OutcomeStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket source for the round-result feed.
pub struct PushSource {
    url: String,
    ws: Option<WsStream>,
}

impl PushSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ws: None,
        }
    }
}

#[async_trait]
impl OutcomeStream for PushSource {
    async fn connect(&mut self) -> Result<()> {
        info!(url = %self.url, "Connecting to feed WebSocket");

        let (mut ws, response) = connect_async(&self.url)
            .await
            .map_err(|e| FeedError::SourceUnavailable(format!("connect failed: {e}")))?;

        info!(status = %response.status(), "Feed WebSocket connected");

        let handshake = serde_json::to_string(&SubscribeFrame::round_results())?;
        ws.send(Message::Text(handshake))
            .await
            .map_err(|e| FeedError::SourceUnavailable(format!("handshake failed: {e}")))?;

        self.ws = Some(ws);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        let ws = self.ws.as_mut()?;

        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    debug!(raw = %text, "Received frame");
                    match parse_round_result(&text) {
                        Ok(Some(outcome)) => return Some(FeedEvent::Outcome(outcome)),
                        Ok(None) => {}
                        Err(e) => {
                            // Drop the single message; the connection stays up
                            warn!(error = %e, "Dropping malformed frame");
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        self.ws = None;
                        return Some(FeedEvent::Disconnected {
                            reason: format!("pong failed: {e}"),
                        });
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "Feed WebSocket closed by server");
                    self.ws = None;
                    return Some(FeedEvent::Disconnected {
                        reason: "closed by server".to_string(),
                    });
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.ws = None;
                    return Some(FeedEvent::Disconnected {
                        reason: e.to_string(),
                    });
                }
                None => {
                    self.ws = None;
                    return Some(FeedEvent::Disconnected {
                        reason: "stream ended".to_string(),
                    });
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "push"
    }
}
