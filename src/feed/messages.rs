//! Wire messages for the feed source protocols.
//!
//! Poll mode speaks JSON over HTTP against the remote proxy; push mode speaks
//! JSON frames over a persistent WebSocket. Both funnel into [`Outcome`] via
//! [`OutcomeDto`], with out-of-contract payloads surfacing as
//! [`FeedError::Protocol`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Outcome;
use crate::error::FeedError;

/// The push channel carrying round results. Frames on any other channel are
/// ignored.
pub const ROUND_RESULTS_CHANNEL: &str = "round-results";

/// Highest valid roll value.
const MAX_ROLL: u8 = 14;

/// A round outcome as the feed serializes it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeDto {
    pub id: IdValue,
    pub created_at: DateTime<Utc>,
    pub roll: u8,
}

/// Feed ids arrive as either strings or integers depending on the source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IdValue {
    Text(String),
    Number(i64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

impl TryFrom<OutcomeDto> for Outcome {
    type Error = FeedError;

    fn try_from(dto: OutcomeDto) -> Result<Self, FeedError> {
        if dto.roll > MAX_ROLL {
            return Err(FeedError::Protocol(format!(
                "roll {} outside 0..={MAX_ROLL}",
                dto.roll
            )));
        }
        Ok(Self::new(dto.id.into_string(), dto.created_at, dto.roll))
    }
}

/// `GET /recent-outcomes` response envelope.
#[derive(Debug, Deserialize)]
pub struct RecentOutcomesResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<OutcomeDto>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /simulate-new-outcome` response envelope.
#[derive(Debug, Deserialize)]
pub struct SimulateResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<OutcomeDto>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outbound push-mode subscription handshake.
#[derive(Debug, Serialize)]
pub struct SubscribeFrame {
    pub action: &'static str,
    pub channel: &'static str,
}

impl SubscribeFrame {
    #[must_use]
    pub const fn round_results() -> Self {
        Self {
            action: "subscribe",
            channel: ROUND_RESULTS_CHANNEL,
        }
    }
}

/// Inbound push-mode frame. Only the channel field is interpreted before the
/// payload is decoded.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    pub channel: String,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// Decode a push-mode text frame.
///
/// Returns `Ok(None)` for frames on other channels (they are ignored, not
/// errors); returns [`FeedError::Protocol`] when a round-result frame cannot
/// be decoded.
pub fn parse_round_result(text: &str) -> Result<Option<Outcome>, FeedError> {
    let frame: InboundFrame = serde_json::from_str(text)
        .map_err(|e| FeedError::Protocol(format!("undecodable frame: {e}")))?;

    if frame.channel != ROUND_RESULTS_CHANNEL {
        return Ok(None);
    }

    let payload = frame
        .payload
        .ok_or_else(|| FeedError::Protocol("round-result frame without payload".to_string()))?;
    let dto: OutcomeDto = serde_json::from_value(payload)
        .map_err(|e| FeedError::Protocol(format!("undecodable round result: {e}")))?;

    Ok(Some(dto.try_into()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;

    #[test]
    fn parses_round_result_frame() {
        let text = r#"{
            "channel": "round-results",
            "payload": {"id": "abc-123", "createdAt": "2024-05-01T12:00:00Z", "roll": 7}
        }"#;

        let outcome = parse_round_result(text).unwrap().unwrap();
        assert_eq!(outcome.id.as_str(), "abc-123");
        assert_eq!(outcome.roll, 7);
        assert_eq!(outcome.category(), Category::Primary);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let text = r#"{
            "channel": "round-results",
            "payload": {"id": 991, "createdAt": "2024-05-01T12:00:00Z", "roll": 0}
        }"#;

        let outcome = parse_round_result(text).unwrap().unwrap();
        assert_eq!(outcome.id.as_str(), "991");
    }

    #[test]
    fn other_channels_are_ignored() {
        let text = r#"{"channel": "chat", "payload": {"message": "hi"}}"#;
        assert!(parse_round_result(text).unwrap().is_none());
    }

    #[test]
    fn malformed_frame_is_a_protocol_error() {
        assert!(matches!(
            parse_round_result("not json"),
            Err(FeedError::Protocol(_))
        ));
    }

    #[test]
    fn out_of_range_roll_is_rejected() {
        let text = r#"{
            "channel": "round-results",
            "payload": {"id": "x", "createdAt": "2024-05-01T12:00:00Z", "roll": 15}
        }"#;

        assert!(matches!(
            parse_round_result(text),
            Err(FeedError::Protocol(_))
        ));
    }

    #[test]
    fn recent_outcomes_envelope_defaults_optional_fields() {
        let raw = r#"{"success": true, "data": [], "source": "live", "count": 0}"#;
        let response: RecentOutcomesResponse = serde_json::from_str(raw).unwrap();
        assert!(response.success);
        assert!(response.data.is_empty());
        assert_eq!(response.source.as_deref(), Some("live"));

        let raw = r#"{"success": false, "error": "upstream down"}"#;
        let response: RecentOutcomesResponse = serde_json::from_str(raw).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("upstream down"));
    }

    #[test]
    fn subscribe_frame_shape() {
        let json = serde_json::to_value(SubscribeFrame::round_results()).unwrap();
        assert_eq!(json["action"], "subscribe");
        assert_eq!(json["channel"], "round-results");
    }
}
