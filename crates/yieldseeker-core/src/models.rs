//! UI-agnostic chat data types
//!
//! These mirror the JSON shapes exchanged with the chat backend and are shared
//! by the controller and any front end.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Shown in place of an agent reply when a send fails.
pub const FALLBACK_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content: String,
    pub is_user: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339, naive ISO 8601 (read as UTC) and epoch milliseconds.
/// Anything else becomes `None` rather than failing the whole message.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_date))
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            date: Some(Utc::now()),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            date: Some(Utc::now()),
        }
    }

    pub fn fallback() -> Self {
        Self::agent(FALLBACK_REPLY)
    }
}

/// A user's chat history as held by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Request body for a new message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
}

/// Envelope around the agent's reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
}

/// Signed login message proving wallet ownership.
///
/// Opaque to the client: it is never validated locally, only forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub message: String,
    pub signature: String,
}

impl AuthToken {
    pub fn new(message: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            signature: signature.into(),
        }
    }

    /// Value for the `Authorization` header: base64 of `{"message":..,"signature":..}`.
    pub fn to_header_value(&self) -> String {
        let json = serde_json::json!({
            "message": self.message,
            "signature": self.signature,
        });
        STANDARD.encode(json.to_string())
    }
}

/// Canned agent messages the chat view opens with.
pub fn welcome_messages() -> Vec<Message> {
    vec![
        Message::agent("Welcome, Wallet Holder!"),
        Message::agent(
            "I'm here to find you the best yield possible. I'll do everything for you but I need \
             to understand your needs first. Let's get started by understanding what you're \
             looking for in your yield-seeking adventures.",
        ),
    ]
}

/// Text the wallet signs to produce an [`AuthToken`].
pub fn login_message(account: &str, issued_at: DateTime<Utc>) -> String {
    format!(
        "Sign in to Yield Seeker\n\nWallet: {}\nIssued at: {}",
        account,
        issued_at.to_rfc3339()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_without_date_parses() {
        let msg: Message = serde_json::from_str(r#"{"content":"Try Aave.","isUser":false}"#).unwrap();
        assert_eq!(msg.content, "Try Aave.");
        assert!(!msg.is_user);
        assert!(msg.date.is_none());
    }

    #[test]
    fn test_message_date_is_normalized() {
        let msg: Message = serde_json::from_str(
            r#"{"content":"hi","isUser":true,"date":"2024-11-02T10:30:00.000Z"}"#,
        )
        .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 11, 2, 10, 30, 0).unwrap();
        assert_eq!(msg.date, Some(expected));
    }

    fn reply_date(date_json: &str) -> Option<DateTime<Utc>> {
        let body = format!(
            r#"{{"message":{{"content":"Try Aave.","isUser":false,"date":{}}}}}"#,
            date_json
        );
        let response: ChatResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.message.content, "Try Aave.");
        response.message.date
    }

    #[test]
    fn test_naive_iso_date_is_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 2, 10, 30, 0).unwrap()
            + chrono::Duration::microseconds(123456);
        assert_eq!(reply_date(r#""2024-11-02T10:30:00.123456""#), Some(expected));
        assert_eq!(
            reply_date(r#""2024-11-02 10:30:00""#),
            Some(Utc.with_ymd_and_hms(2024, 11, 2, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_offset_date_is_converted_to_utc() {
        assert_eq!(
            reply_date(r#""2024-11-02T12:30:00+02:00""#),
            Some(Utc.with_ymd_and_hms(2024, 11, 2, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_epoch_millis_date() {
        assert_eq!(
            reply_date("1730543400000"),
            Some(Utc.with_ymd_and_hms(2024, 11, 2, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_unreadable_date_keeps_the_message() {
        assert_eq!(reply_date(r#""next tuesday""#), None);
        assert_eq!(reply_date("null"), None);
        assert_eq!(reply_date("true"), None);
        assert_eq!(reply_date("1.5"), None);
    }

    #[test]
    fn test_message_serializes_camel_case_and_skips_missing_date() {
        let msg = Message {
            content: "hello".to_string(),
            is_user: true,
            date: None,
        };
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"{"content":"hello","isUser":true}"#);
    }

    #[test]
    fn test_history_user_id_is_optional() {
        let history: ChatHistory = serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert!(history.messages.is_empty());
        assert!(history.user_id.is_none());
    }

    #[test]
    fn test_request_body_omits_user_id_when_absent() {
        let body = SendMessageRequest { content: "gm", user_id: None };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"content":"gm"}"#);

        let body = SendMessageRequest { content: "gm", user_id: Some("0xabc") };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"content":"gm","userId":"0xabc"}"#);
    }

    #[test]
    fn test_auth_header_is_base64_json() {
        let token = AuthToken::new("Sign in", "0xsig");
        let decoded = STANDARD.decode(token.to_header_value()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"{"message":"Sign in","signature":"0xsig"}"#
        );
    }

    #[test]
    fn test_fallback_is_agent_message() {
        let msg = Message::fallback();
        assert!(!msg.is_user);
        assert_eq!(msg.content, FALLBACK_REPLY);
    }

    #[test]
    fn test_login_message_names_account() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let text = login_message("0xABC", at);
        assert!(text.contains("Wallet: 0xABC"));
        assert!(text.contains("2025-01-01T00:00:00+00:00"));
    }
}
