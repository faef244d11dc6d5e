use chrono::{DateTime, Utc};
use gr_core::ActorId;
use serde::Serialize;

/// A chat line broadcast with the next snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Who said it; empty for server notices.
    pub sender_name: String,
    /// The text.
    pub message: String,
    /// When it was said, as epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time_sent: DateTime<Utc>,
    /// Said on the global channel.
    pub is_global: bool,
    /// Only this player receives it; `None` for everyone.
    #[serde(skip)]
    pub recipient: Option<ActorId>,
}

impl ChatMessage {
    /// A line typed by a player.
    pub fn said(sender_name: &str, message: &str, is_global: bool) -> Self {
        Self {
            sender_name: sender_name.to_string(),
            message: message.to_string(),
            time_sent: Utc::now(),
            is_global,
            recipient: None,
        }
    }

    /// A server notice shown only to `recipient`.
    pub fn notice(recipient: ActorId, message: impl Into<String>) -> Self {
        Self {
            sender_name: String::new(),
            message: message.into(),
            time_sent: Utc::now(),
            is_global: false,
            recipient: Some(recipient),
        }
    }

    /// True when `viewer` should receive this line.
    pub fn visible_to(&self, viewer: ActorId) -> bool {
        self.recipient.is_none_or(|r| r == viewer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_private() {
        let me = ActorId::new();
        let notice = ChatMessage::notice(me, "hello");
        assert!(notice.visible_to(me));
        assert!(!notice.visible_to(ActorId::new()));
        assert!(ChatMessage::said("ada", "hi", false).visible_to(ActorId::new()));
    }

    #[test]
    fn wire_shape() {
        let msg = ChatMessage::said("ada", "hi", true);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["senderName"], "ada");
        assert_eq!(json["isGlobal"], true);
        assert!(json["timeSent"].is_i64());
        assert!(json.get("recipient").is_none());
    }
}
