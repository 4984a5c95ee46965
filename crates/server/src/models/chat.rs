//! Support-chat domain models.
//!
//! Every message is a standalone row; there is no conversation entity. A
//! conversation is identified by its customer side: the sender when the
//! message came from a customer, the recipient when it came from the shared
//! support identity.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bluebell_core::{ChatMessageId, UserId};

/// A persisted chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    #[serde(rename = "sender")]
    pub sender_id: UserId,
    #[serde(rename = "receiver")]
    pub recipient_id: UserId,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "isAdmin")]
    pub from_admin: bool,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// The customer side of this message's conversation.
    #[must_use]
    pub const fn conversation_id(&self) -> UserId {
        if self.from_admin {
            self.recipient_id
        } else {
            self.sender_id
        }
    }
}

/// One row of the admin's conversation list: a customer plus the latest
/// message exchanged with them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub customer_id: UserId,
    pub customer_name: String,
    pub last_message: String,
    pub last_from_admin: bool,
    pub last_message_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(sender: i32, recipient: i32, from_admin: bool) -> ChatMessage {
        ChatMessage {
            id: ChatMessageId::new(1),
            sender_id: UserId::new(sender),
            recipient_id: UserId::new(recipient),
            body: "hello".to_string(),
            from_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_conversation_id_is_customer_side() {
        // Customer 7 writes to support 1: conversation belongs to 7
        assert_eq!(message(7, 1, false).conversation_id(), UserId::new(7));
        // Support 1 replies to customer 7: still conversation 7
        assert_eq!(message(1, 7, true).conversation_id(), UserId::new(7));
    }

    #[test]
    fn test_message_json_uses_source_field_names() {
        let json = serde_json::to_value(message(7, 1, false)).unwrap();
        assert_eq!(json["sender"], 7);
        assert_eq!(json["receiver"], 1);
        assert_eq!(json["message"], "hello");
        assert_eq!(json["isAdmin"], false);
        assert!(json.get("timestamp").is_some());
    }
}
