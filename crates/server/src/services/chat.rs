//! Support-chat service: persistence rules and realtime fan-out.
//!
//! # Attribution
//!
//! All admin accounts collapse into one logical counterparty. Messages sent
//! by any admin are recorded with the shared support identity as the
//! sender; this is an explicit routing rule here, not a middleware that
//! rewrites the authenticated identity.
//!
//! # Delivery
//!
//! Fan-out rides a `tokio::sync::broadcast` channel. Publishing happens
//! after the row is committed and is best-effort: a message counts as sent
//! once persisted, even if no subscriber sees the live event. A lagged
//! subscriber drops events and recovers by re-fetching history.

use thiserror::Error;
use tokio::sync::broadcast;

use bluebell_core::UserId;

use crate::db::RepositoryError;
use crate::db::chat::ChatRepository;
use crate::db::users::UserRepository;
use crate::models::chat::ChatMessage;
use crate::models::user::User;

/// Default buffered events per subscriber before lagging.
const RELAY_CAPACITY: usize = 256;

/// A realtime chat event: a persisted message tagged with its room.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    /// The room: the customer side of the conversation.
    pub conversation_id: UserId,
    /// The persisted message.
    pub message: ChatMessage,
}

/// Broadcast hub connecting chat senders to connected sockets.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    tx: broadcast::Sender<ChatEvent>,
}

impl ChatRelay {
    /// Create a relay with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(RELAY_CAPACITY);
        Self { tx }
    }

    /// Subscribe to all chat events; subscribers filter by room.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    /// Publish a persisted message to connected subscribers. Best-effort:
    /// an empty subscriber set is not an error.
    pub fn publish(&self, message: ChatMessage) {
        let event = ChatEvent {
            conversation_id: message.conversation_id(),
            message,
        };
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("chat event dropped, no connected subscribers: {e}");
        }
    }
}

impl Default for ChatRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when sending a chat message.
#[derive(Debug, Error)]
pub enum ChatSendError {
    /// The message body is empty after trimming.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// An admin send must name the customer it replies to.
    #[error("recipientId is required when sending as support")]
    MissingRecipient,

    /// The named recipient does not exist.
    #[error("recipient not found")]
    RecipientNotFound,

    /// Support conversations pair one customer with the support identity;
    /// admin-to-admin messages are not a thing.
    #[error("recipient is not a customer")]
    RecipientNotCustomer,

    /// Persistence failed; the message does not count as sent.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Chat service: applies the attribution rules, persists, then publishes.
pub struct ChatService<'a> {
    messages: ChatRepository<'a>,
    users: UserRepository<'a>,
    relay: &'a ChatRelay,
    support_id: UserId,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(
        pool: &'a sqlx::PgPool,
        relay: &'a ChatRelay,
        support_id: UserId,
    ) -> Self {
        Self {
            messages: ChatRepository::new(pool),
            users: UserRepository::new(pool),
            relay,
            support_id,
        }
    }

    /// The shared support identity.
    #[must_use]
    pub const fn support_id(&self) -> UserId {
        self.support_id
    }

    /// Send a message as `sender`.
    ///
    /// Customers always write to the support identity; `recipient` is
    /// ignored for them. Admins must name a customer and are recorded as
    /// the support identity.
    ///
    /// # Errors
    ///
    /// Returns `ChatSendError::Repository` if persistence fails (the send
    /// failed); publish failures are not errors.
    pub async fn send(
        &self,
        sender: &User,
        recipient: Option<UserId>,
        body: &str,
    ) -> Result<ChatMessage, ChatSendError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatSendError::EmptyMessage);
        }

        let (sender_id, recipient_id, from_admin) = if sender.is_admin {
            let customer = recipient.ok_or(ChatSendError::MissingRecipient)?;
            let customer_user = self
                .users
                .get_by_id(customer)
                .await?
                .ok_or(ChatSendError::RecipientNotFound)?;
            if customer_user.is_admin {
                return Err(ChatSendError::RecipientNotCustomer);
            }
            (self.support_id, customer, true)
        } else {
            (sender.id, self.support_id, false)
        };

        let message = self
            .messages
            .insert(sender_id, recipient_id, body, from_admin)
            .await?;

        self.relay.publish(message.clone());
        Ok(message)
    }

    /// Whether `user` may read/join the conversation of `conversation_id`.
    ///
    /// Admins may read any conversation; a customer only their own.
    #[must_use]
    pub fn may_access(user: &User, conversation_id: UserId) -> bool {
        user.is_admin || user.id == conversation_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bluebell_core::ChatMessageId;
    use chrono::Utc;

    fn message(sender: i32, recipient: i32, from_admin: bool) -> ChatMessage {
        ChatMessage {
            id: ChatMessageId::new(1),
            sender_id: UserId::new(sender),
            recipient_id: UserId::new(recipient),
            body: "hi".to_string(),
            from_admin,
            created_at: Utc::now(),
        }
    }

    fn user(id: i32, is_admin: bool) -> User {
        User {
            id: UserId::new(id),
            email: bluebell_core::Email::parse("u@example.com").unwrap(),
            display_name: "U".to_string(),
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let relay = ChatRelay::new();
        relay.publish(message(7, 1, false));
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event_with_room() {
        let relay = ChatRelay::new();
        let mut rx = relay.subscribe();

        relay.publish(message(1, 7, true));

        let event = rx.recv().await.unwrap();
        // Admin message to customer 7 lands in room 7
        assert_eq!(event.conversation_id, UserId::new(7));
        assert!(event.message.from_admin);
    }

    #[test]
    fn test_access_rules() {
        let admin = user(1, true);
        let customer = user(7, false);
        let other = user(8, false);

        assert!(ChatService::may_access(&admin, UserId::new(7)));
        assert!(ChatService::may_access(&customer, UserId::new(7)));
        assert!(!ChatService::may_access(&other, UserId::new(7)));
    }
}
