//! Database operations for support-chat messages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bluebell_core::{ChatMessageId, UserId};

use super::RepositoryError;
use crate::models::chat::{ChatMessage, ConversationSummary};

/// Internal row type for chat message queries.
#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: ChatMessageId,
    sender_id: UserId,
    recipient_id: UserId,
    body: String,
    from_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            body: row.body,
            from_admin: row.from_admin,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for the conversation listing.
#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    customer_id: UserId,
    customer_name: String,
    last_message: String,
    last_from_admin: bool,
    last_message_at: DateTime<Utc>,
}

impl From<ConversationRow> for ConversationSummary {
    fn from(row: ConversationRow) -> Self {
        Self {
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            last_message: row.last_message,
            last_from_admin: row.last_from_admin,
            last_message_at: row.last_message_at,
        }
    }
}

/// Repository for chat database operations.
pub struct ChatRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails; the caller
    /// treats that as the send failing.
    pub async fn insert(
        &self,
        sender: UserId,
        recipient: UserId,
        body: &str,
        from_admin: bool,
    ) -> Result<ChatMessage, RepositoryError> {
        let row: ChatMessageRow = sqlx::query_as(
            "INSERT INTO chat_messages (sender_id, recipient_id, body, from_admin)
             VALUES ($1, $2, $3, $4)
             RETURNING id, sender_id, recipient_id, body, from_admin, created_at",
        )
        .bind(sender)
        .bind(recipient)
        .bind(body)
        .bind(from_admin)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Full history of one customer's conversation with support,
    /// chronological.
    ///
    /// The customer side of a message is the sender for customer messages
    /// and the recipient for admin messages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn conversation(
        &self,
        customer: UserId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows: Vec<ChatMessageRow> = sqlx::query_as(
            "SELECT id, sender_id, recipient_id, body, from_admin, created_at
             FROM chat_messages
             WHERE (NOT from_admin AND sender_id = $1)
                OR (from_admin AND recipient_id = $1)
             ORDER BY created_at ASC, id ASC",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// One row per customer with the latest message exchanged, newest
    /// conversation first (the admin's conversation list).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_conversations(
        &self,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            "SELECT customer_id, u.display_name AS customer_name,
                    body AS last_message, from_admin AS last_from_admin,
                    created_at AS last_message_at
             FROM (
                 SELECT DISTINCT ON (customer_id) *
                 FROM (
                     SELECT CASE WHEN from_admin THEN recipient_id
                                 ELSE sender_id END AS customer_id,
                            body, from_admin, created_at, id
                     FROM chat_messages
                 ) tagged
                 ORDER BY customer_id, created_at DESC, id DESC
             ) latest
             JOIN users u ON u.id = latest.customer_id
             ORDER BY last_message_at DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
