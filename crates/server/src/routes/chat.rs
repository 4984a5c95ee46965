//! Support-chat route handlers: history, sending, and the realtime channel.
//!
//! The WebSocket speaks the same events the SPA already uses: inbound
//! `joinChat` and `sendMessage`, outbound `receiveMessage`. Rooms are keyed
//! by the conversation's customer id; customers sit in their own room,
//! admins join rooms explicitly.

use std::collections::HashSet;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use bluebell_core::UserId;

use crate::db::chat::ChatRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::chat::{ChatMessage, ConversationSummary};
use crate::models::user::User;
use crate::services::auth::decode_token;
use crate::services::chat::{ChatService, ChatSendError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    /// Required when the sender is an admin; ignored for customers.
    #[serde(default)]
    pub recipient_id: Option<UserId>,
}

/// Inbound WebSocket events.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum ClientEvent {
    /// Subscribe to a conversation's live messages.
    JoinChat { conversation_id: UserId },
    /// Persist and fan out a message (same rules as `POST /api/chats`).
    SendMessage {
        message: String,
        #[serde(default)]
        recipient_id: Option<UserId>,
    },
}

/// Outbound WebSocket events.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum ServerEvent {
    /// A live message in a room the socket has joined.
    ReceiveMessage { message: ChatMessage },
    /// A rejected client event; the socket stays open.
    Error { message: String },
}

#[derive(Debug, Deserialize, Default)]
pub struct WsParams {
    /// Bearer token fallback for browser WebSocket clients, which cannot
    /// set an Authorization header on the upgrade request.
    pub token: Option<String>,
}

/// `GET /api/chats` (admin) - one row per customer conversation.
pub async fn list_conversations(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>> {
    let conversations = ChatRepository::new(state.pool())
        .list_conversations()
        .await?;
    Ok(Json(conversations))
}

/// `GET /api/chats/{counterpartyId}` - full history, chronological.
///
/// Admins may read any conversation. A customer's only counterparty is the
/// support identity, so anything else is forbidden; their conversation is
/// always their own.
pub async fn history(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(counterparty): Path<UserId>,
) -> Result<Json<Vec<ChatMessage>>> {
    let conversation_id = if user.is_admin {
        counterparty
    } else {
        if counterparty != state.support_user_id() {
            return Err(AppError::Forbidden(
                "customers can only chat with support".to_string(),
            ));
        }
        user.id
    };

    let messages = ChatRepository::new(state.pool())
        .conversation(conversation_id)
        .await?;
    Ok(Json(messages))
}

/// `POST /api/chats` - persist a message, then fan it out.
pub async fn send(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    let service = ChatService::new(state.pool(), state.chat_relay(), state.support_user_id());
    let message = service.send(&user, req.recipient_id, &req.message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /api/chats/ws` - upgrade to the realtime channel.
pub async fn websocket(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let user = authenticate_ws(&state, &headers, params.token.as_deref()).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Authenticate the upgrade request: Authorization header first, `?token=`
/// fallback.
async fn authenticate_ws(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<User> {
    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let token = header_token
        .or(query_token)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let user_id = decode_token(token, &state.config().jwt_secret)?;

    crate::db::users::UserRepository::new(state.pool())
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_string()))
}

/// Drive one connected socket until it closes.
///
/// A single select loop owns both directions, so the joined-room set needs
/// no locking. Lagged subscribers skip ahead; the client re-fetches history
/// to fill gaps, which is also the reconnect story.
async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.chat_relay().subscribe();

    let mut joined: HashSet<UserId> = HashSet::new();
    if !user.is_admin {
        // Customers live in their own room; no explicit join needed.
        joined.insert(user.id);
    }

    tracing::debug!(user_id = %user.id, "Chat socket connected");

    loop {
        tokio::select! {
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_client_event(&state, &user, &mut joined, &text).await;
                        if let Some(event) = reply
                            && send_event(&mut sink, &event).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Ping/pong and binary frames need no handling here.
                    Some(Ok(_)) => {}
                }
            }
            event = events.recv() => {
                match event {
                    Ok(ev) if joined.contains(&ev.conversation_id) => {
                        let out = ServerEvent::ReceiveMessage { message: ev.message };
                        if send_event(&mut sink, &out).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            user_id = %user.id,
                            skipped,
                            "Chat socket lagged; client must re-fetch history"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(user_id = %user.id, "Chat socket disconnected");
}

/// Apply one inbound event; the returned event, if any, goes back to this
/// socket only.
async fn handle_client_event(
    state: &AppState,
    user: &User,
    joined: &mut HashSet<UserId>,
    text: &str,
) -> Option<ServerEvent> {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            return Some(ServerEvent::Error {
                message: format!("unrecognized event: {e}"),
            });
        }
    };

    match event {
        ClientEvent::JoinChat { conversation_id } => {
            if ChatService::may_access(user, conversation_id) {
                joined.insert(conversation_id);
                None
            } else {
                Some(ServerEvent::Error {
                    message: "cannot join another customer's chat".to_string(),
                })
            }
        }
        ClientEvent::SendMessage {
            message,
            recipient_id,
        } => {
            let service =
                ChatService::new(state.pool(), state.chat_relay(), state.support_user_id());
            match service.send(user, recipient_id, &message).await {
                // Delivery happens via the relay subscription.
                Ok(sent) => {
                    // An admin reply implicitly joins the conversation.
                    joined.insert(sent.conversation_id());
                    None
                }
                Err(e @ ChatSendError::Repository(_)) => {
                    tracing::error!(user_id = %user.id, "Chat persist failed: {e}");
                    Some(ServerEvent::Error {
                        message: "message could not be saved".to_string(),
                    })
                }
                Err(e) => Some(ServerEvent::Error {
                    message: e.to_string(),
                }),
            }
        }
    }
}

/// Serialize and send one event; an error means the socket is gone.
async fn send_event(
    sink: &mut (impl SinkExt<Message> + Unpin),
    event: &ServerEvent,
) -> std::result::Result<(), ()> {
    let text = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(text.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_wire_format() {
        let join: ClientEvent =
            serde_json::from_str(r#"{"event":"joinChat","conversationId":7}"#).unwrap();
        assert!(matches!(
            join,
            ClientEvent::JoinChat { conversation_id } if conversation_id == UserId::new(7)
        ));

        let send: ClientEvent =
            serde_json::from_str(r#"{"event":"sendMessage","message":"hello"}"#).unwrap();
        assert!(matches!(
            send,
            ClientEvent::SendMessage { ref message, recipient_id: None } if message == "hello"
        ));
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"typing"}"#).is_err());
    }

    #[test]
    fn test_server_event_wire_format() {
        let event = ServerEvent::Error {
            message: "nope".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_receive_message_event_shape() {
        use bluebell_core::ChatMessageId;
        use chrono::Utc;

        let event = ServerEvent::ReceiveMessage {
            message: ChatMessage {
                id: ChatMessageId::new(1),
                sender_id: UserId::new(7),
                recipient_id: UserId::new(1),
                body: "hi".to_string(),
                from_admin: false,
                created_at: Utc::now(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "receiveMessage");
        assert_eq!(json["message"]["sender"], 7);
        assert_eq!(json["message"]["message"], "hi");
    }
}
