//! Direct messaging handlers.

use super::{list_page, update_where};
use crate::error::{invalid_reference, ApiResult};
use crate::middleware::auth::Auth;
use crate::models::{
    fields, ChatMessage, ConversationSummary, MarkReadResponse, SendMessageRequest, UserView,
};
use crate::request::{parse_id, ApiQuery, ListParams, ValidatedJson};
use crate::response::{created, ok, with_message};
use crate::scope::{scope_for, Resource};
use crate::state::AppState;
use crate::store::{Filter, FindOptions, SortOrder, ID};
use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use hms_common_core::UserId;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// `POST /chat/messages`
pub async fn send(
    State(state): State<AppState>,
    Auth(user): Auth,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> ApiResult<Response> {
    if req.recipient_id == user.id {
        return Err(invalid_reference("recipientId", "you cannot message yourself"));
    }
    match state.users.get(req.recipient_id.as_uuid()).await? {
        Some(recipient) if recipient.is_active() => {}
        _ => {
            return Err(invalid_reference(
                "recipientId",
                format_args!("no active user with id {}", req.recipient_id),
            ))
        }
    }

    let message = ChatMessage::new(user.id, req.recipient_id, req.body);
    let message = state.messages.insert(message).await?;
    debug!(message_id = %message.id, sender_id = %user.id, "Message sent");
    Ok(created(message, "Message sent"))
}

/// `GET /chat/conversations`: one row per counterpart, most recent first.
pub async fn conversations(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> ApiResult<Response> {
    let filter = scope_for(Resource::ChatMessage, &user, false)?;
    let messages = state
        .messages
        .find(&filter, FindOptions::default().sorted(SortOrder::NewestFirst))
        .await?;

    let mut order: Vec<UserId> = Vec::new();
    let mut latest: HashMap<UserId, ChatMessage> = HashMap::new();
    let mut unread: HashMap<UserId, u64> = HashMap::new();

    for message in messages {
        let other = message.counterpart(user.id);
        if message.recipient_id == user.id && message.read_at.is_none() {
            *unread.entry(other).or_default() += 1;
        }
        if !latest.contains_key(&other) {
            order.push(other);
            latest.insert(other, message);
        }
    }

    let mut summaries = Vec::with_capacity(order.len());
    for other in order {
        let Some(account) = state.users.get(other.as_uuid()).await? else {
            continue;
        };
        if let Some(last_message) = latest.remove(&other) {
            summaries.push(ConversationSummary {
                user: UserView::from(account),
                last_message,
                unread_count: unread.get(&other).copied().unwrap_or(0),
            });
        }
    }
    Ok(ok(summaries))
}

/// `GET /chat/messages/:userId`: the thread with one user, oldest first.
pub async fn thread(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(other): Path<String>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Response> {
    let other: UserId = parse_id(&other, "user")?;
    let filter = scope_for(Resource::ChatMessage, &user, false)?.or(vec![
        Filter::new()
            .eq(fields::SENDER_ID, user.id)
            .eq(fields::RECIPIENT_ID, other),
        Filter::new()
            .eq(fields::SENDER_ID, other)
            .eq(fields::RECIPIENT_ID, user.id),
    ]);
    list_page(&*state.messages, &filter, &params, SortOrder::OldestFirst).await
}

/// `POST /chat/messages/:userId/read`: mark everything from that user read.
pub async fn mark_read(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(other): Path<String>,
) -> ApiResult<Response> {
    let other: UserId = parse_id(&other, "user")?;
    let filter = scope_for(Resource::ChatMessage, &user, false)?
        .eq(fields::SENDER_ID, other)
        .eq(fields::RECIPIENT_ID, user.id)
        .eq(fields::READ_AT, Value::Null);
    let unread = state.messages.find(&filter, FindOptions::default()).await?;

    let now = Utc::now();
    let mut marked = 0;
    for message in unread {
        let still_unread = Filter::new()
            .eq(ID, message.id)
            .eq(fields::READ_AT, Value::Null);
        let updated = update_where(
            &*state.messages,
            &still_unread,
            None,
            |message: &mut ChatMessage, _: &[ChatMessage]| {
                message.read_at = Some(now);
                Ok(())
            },
        )
        .await?;
        if updated.is_some() {
            marked += 1;
        }
    }

    if marked > 0 {
        info!(reader = %user.id, sender = %other, marked, "Messages marked read");
    }
    Ok(with_message(MarkReadResponse { marked }, "Messages marked as read"))
}
