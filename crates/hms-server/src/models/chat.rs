//! Direct messages between users.

use super::user::UserView;
use crate::store::DocumentMeta;
use chrono::{DateTime, Utc};
use hms_common_core::{MessageId, UserId};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub meta: DocumentMeta,
}

impl_document!(ChatMessage, "messages");

impl ChatMessage {
    pub fn new(sender_id: UserId, recipient_id: UserId, body: String) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            recipient_id,
            body,
            read_at: None,
            meta: DocumentMeta::new(),
        }
    }

    /// The participant that is not `me`.
    pub fn counterpart(&self, me: UserId) -> UserId {
        if self.sender_id == me {
            self.recipient_id
        } else {
            self.sender_id
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: UserId,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// One row of the conversation list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub user: UserView,
    pub last_message: ChatMessage,
    pub unread_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub marked: u64,
}
