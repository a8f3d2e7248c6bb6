use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stats::StatDelta;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "idol")]
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Unix milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_changes: Option<StatDelta>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::build(Role::User, content.into(), false)
    }

    /// Empty assistant message that receives streamed chunks.
    pub fn streaming_assistant() -> Self {
        Self::build(Role::Assistant, String::new(), true)
    }

    fn build(role: Role, content: String, is_streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now().timestamp_millis(),
            is_streaming,
            stat_changes: None,
        }
    }
}
