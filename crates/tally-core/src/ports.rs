use async_trait::async_trait;

use crate::{
    domain::{ChatId, MarkerId, MessageRef, UserId},
    Result,
};

/// Hexagonal port for outbound messaging.
///
/// Telegram is the first implementation; the shape is small enough that other
/// platforms (Discord/Slack) can fit behind the same interface.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Acknowledge an accepted counting move. Best-effort; platforms without
    /// reactions may approximate or skip this.
    async fn react_ok(&self, msg: MessageRef) -> Result<()>;

    /// Rotate the bot's visible status line. Best-effort.
    async fn set_presence(&self, status: &str) -> Result<()>;
}

/// Document store with get/set-by-key semantics.
///
/// Holds the counter document, per-identity moderation markers and the
/// last-announced-video document.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn put(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Per-identity moderation marker flags ("has a strike marker", "has a ban
/// marker").
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn has_marker(&self, user: &UserId, marker: &MarkerId) -> Result<bool>;
    async fn grant_marker(&self, user: &UserId, marker: &MarkerId) -> Result<()>;
}
