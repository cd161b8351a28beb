//! Inbound update handling.
//!
//! One message endpoint routes everything: member joins to the welcome
//! sender, staff `!stream` commands to the announcement path, and texts in
//! the counting chat into the counting game. Everything else is dropped.

use std::sync::Arc;

use teloxide::{prelude::*, types::User};
use tracing::warn;

use tally_core::{
    domain::{ChatId, CountAttempt, EventId, MessageId, MessageRef, UserId},
    stream, welcome,
};

use crate::router::AppState;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Member joins carry no useful `from` filtering; handle them first.
    if let Some(members) = msg.new_chat_members() {
        handle_join(&bot, &msg, members, &state).await;
        return Ok(());
    }

    let Some(user) = msg.from() else {
        return Ok(());
    };
    if user.is_bot {
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with("/testwelcome") {
        handle_test_welcome(&bot, &msg, user, &state).await;
        return Ok(());
    }

    if state.cfg.stream_staff_chat_id == Some(ChatId(msg.chat.id.0)) {
        if let Some(title) = stream::parse_command(text) {
            stream::handle_command(
                state.messenger.as_ref(),
                ChatId(msg.chat.id.0),
                state.cfg.stream_announce_chat_id,
                state.cfg.stream_channel_name.as_deref(),
                state.cfg.stream_ping_tag.as_deref(),
                title,
            )
            .await;
            return Ok(());
        }
    }

    if let Some(game) = &state.game {
        if game.chat_id() == ChatId(msg.chat.id.0) {
            let attempt = CountAttempt {
                text: text.to_string(),
                author: UserId(user.id.0.to_string()),
                author_name: display_name(user),
                event_id: EventId(format!("{}:{}", msg.chat.id.0, msg.id.0)),
                message: MessageRef {
                    chat_id: ChatId(msg.chat.id.0),
                    message_id: MessageId(msg.id.0),
                },
            };
            game.handle_attempt(attempt).await;
        }
    }

    Ok(())
}

async fn handle_join(bot: &Bot, msg: &Message, members: &[User], state: &AppState) {
    let Some(welcome_chat) = state.cfg.welcome_chat_id else {
        return;
    };

    let member_count = bot
        .get_chat_member_count(msg.chat.id)
        .await
        .map(u64::from)
        .unwrap_or(0);
    let chat_name = msg.chat.title().unwrap_or("this chat").to_string();

    for member in members {
        if member.is_bot {
            continue;
        }
        let text = welcome::render(&display_name(member), member_count, &chat_name);
        if let Err(e) = state.messenger.send_text(welcome_chat, &text).await {
            warn!(error = %e, "welcome send failed");
        }
    }
}

async fn handle_test_welcome(bot: &Bot, msg: &Message, user: &User, state: &AppState) {
    let Some(welcome_chat) = state.cfg.welcome_chat_id else {
        let _ = bot
            .send_message(msg.chat.id, "Welcome messages are not configured.")
            .await;
        return;
    };

    // Only chat admins may trigger test welcomes.
    let admins = bot
        .get_chat_administrators(msg.chat.id)
        .await
        .unwrap_or_default();
    if !admins.iter().any(|m| m.user.id == user.id) {
        let _ = bot.send_message(msg.chat.id, "❌ No permission.").await;
        return;
    }

    let member_count = bot
        .get_chat_member_count(msg.chat.id)
        .await
        .map(u64::from)
        .unwrap_or(0);
    let chat_name = msg.chat.title().unwrap_or("this chat").to_string();
    let text = welcome::render(&display_name(user), member_count, &chat_name);

    if let Err(e) = state.messenger.send_text(welcome_chat, &text).await {
        warn!(error = %e, "test welcome send failed");
        return;
    }
    let _ = bot
        .send_message(msg.chat.id, format!("✅ Test welcome sent to {}", display_name(user)))
        .await;
}

fn display_name(user: &User) -> String {
    user.username
        .as_ref()
        .map(|u| format!("@{u}"))
        .unwrap_or_else(|| user.first_name.clone())
}
