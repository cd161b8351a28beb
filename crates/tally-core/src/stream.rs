//! Stream announcements: staff post `!stream <title>` and the bot formats a
//! live announcement for the public chat.

use tracing::warn;

use crate::{domain::ChatId, ports::MessagingPort};

/// Extract the title from a `!stream` command. `None` when the text is not a
/// stream command at all; an empty title comes back as `Some("")` so the
/// caller can complain to the invoker.
pub fn parse_command(text: &str) -> Option<&str> {
    text.strip_prefix("!stream").map(str::trim)
}

pub fn announcement(channel_name: &str, ping_tag: Option<&str>, title: &str) -> String {
    let ping = ping_tag.map(|p| format!("{p} ")).unwrap_or_default();
    format!(
        "{ping}{channel_name} is live on Twitch right now!\n\
         Go to https://www.twitch.tv/{channel_name} to watch!\n\
         {title}"
    )
}

/// Run a parsed `!stream` command: post the announcement and tell the
/// invoker how it went. Every reply is best-effort; nothing propagates.
pub async fn handle_command(
    messenger: &dyn MessagingPort,
    invoker_chat: ChatId,
    announce_chat: Option<ChatId>,
    channel_name: Option<&str>,
    ping_tag: Option<&str>,
    title: &str,
) {
    if title.is_empty() {
        reply(messenger, invoker_chat, "❌ You need to include a stream title.").await;
        return;
    }

    let Some(announce_chat) = announce_chat else {
        reply(messenger, invoker_chat, "❌ Streams chat not found.").await;
        return;
    };

    let text = announcement(channel_name.unwrap_or("the channel"), ping_tag, title);
    match messenger.send_text(announce_chat, &text).await {
        Ok(_) => reply(messenger, invoker_chat, "✅ Stream announcement sent.").await,
        Err(e) => {
            warn!(error = %e, "stream announcement failed");
            reply(messenger, invoker_chat, "❌ Stream announcement failed, nothing was posted.")
                .await;
        }
    }
}

async fn reply(messenger: &dyn MessagingPort, chat: ChatId, text: &str) {
    if let Err(e) = messenger.send_text(chat, text).await {
        warn!(error = %e, "stream command reply failed");
    }
}
