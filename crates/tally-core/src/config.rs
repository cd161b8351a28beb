use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{
    domain::{ChatId, MarkerId},
    errors::Error,
    Result,
};

/// Typed configuration, loaded from the environment (and `.env` if present).
///
/// Feature blocks are independently optional: leaving the counting chat id
/// unset disables the counting game, leaving the YouTube block unset disables
/// upload alerts, and so on. Only the bot token is required.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,

    // Counting game
    pub counting_chat_id: Option<ChatId>,
    pub strike_marker: MarkerId,
    pub ban_marker: MarkerId,

    // Welcome messages
    pub welcome_chat_id: Option<ChatId>,

    // YouTube upload alerts
    pub yt_api_key: Option<String>,
    pub yt_channel_id: Option<String>,
    pub yt_announce_chat_id: Option<ChatId>,
    pub yt_ping_tag: Option<String>,
    pub yt_poll_interval: Duration,

    // Stream announcements
    pub stream_staff_chat_id: Option<ChatId>,
    pub stream_announce_chat_id: Option<ChatId>,
    pub stream_channel_name: Option<String>,
    pub stream_ping_tag: Option<String>,

    // Presence rotation
    pub presence_interval: Duration,

    // Liveness endpoint
    pub web_port: u16,

    // Persistence
    pub state_file: PathBuf,
    pub persist_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parses a configuration out of a key lookup. `load()` passes the
    /// process environment; tests pass a map.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let str_var = |key: &str| get(key);
        let u64_var = |key: &str| get(key).and_then(|s| s.trim().parse::<u64>().ok());
        let chat_var = |key: &str| {
            get(key)
                .and_then(|s| s.trim().parse::<i64>().ok())
                .map(ChatId)
        };

        let bot_token = str_var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let counting_chat_id = chat_var("COUNTING_CHAT_ID");
        let strike_marker = MarkerId(str_var("STRIKE_MARKER_ID").unwrap_or("strike".to_string()));
        let ban_marker = MarkerId(str_var("BAN_MARKER_ID").unwrap_or("ban".to_string()));

        let welcome_chat_id = chat_var("WELCOME_CHAT_ID");

        let yt_api_key = str_var("YT_API_KEY").and_then(non_empty);
        let yt_channel_id = str_var("YT_CHANNEL_ID").and_then(non_empty);
        let yt_announce_chat_id = chat_var("YT_ANNOUNCE_CHAT_ID");
        let yt_ping_tag = str_var("YT_PING_TAG").and_then(non_empty);
        let yt_poll_interval =
            Duration::from_secs(u64_var("YT_POLL_INTERVAL_SECS").unwrap_or(15 * 60));

        let stream_staff_chat_id = chat_var("STREAM_STAFF_CHAT_ID");
        let stream_announce_chat_id = chat_var("STREAM_ANNOUNCE_CHAT_ID");
        let stream_channel_name = str_var("STREAM_CHANNEL_NAME").and_then(non_empty);
        let stream_ping_tag = str_var("STREAM_PING_TAG").and_then(non_empty);

        let presence_interval =
            Duration::from_secs(u64_var("PRESENCE_INTERVAL_SECS").unwrap_or(5 * 60));

        // Out-of-range values fall back to the default rather than truncate.
        let web_port = get("PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(3000);

        let state_file =
            PathBuf::from(str_var("STATE_FILE").unwrap_or("/tmp/tally-state.json".to_string()));
        let persist_timeout =
            Duration::from_millis(u64_var("PERSIST_TIMEOUT_MS").unwrap_or(5_000));

        Ok(Self {
            bot_token,
            counting_chat_id,
            strike_marker,
            ban_marker,
            welcome_chat_id,
            yt_api_key,
            yt_channel_id,
            yt_announce_chat_id,
            yt_ping_tag,
            yt_poll_interval,
            stream_staff_chat_id,
            stream_announce_chat_id,
            stream_channel_name,
            stream_ping_tag,
            presence_interval,
            web_port,
            state_file,
            persist_timeout,
        })
    }

    /// The YouTube alert block is only active with all of key, channel and
    /// announce chat configured.
    pub fn youtube_enabled(&self) -> bool {
        self.yt_api_key.is_some() && self.yt_channel_id.is_some() && self.yt_announce_chat_id.is_some()
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn missing_bot_token_is_rejected() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn blank_bot_token_is_rejected() {
        let err = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "   ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn token_alone_yields_defaults() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t0ken")])).unwrap();

        assert_eq!(cfg.bot_token, "t0ken");
        assert!(cfg.counting_chat_id.is_none());
        assert_eq!(cfg.strike_marker.0, "strike");
        assert_eq!(cfg.ban_marker.0, "ban");
        assert_eq!(cfg.web_port, 3000);
        assert_eq!(cfg.yt_poll_interval, Duration::from_secs(15 * 60));
        assert_eq!(cfg.presence_interval, Duration::from_secs(5 * 60));
        assert_eq!(cfg.persist_timeout, Duration::from_millis(5_000));
        assert!(!cfg.youtube_enabled());
    }

    #[test]
    fn configured_values_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t0ken"),
            ("COUNTING_CHAT_ID", "-100123"),
            ("PORT", "8080"),
            ("YT_API_KEY", "k"),
            ("YT_CHANNEL_ID", "UCabc"),
            ("YT_ANNOUNCE_CHAT_ID", "-100456"),
        ]))
        .unwrap();

        assert_eq!(cfg.counting_chat_id, Some(ChatId(-100123)));
        assert_eq!(cfg.web_port, 8080);
        assert!(cfg.youtube_enabled());
    }

    #[test]
    fn out_of_range_port_falls_back_to_default() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t0ken"),
            ("PORT", "70000"),
        ]))
        .unwrap();

        assert_eq!(cfg.web_port, 3000);
    }
}
