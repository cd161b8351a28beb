//! YouTube upload alerts (Data API v3).
//!
//! Polls the channel's uploads playlist and announces a video once per new
//! video id. The last announced id is a document in the shared state store,
//! so restarts never re-announce an old upload.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

use tally_core::{
    domain::{iso_timestamp_utc, ChatId},
    errors::Error,
    ports::{MessagingPort, StateStore},
    Result,
};

const LAST_VIDEO_DOC_KEY: &str = "lastVideo";

#[derive(Clone, Debug)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatestVideo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, channel_id: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            http,
            api_key: api_key.into(),
            channel_id: channel_id.into(),
        }
    }

    /// The channel's most recent upload, `None` when the channel has no
    /// uploads playlist or the playlist is empty.
    pub async fn latest_video(&self) -> Result<Option<LatestVideo>> {
        let channels: ChannelsResponse = self
            .http
            .get("https://www.googleapis.com/youtube/v3/channels")
            .query(&[
                ("key", self.api_key.as_str()),
                ("id", self.channel_id.as_str()),
                ("part", "contentDetails"),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("youtube channels request: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Http(format!("youtube channels status: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Http(format!("youtube channels json: {e}")))?;

        let Some(uploads) = channels
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details.related_playlists.uploads)
        else {
            return Ok(None);
        };

        let playlist: PlaylistItemsResponse = self
            .http
            .get("https://www.googleapis.com/youtube/v3/playlistItems")
            .query(&[
                ("key", self.api_key.as_str()),
                ("playlistId", uploads.as_str()),
                ("part", "snippet"),
                ("maxResults", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format!("youtube playlist request: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Http(format!("youtube playlist status: {e}")))?
            .json()
            .await
            .map_err(|e| Error::Http(format!("youtube playlist json: {e}")))?;

        let Some(item) = playlist.items.into_iter().next() else {
            return Ok(None);
        };

        let id = item.snippet.resource_id.video_id;
        Ok(Some(LatestVideo {
            url: format!("https://www.youtube.com/watch?v={id}"),
            id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
        }))
    }
}

/// Announce `latest` if its id differs from the persisted one. Returns
/// whether an announcement went out.
pub async fn announce_if_new(
    latest: &LatestVideo,
    store: &Arc<dyn StateStore>,
    messenger: &Arc<dyn MessagingPort>,
    chat_id: ChatId,
    ping_tag: Option<&str>,
) -> Result<bool> {
    let last_id = store
        .get(LAST_VIDEO_DOC_KEY)
        .await?
        .and_then(|doc| doc["lastVideoId"].as_str().map(str::to_string));
    if last_id.as_deref() == Some(latest.id.as_str()) {
        return Ok(false);
    }

    let ping = ping_tag.map(|p| format!("{p} ")).unwrap_or_default();
    let text = format!("{ping}New video uploaded!\n{}\n{}", latest.title, latest.url);
    messenger.send_text(chat_id, &text).await?;

    store
        .put(
            LAST_VIDEO_DOC_KEY,
            serde_json::json!({
                "lastVideoId": latest.id,
                "lastTimestamp": iso_timestamp_utc(),
            }),
        )
        .await?;

    Ok(true)
}

/// Poll forever. API or send failures are logged and the next tick retries.
pub async fn run_poller(
    client: YouTubeClient,
    store: Arc<dyn StateStore>,
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
    ping_tag: Option<String>,
    every: Duration,
) {
    loop {
        match client.latest_video().await {
            Ok(Some(latest)) => {
                match announce_if_new(&latest, &store, &messenger, chat_id, ping_tag.as_deref())
                    .await
                {
                    Ok(true) => info!(video = %latest.id, "announced new upload"),
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "upload announcement failed"),
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "youtube poll failed"),
        }
        sleep(every).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::{collections::HashMap, sync::Mutex};

    use tally_core::domain::{MessageId, MessageRef};

    #[test]
    fn parses_channels_response() {
        let body = r#"{
            "items": [
                {"contentDetails": {"relatedPlaylists": {"uploads": "UUabc123"}}}
            ]
        }"#;
        let parsed: ChannelsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.items[0].content_details.related_playlists.uploads.as_deref(),
            Some("UUabc123")
        );
    }

    #[test]
    fn parses_playlist_items_response() {
        let body = r#"{
            "items": [
                {"snippet": {
                    "title": "New Video",
                    "publishedAt": "2026-08-01T12:00:00Z",
                    "resourceId": {"videoId": "dQw4w9WgXcQ"}
                }}
            ]
        }"#;
        let parsed: PlaylistItemsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.items[0].snippet.resource_id.video_id, "dQw4w9WgXcQ");
        assert_eq!(parsed.items[0].snippet.title, "New Video");
    }

    #[test]
    fn empty_items_parse_to_empty_vec() {
        let parsed: ChannelsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());
    }

    #[derive(Default)]
    struct MemoryStore {
        docs: Mutex<HashMap<String, Value>>,
    }

    #[async_trait]
    impl StateStore for MemoryStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            Ok(self.docs.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: Value) -> Result<()> {
            self.docs.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockMessenger {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingPort for MockMessenger {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(0),
            })
        }

        async fn react_ok(&self, _msg: MessageRef) -> Result<()> {
            Ok(())
        }

        async fn set_presence(&self, _status: &str) -> Result<()> {
            Ok(())
        }
    }

    fn video(id: &str) -> LatestVideo {
        LatestVideo {
            id: id.to_string(),
            title: "A Video".to_string(),
            url: format!("https://www.youtube.com/watch?v={id}"),
            published_at: "2026-08-01T12:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn announces_once_per_new_id() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::default());
        let mock = Arc::new(MockMessenger::default());
        let messenger: Arc<dyn MessagingPort> = mock.clone();

        let first = announce_if_new(&video("v1"), &store, &messenger, ChatId(5), Some("@all"))
            .await
            .unwrap();
        assert!(first);

        // Same id again: no re-announcement.
        let second = announce_if_new(&video("v1"), &store, &messenger, ChatId(5), Some("@all"))
            .await
            .unwrap();
        assert!(!second);

        // A different id announces again.
        let third = announce_if_new(&video("v2"), &store, &messenger, ChatId(5), Some("@all"))
            .await
            .unwrap();
        assert!(third);

        let sent = mock.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].starts_with("@all New video uploaded!"));
        assert!(sent[0].contains("https://www.youtube.com/watch?v=v1"));
    }
}
