use std::sync::Arc;

use teloxide::Bot;
use tracing::{info, warn};

use tally_core::{
    config::Config,
    counting::{CounterStore, CountingGame, EscalationPolicy},
    ports::{MarkerStore, MessagingPort, StateStore},
    presence,
    store::{JsonDocumentStore, StoredMarkers},
};
use tally_telegram::{
    router::{run_polling, AppState},
    TelegramMessenger,
};
use tally_youtube::YouTubeClient;

#[tokio::main]
async fn main() -> Result<(), tally_core::Error> {
    tally_core::logging::init("tally")?;

    let cfg = Arc::new(Config::load()?);

    let backend: Arc<dyn StateStore> = Arc::new(JsonDocumentStore::new(cfg.state_file.clone()));
    let counter = Arc::new(CounterStore::new(backend.clone(), cfg.persist_timeout));
    match counter.load().await {
        Ok(state) => info!(last_number = state.last_number, "counter state loaded"),
        Err(e) => warn!(error = %e, "starting with in-memory counter state"),
    }

    let bot = Bot::new(cfg.bot_token.clone());
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let game = cfg.counting_chat_id.map(|chat_id| {
        let markers: Arc<dyn MarkerStore> = Arc::new(StoredMarkers::new(backend.clone()));
        let policy =
            EscalationPolicy::new(markers, cfg.strike_marker.clone(), cfg.ban_marker.clone());
        Arc::new(CountingGame::new(
            chat_id,
            counter.clone(),
            policy,
            messenger.clone(),
        ))
    });

    tokio::spawn({
        let counter = counter.clone();
        let port = cfg.web_port;
        async move {
            if let Err(e) = tally_web::serve(port, "tally".to_string(), counter).await {
                warn!(error = %e, "web server exited");
            }
        }
    });

    if cfg.youtube_enabled() {
        // youtube_enabled() guarantees all three fields.
        let client = YouTubeClient::new(
            cfg.yt_api_key.clone().unwrap_or_default(),
            cfg.yt_channel_id.clone().unwrap_or_default(),
        );
        if let Some(chat_id) = cfg.yt_announce_chat_id {
            tokio::spawn(tally_youtube::run_poller(
                client,
                backend.clone(),
                messenger.clone(),
                chat_id,
                cfg.yt_ping_tag.clone(),
                cfg.yt_poll_interval,
            ));
        }
    }

    tokio::spawn(presence::run_rotation(
        messenger.clone(),
        cfg.presence_interval,
    ));

    let state = Arc::new(AppState {
        cfg,
        game,
        counter,
        messenger,
    });

    run_polling(bot, state)
        .await
        .map_err(|e| tally_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
