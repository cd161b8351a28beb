use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tally_core::{
    config::Config, counting::CountingGame, counting::CounterStore, ports::MessagingPort,
};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub game: Option<Arc<CountingGame>>,
    pub counter: Arc<CounterStore>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(bot: Bot, state: Arc<AppState>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = me.username(), "bot connected"),
        Err(e) => tracing::warn!(error = %e, "get_me failed at startup"),
    }

    if state.game.is_some() {
        let snap = state.counter.snapshot().await;
        tracing::info!(
            last_number = snap.last_number,
            "counting game active"
        );
    } else {
        tracing::info!("counting game disabled (no counting chat configured)");
    }

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
