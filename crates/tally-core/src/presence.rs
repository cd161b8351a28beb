//! Presence rotation: a rotating status line, set on an interval.

use std::{sync::Arc, time::Duration};

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

use crate::ports::MessagingPort;

pub const STATUS_LINES: &[&str] = &[
    "Trying to sleep",
    "Doing tasks",
    "Working hard",
    "Watching Goshiggy videos",
    "Counting numbers",
    "Welcoming members",
    "Eating a sandwich",
];

pub fn pick_status() -> &'static str {
    let idx = rand::rng().random_range(0..STATUS_LINES.len());
    STATUS_LINES[idx]
}

/// Rotate the bot's status line forever. Best-effort: a failed update is
/// logged and the loop keeps going.
pub async fn run_rotation(messenger: Arc<dyn MessagingPort>, every: Duration) {
    loop {
        let status = pick_status();
        match messenger.set_presence(status).await {
            Ok(()) => debug!(status, "presence rotated"),
            Err(e) => debug!(status, error = %e, "presence update failed"),
        }
        sleep(every).await;
    }
}
