use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    domain::{ChatId, CountAttempt, Outcome},
    ports::MessagingPort,
};

use super::{
    dedup::DuplicateGuard,
    escalate::{Escalation, EscalationPolicy},
    store::CounterStore,
    validate::validate,
};

const MILESTONE_STEP: u64 = 50;

/// Composes the counting game: duplicate guard, validation, state commits,
/// escalation and notifications.
///
/// Attempts are serialized through `turn`: each attempt's read-validate-commit
/// sequence runs to completion before the next one evaluates, so an attempt
/// never validates against a stale snapshot even though processing suspends
/// on persistence and marker writes. All faults are contained here; nothing
/// propagates out of `handle_attempt`.
pub struct CountingGame {
    chat_id: ChatId,
    store: Arc<CounterStore>,
    policy: EscalationPolicy,
    guard: DuplicateGuard,
    messenger: Arc<dyn MessagingPort>,
    turn: Mutex<()>,
}

impl CountingGame {
    pub fn new(
        chat_id: ChatId,
        store: Arc<CounterStore>,
        policy: EscalationPolicy,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            chat_id,
            store,
            policy,
            guard: DuplicateGuard::default(),
            messenger,
            turn: Mutex::new(()),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub async fn handle_attempt(&self, attempt: CountAttempt) {
        let _turn = self.turn.lock().await;

        let state = self.store.snapshot().await;
        match validate(&state, &attempt) {
            Outcome::Ignored => {}
            Outcome::Accepted(number) => self.accept(number, &attempt).await,
            Outcome::Rejected(_) => self.reject(&attempt).await,
        }
    }

    async fn accept(&self, number: u64, attempt: &CountAttempt) {
        self.store
            .commit_accept(number, attempt.author.clone())
            .await;

        if let Err(e) = self.messenger.react_ok(attempt.message).await {
            debug!(error = %e, "acknowledgement failed");
        }

        if number % MILESTONE_STEP == 0 {
            info!(number, "count milestone reached");
            self.send(&format!("🎉 Nice! The count reached {number}!")).await;
        }
    }

    async fn reject(&self, attempt: &CountAttempt) {
        // The delivery layer can re-invoke the handler for one logical
        // violation; only the first claim runs the reset-and-escalate path.
        if !self.guard.claim(&attempt.event_id) {
            debug!(event = %attempt.event_id.0, "duplicate violation event dropped");
            return;
        }

        info!(user = %attempt.author.0, text = %attempt.text, "count reset");
        self.send(&format!(
            "❌ Count reset! {} messed it up! Back to 1.",
            attempt.author_name
        ))
        .await;

        // The reset always completes; escalation is best-effort after it.
        self.store.commit_reset().await;

        match self.policy.apply(&attempt.author).await {
            Some(Escalation::Strike) => {
                self.send(&format!("⚠️ {} got a strike!", attempt.author_name))
                    .await;
            }
            Some(Escalation::Ban) => {
                self.send(&format!(
                    "🚫 {} is banned from counting!",
                    attempt.author_name
                ))
                .await;
            }
            None => {}
        }
    }

    async fn send(&self, text: &str) {
        if let Err(e) = self.messenger.send_text(self.chat_id, text).await {
            warn!(error = %e, "failed to send counting notification");
        }
    }
}
