use std::sync::Arc;

use tracing::warn;

use crate::{
    domain::{MarkerId, Standing, UserId},
    ports::MarkerStore,
    Error, Result,
};

/// Moderation consequence actually applied for one violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escalation {
    Strike,
    Ban,
}

/// Pure ladder step: `Clean -> Struck -> Banned -> Banned`.
///
/// The terminal rung is idempotent; a banned identity's further violations
/// carry no additional consequence.
pub fn next(standing: Standing) -> (Standing, Option<Escalation>) {
    match standing {
        Standing::Clean => (Standing::Struck, Some(Escalation::Strike)),
        Standing::Struck => (Standing::Banned, Some(Escalation::Ban)),
        Standing::Banned => (Standing::Banned, None),
    }
}

/// Applies the strike/ban ladder through a marker store.
///
/// Marker mutation is best-effort: a failed read or grant is logged and the
/// violation is otherwise processed as if no consequence applied. The counter
/// reset never waits on this.
pub struct EscalationPolicy {
    markers: Arc<dyn MarkerStore>,
    strike: MarkerId,
    ban: MarkerId,
}

impl EscalationPolicy {
    pub fn new(markers: Arc<dyn MarkerStore>, strike: MarkerId, ban: MarkerId) -> Self {
        Self {
            markers,
            strike,
            ban,
        }
    }

    pub async fn standing_of(&self, user: &UserId) -> Result<Standing> {
        if self.markers.has_marker(user, &self.ban).await? {
            return Ok(Standing::Banned);
        }
        if self.markers.has_marker(user, &self.strike).await? {
            return Ok(Standing::Struck);
        }
        Ok(Standing::Clean)
    }

    /// Escalate `violator` one rung and grant the matching marker. Returns
    /// the consequence that was actually applied, `None` for the idempotent
    /// ceiling or when the side effect failed.
    pub async fn apply(&self, violator: &UserId) -> Option<Escalation> {
        let standing = match self.standing_of(violator).await {
            Ok(s) => s,
            Err(e) => {
                warn!(user = %violator.0, error = %e, "could not read moderation standing");
                return None;
            }
        };

        let (_, action) = next(standing);
        let action = action?;

        let marker = match action {
            Escalation::Strike => &self.strike,
            Escalation::Ban => &self.ban,
        };
        if let Err(e) = self.markers.grant_marker(violator, marker).await {
            let e = Error::Moderation(e.to_string());
            warn!(user = %violator.0, marker = %marker.0, error = %e, "failed to grant moderation marker");
            return None;
        }

        Some(action)
    }
}
