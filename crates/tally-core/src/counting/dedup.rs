use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex,
};

use crate::domain::EventId;

const DEFAULT_CAPACITY: usize = 1024;

/// Ensures one raw input event drives the reset-and-escalate sequence at most
/// once, even if the event-delivery layer re-invokes a handler for the same
/// event. In-memory only; claims do not survive restarts.
///
/// Claimed ids are kept in insertion order and evicted oldest-first past the
/// capacity, so the guard stays bounded over a long process lifetime.
pub struct DuplicateGuard {
    inner: Mutex<GuardState>,
    capacity: usize,
}

#[derive(Default)]
struct GuardState {
    claimed: HashSet<EventId>,
    order: VecDeque<EventId>,
}

impl Default for DuplicateGuard {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl DuplicateGuard {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(GuardState::default()),
            capacity: capacity.max(1),
        }
    }

    /// First claim returns `true` (proceed); any later claim of the same id
    /// returns `false` (caller must no-op).
    pub fn claim(&self, event_id: &EventId) -> bool {
        let mut st = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if st.claimed.contains(event_id) {
            return false;
        }
        if st.order.len() >= self.capacity {
            if let Some(evicted) = st.order.pop_front() {
                st.claimed.remove(&evicted);
            }
        }
        st.claimed.insert(event_id.clone());
        st.order.push_back(event_id.clone());
        true
    }
}
