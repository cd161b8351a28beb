use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Chat-platform user identity. Opaque to the core; the adapter decides how
/// its native ids map onto this.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Chat (channel) id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Opaque dedup key for one raw inbound event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventId(pub String);

/// Opaque moderation marker id ("strike" / "ban" role or flag).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(pub String);

/// Canonical count state, one per deployment.
///
/// `(last_number, last_acceptor_id)` are only ever updated as a unit: advanced
/// by exactly 1 on accept, or reset to `(0, None)` on rejection. The persisted
/// shape is `{"lastNumber": int, "lastAcceptorId": string|null,
/// "updatedAt": ISO-8601}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterState {
    pub last_number: u64,
    pub last_acceptor_id: Option<UserId>,
    pub updated_at: String,
}

impl Default for CounterState {
    fn default() -> Self {
        Self {
            last_number: 0,
            last_acceptor_id: None,
            updated_at: iso_timestamp_utc(),
        }
    }
}

/// Per-identity moderation standing. A strictly one-way ladder; there is no
/// automatic de-escalation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    Clean,
    Struck,
    Banned,
}

/// One inbound message interpreted as a counting move. Ephemeral; never
/// persisted.
#[derive(Clone, Debug)]
pub struct CountAttempt {
    pub text: String,
    pub author: UserId,
    /// Display name used in outbound notifications.
    pub author_name: String,
    pub event_id: EventId,
    pub message: MessageRef,
}

impl CountAttempt {
    /// Leading-integer parse of the raw text, `None` when the text does not
    /// start with a number.
    pub fn parsed_number(&self) -> Option<i64> {
        parse_leading_int(&self.text)
    }
}

/// Why an attempt was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    OutOfSequence,
    RepeatAuthor,
}

/// Validation outcome for one attempt.
///
/// `Ignored` (non-numeric text) is distinct from `Rejected`: it causes no
/// state change and no moderation consequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Accepted(u64),
    Rejected(Violation),
}

/// RFC3339 timestamp in UTC (persisted documents, health payload).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Parse the leading integer of `text`, ignoring surrounding whitespace and
/// any trailing garbage ("12abc" parses as 12).
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let s = text.trim();
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1i64, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };

    let end = digits
        .as_bytes()
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
