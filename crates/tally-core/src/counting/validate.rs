use crate::domain::{CountAttempt, CounterState, Outcome, Violation};

/// Decide whether an attempt extends the count. Pure; no side effects.
///
/// The sequence check runs before the repeat-author check: a numerically
/// wrong attempt by the previous acceptor reports `OutOfSequence`, not
/// `RepeatAuthor`.
pub fn validate(state: &CounterState, attempt: &CountAttempt) -> Outcome {
    let Some(number) = attempt.parsed_number() else {
        return Outcome::Ignored;
    };

    let expected = state.last_number as i64 + 1;
    if number != expected {
        return Outcome::Rejected(Violation::OutOfSequence);
    }

    if state.last_acceptor_id.as_ref() == Some(&attempt.author) {
        return Outcome::Rejected(Violation::RepeatAuthor);
    }

    Outcome::Accepted(number as u64)
}
