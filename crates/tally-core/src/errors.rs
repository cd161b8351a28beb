/// Core error type.
///
/// Adapter crates map their specific errors into this type so the bot core can
/// handle failures consistently (degrade-and-continue vs user-facing).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// The backing document store is unreachable or timed out. The counting
    /// game continues with in-memory authority when this occurs.
    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// A moderation marker grant failed. Logged and never allowed to block
    /// the counter reset.
    #[error("moderation side effect failed: {0}")]
    Moderation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
