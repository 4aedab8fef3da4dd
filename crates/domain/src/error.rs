/// Shared error type used across all StoryLoom crates.
///
/// Exactly five externally distinguishable kinds: callers branch on the
/// variant, never on message text. Validation errors (`InvalidState`,
/// `InvalidArgument`, `NotFound`) are raised before any provider call or
/// write; `Provider` and `Persistence` abort the whole operation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("operation {operation} not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("persistence: {0}")]
    Persistence(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Persistence(format!("io: {e}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Persistence(format!("json: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
