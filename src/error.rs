use thiserror::Error;

/// The crate's error taxonomy, following the engine's recoverable/fatal split:
/// configuration errors are fatal before a run starts, request and hostname
/// errors are recoverable and routed to callbacks, stop actions are a
/// cooperative signal, everything else is unexpected.
#[derive(Debug, Error)]
pub enum FuzzError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid hostname: {host}")]
    InvalidHostname { host: String },

    #[error("unknown plugin '{name}', available: {available}")]
    UnknownPlugin { name: String, available: String },

    #[error("stop action triggered by status {status}")]
    StopAction { status: u16 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

pub type FuzzResult<T> = Result<T, FuzzError>;
