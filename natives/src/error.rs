use thiserror::Error;

/// Failure to move an element across the wire boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("cannot encode element: {0}")]
    Encode(String),

    #[error("cannot decode {raw:?} as {target}")]
    Decode { target: &'static str, raw: String },
}

impl ConversionError {
    pub(crate) fn decode(target: &'static str, raw: &[u8]) -> Self {
        Self::Decode {
            target,
            raw: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("WRONGTYPE key '{key}' holds a value that is not a set")]
    TypeMismatch { key: String },

    #[error("element {element} not found in '{key}'")]
    ElementNotFound { key: String, element: String },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A batch stopped applying at `failed_at`; `applied` lists the commands
    /// whose effects are visible in the store.
    #[error("batch failed at command {failed_at} of {total} ({} applied): {message}", .applied.len())]
    BatchPartialFailure {
        total: usize,
        applied: Vec<usize>,
        failed_at: usize,
        message: String,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("store error: {0}")]
    Store(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("timed out waiting for the store")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps an error reply from the store, keeping `WRONGTYPE` distinct.
    pub(crate) fn from_reply(message: &str, key: &str) -> Self {
        if message.starts_with("WRONGTYPE") {
            Self::TypeMismatch { key: key.to_string() }
        } else {
            Self::Store(message.to_string())
        }
    }

    /// True for failures caused by a key holding a non-set value.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Self::TypeMismatch { .. } => true,
            Self::BatchPartialFailure { message, .. } => message.starts_with("WRONGTYPE"),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
