use std::{fmt, io};

/// Crate-wide `Result` type using [`PromshError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, PromshError>;

/// Top-level error type for promsh operations.
#[derive(Debug)]
pub enum PromshError {
    /// Configuration errors.
    Config(ConfigError),

    /// Label index / datasource errors.
    Index(IndexError),

    /// I/O errors.
    Io(io::Error),

    /// JSON (de)serialization errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Anything else, e.g. an unsupported shell for completion scripts.
    Generic(String),
}

/// Errors raised while talking to a label index.
#[derive(Debug)]
pub enum IndexError {
    /// The request could not be sent or the connection failed.
    Request(String),

    /// The server answered with a non-success HTTP status.
    Status { code: u16, body: String },

    /// The server answered `"status": "error"`.
    Api { error_type: String, error: String },

    /// The response body could not be decoded.
    Decode(String),

    /// A static index snapshot could not be loaded.
    InvalidSnapshot(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for PromshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromshError::Config(e) => write!(f, "Configuration error: {e}"),
            PromshError::Index(e) => write!(f, "Datasource error: {e}"),
            PromshError::Io(e) => write!(f, "I/O error: {e}"),
            PromshError::Json(e) => write!(f, "JSON error: {e}"),
            PromshError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Request(msg) => write!(f, "Request failed: {msg}"),
            IndexError::Status { code, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {code}")
                } else {
                    write!(f, "HTTP {code}: {body}")
                }
            }
            IndexError::Api { error_type, error } => write!(f, "{error_type}: {error}"),
            IndexError::Decode(msg) => write!(f, "Invalid response: {msg}"),
            IndexError::InvalidSnapshot(msg) => write!(f, "Invalid index snapshot: {msg}"),
        }
    }
}

impl std::error::Error for PromshError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for IndexError {}

/* ========================= Conversions to PromshError ========================= */

impl From<io::Error> for PromshError {
    fn from(err: io::Error) -> Self {
        PromshError::Io(err)
    }
}

impl From<serde_json::Error> for PromshError {
    fn from(err: serde_json::Error) -> Self {
        PromshError::Json(err)
    }
}

impl From<ConfigError> for PromshError {
    fn from(err: ConfigError) -> Self {
        PromshError::Config(err)
    }
}

impl From<IndexError> for PromshError {
    fn from(err: IndexError) -> Self {
        PromshError::Index(err)
    }
}

impl From<reqwest::Error> for PromshError {
    fn from(err: reqwest::Error) -> Self {
        let index_err = if err.is_decode() {
            IndexError::Decode(err.to_string())
        } else {
            IndexError::Request(err.to_string())
        };
        PromshError::Index(index_err)
    }
}

impl From<toml::de::Error> for PromshError {
    fn from(err: toml::de::Error) -> Self {
        PromshError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for PromshError {
    fn from(err: toml::ser::Error) -> Self {
        PromshError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<String> for PromshError {
    fn from(msg: String) -> Self {
        PromshError::Generic(msg)
    }
}

impl From<&str> for PromshError {
    fn from(msg: &str) -> Self {
        PromshError::Generic(msg.to_owned())
    }
}
