// Error taxonomy shared by every docstore crate.
//
// Backends report `StoreError`, record mapping reports `DecodeError`, handles
// report `HandleError`, and connection setup reports `ConfigError`.

use std::fmt;

/// Failure to populate a typed document from a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` expected {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid object id `{0}`")]
    InvalidId(String),
}

impl DecodeError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn wrong_type(
        field: impl Into<String>,
        expected: &'static str,
        found: impl fmt::Display,
    ) -> Self {
        Self::WrongType {
            field: field.into(),
            expected,
            found: found.to_string(),
        }
    }
}

/// Failure reported by a backend.
///
/// `Driver` carries the underlying error unchanged; this layer never
/// interprets or retries it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("invalid collection name `{0}`")]
    InvalidName(String),

    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }
}

/// Failure of a `Handle` operation.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("handle is not linked to a collection")]
    NotLinked,

    #[error("document not found")]
    NotFound,

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for HandleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateKey(key) => Self::DuplicateKey(key),
            other => Self::Store(other),
        }
    }
}

/// Failure to build or open a connection from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingEnv(&'static str),

    #[error("invalid connection url: {0}")]
    InvalidUrl(String),

    #[error("connection url `{0}` names no database")]
    MissingDatabase(String),

    #[error(transparent)]
    Connect(#[from] StoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type HandleResult<T> = std::result::Result<T, HandleError>;
