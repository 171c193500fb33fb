//! Error types for seekpage

use thiserror::Error;

/// Result type alias for seekpage operations
pub type PageResult<T> = Result<T, PageError>;

/// Error types for pagination compilation, cursors and drivers
#[derive(Debug, Error)]
pub enum PageError {
    /// A bind parameter value could not be normalized
    #[error("Normalization error on parameter '{param}': {message}")]
    Normalize { param: String, message: String },

    /// No safe point to splice a clause into the statement
    #[error("Insertion point error: {0}")]
    InsertionPoint(String),

    /// Cursor does not fit the statement it is applied to
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Precondition violation on a constructor or builder
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A statement parameter uses a reserved bind name
    #[error("Parameter collision: {0}")]
    ParamCollision(String),

    /// Cursor store failure
    #[error("Cursor store error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration read/parse/validation error
    #[error("Config error: {0}")]
    Config(String),

    /// Opaque driver failure
    #[error("Driver error: {0}")]
    Driver(String),

    /// Query execution error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),
}

impl PageError {
    /// Create a normalization error for a specific parameter
    pub fn normalize(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Normalize {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an insertion point error
    pub fn insertion_point(message: impl Into<String>) -> Self {
        Self::InsertionPoint(message.into())
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Check if this is a normalization error
    pub fn is_normalize(&self) -> bool {
        matches!(self, Self::Normalize { .. })
    }

    /// Check if this is an insertion point error
    pub fn is_insertion_point(&self) -> bool {
        matches!(self, Self::InsertionPoint(_))
    }

    /// Check if this is an invalid cursor error
    pub fn is_invalid_cursor(&self) -> bool {
        matches!(self, Self::InvalidCursor(_))
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PageError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
