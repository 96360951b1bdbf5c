use thiserror::Error;

/// Result type for evomask operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for evomask
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shape mismatch errors (parameter vectors, batches, layer inputs)
    #[error("Shape error: {0}")]
    Shape(String),

    /// Invalid input or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a shape error
    pub fn shape(msg: impl Into<String>) -> Self {
        Error::Shape(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Error::Serialization(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

/// Error context trait for adding context to errors
pub trait WithErrorContext {
    fn with_context(self, context: impl Into<String>) -> Self;
}

impl<T> WithErrorContext for Result<T> {
    fn with_context(self, context: impl Into<String>) -> Self {
        self.map_err(|e| {
            let context_str = context.into();
            match e {
                Error::Config(msg) => Error::Config(format!("{}: {}", context_str, msg)),
                Error::Shape(msg) => Error::Shape(format!("{}: {}", context_str, msg)),
                Error::InvalidInput(msg) => {
                    Error::InvalidInput(format!("{}: {}", context_str, msg))
                }
                Error::Serialization(msg) => {
                    Error::Serialization(format!("{}: {}", context_str, msg))
                }
                Error::Io(err) => Error::Internal(format!("{}: {}", context_str, err)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context_str, msg)),
            }
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
