use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostcallError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("argument cannot be negative")]
    NegativeArgument,

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HostcallError {
    /// The boundary-visible category of this error.
    ///
    /// Host-environment failures (script, IO, JSON) are reported to callers as
    /// internal errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostcallError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            HostcallError::NegativeArgument => ErrorKind::NegativeArgument,
            HostcallError::InvalidShape(_) => ErrorKind::InvalidShape,
            HostcallError::Internal(_)
            | HostcallError::Script(_)
            | HostcallError::Io(_)
            | HostcallError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Error categories visible to the script host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedType,
    NegativeArgument,
    InvalidShape,
    Internal,
}

impl ErrorKind {
    /// Value of the `code` property on error objects handed to the host.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedType => "UnsupportedTypeError",
            ErrorKind::NegativeArgument => "NegativeArgumentError",
            ErrorKind::InvalidShape => "InvalidShapeError",
            ErrorKind::Internal => "InternalError",
        }
    }

    pub fn from_code(code: &str) -> Option<ErrorKind> {
        match code {
            "UnsupportedTypeError" => Some(ErrorKind::UnsupportedType),
            "NegativeArgumentError" => Some(ErrorKind::NegativeArgument),
            "InvalidShapeError" => Some(ErrorKind::InvalidShape),
            "InternalError" => Some(ErrorKind::Internal),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostcallError>;
