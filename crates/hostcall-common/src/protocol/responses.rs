//! Computation Outcome Types
//!
//! This module defines what a computation hands back to its caller.

use serde::{Deserialize, Serialize};

use super::error::{ErrorKind, HostcallError};
use super::requests::TaskId;
use super::value::StructuredValue;

/// Error payload delivered to the host, either thrown from a sync call or
/// passed as the first callback argument of an async call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ErrorInfo {
            kind,
            message: message.into(),
        }
    }
}

impl From<&HostcallError> for ErrorInfo {
    fn from(err: &HostcallError) -> Self {
        ErrorInfo::new(err.kind(), err.to_string())
    }
}

impl From<HostcallError> for ErrorInfo {
    fn from(err: HostcallError) -> Self {
        ErrorInfo::from(&err)
    }
}

/// The result of one computation.
///
/// Exactly one of `result` and `error` is populated. The fields are private so
/// that the only way to build an outcome is through [`ComputationOutcome::success`]
/// or [`ComputationOutcome::failure`].
///
/// # Example
///
/// ```
/// use hostcall_common::{ComputationOutcome, HostcallError, StructuredValue};
///
/// let ok = ComputationOutcome::success(StructuredValue::from("233"));
/// assert!(ok.is_success());
///
/// let failed = ComputationOutcome::failure(HostcallError::NegativeArgument);
/// assert_eq!(failed.error().unwrap().message, "argument cannot be negative");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationOutcome {
    result: Option<StructuredValue>,
    error: Option<ErrorInfo>,
}

impl ComputationOutcome {
    pub fn success(result: StructuredValue) -> Self {
        ComputationOutcome {
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<ErrorInfo>) -> Self {
        ComputationOutcome {
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&StructuredValue> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Consumes the outcome.
    pub fn into_result(self) -> std::result::Result<StructuredValue, ErrorInfo> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => Err(error),
            // unreachable through the constructors; only a hand-written
            // deserialized payload can get here
            _ => Err(ErrorInfo::new(
                ErrorKind::Internal,
                "outcome must carry exactly one of result and error",
            )),
        }
    }
}

impl From<super::error::Result<StructuredValue>> for ComputationOutcome {
    fn from(result: super::error::Result<StructuredValue>) -> Self {
        match result {
            Ok(value) => ComputationOutcome::success(value),
            Err(err) => ComputationOutcome::failure(err),
        }
    }
}

/// A finished async computation on its way back to the host thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub task: TaskId,
    pub outcome: ComputationOutcome,
}
