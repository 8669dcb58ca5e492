//! hostcall Common Types
//!
//! This crate provides the value model and the request/outcome types shared by
//! the native module, its dispatcher and the command-line runner.
//!
//! # Overview
//!
//! Every value that crosses the boundary between the script host and native
//! code is represented as a [`StructuredValue`]. A call into the module becomes
//! a [`ComputationRequest`], and every request produces exactly one
//! [`ComputationOutcome`]: either a result or an [`ErrorInfo`].
//!
//! # Example
//!
//! ```
//! use hostcall_common::{CallMode, ComputationOutcome, ComputationRequest, Operation, StructuredValue};
//!
//! let request = ComputationRequest::new(Operation::Fibonacci, StructuredValue::Integer(13), CallMode::Sync);
//! let outcome = ComputationOutcome::success(StructuredValue::from("233"));
//!
//! assert_eq!(request.operation.name(), "fibonacci");
//! assert!(outcome.is_success());
//! ```

pub mod protocol;

pub use protocol::*;
