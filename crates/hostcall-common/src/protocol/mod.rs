pub mod error;
pub mod requests;
pub mod responses;
pub mod value;

#[cfg(test)]
mod tests;

pub use error::{ErrorKind, HostcallError, Result};
pub use requests::{CallMode, ComputationRequest, Operation, TaskId};
pub use responses::{Completion, ComputationOutcome, ErrorInfo};
pub use value::StructuredValue;
