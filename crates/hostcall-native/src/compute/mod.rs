//! Native computations exposed by the module.
//!
//! Each operation has a plain Rust entry point (e.g. [`fibonacci::fibonacci`])
//! and a handler that takes and returns [`StructuredValue`](hostcall_common::StructuredValue)s, which is what the
//! dispatcher registers in its handler table.

pub mod fibonacci;
pub mod system;
pub mod transform;

pub use fibonacci::fibonacci;
pub use system::SystemInfo;
pub use transform::transform;
