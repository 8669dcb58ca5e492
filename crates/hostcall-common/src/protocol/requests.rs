use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::HostcallError;
use super::value::StructuredValue;

pub type TaskId = u64;

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Operations exposed by the native module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Fibonacci,
    ObjectTransform,
    Hello,
    CpuCount,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Fibonacci,
        Operation::ObjectTransform,
        Operation::Hello,
        Operation::CpuCount,
    ];

    /// Canonical export name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Fibonacci => "fibonacci",
            Operation::ObjectTransform => "objop",
            Operation::Hello => "hello",
            Operation::CpuCount => "cpu_count",
        }
    }

    /// Number of positional arguments the operation takes. A callable passed
    /// right after them selects async mode.
    pub fn arity(&self) -> usize {
        match self {
            Operation::Fibonacci | Operation::ObjectTransform => 1,
            Operation::Hello | Operation::CpuCount => 0,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = HostcallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fibonacci" | "fibonacciSync" | "fibonacci_async" => Ok(Operation::Fibonacci),
            "objop" => Ok(Operation::ObjectTransform),
            "hello" => Ok(Operation::Hello),
            "cpu_count" | "thread_count" => Ok(Operation::CpuCount),
            other => Err(HostcallError::InvalidShape(format!("unknown operation '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallMode {
    Sync,
    Async,
}

impl CallMode {
    /// Mode fixed by an export name, for the aliases that name one.
    pub fn implied_by(export: &str) -> Option<CallMode> {
        match export {
            "fibonacciSync" => Some(CallMode::Sync),
            "fibonacci_async" => Some(CallMode::Async),
            _ => None,
        }
    }
}

/// A single call into the module. Built per call and consumed once by the
/// dispatcher; the arguments move with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRequest {
    pub id: TaskId,
    pub operation: Operation,
    pub args: StructuredValue,
    pub mode: CallMode,
}

impl ComputationRequest {
    pub fn new(operation: Operation, args: StructuredValue, mode: CallMode) -> Self {
        ComputationRequest {
            id: next_task_id(),
            operation,
            args,
            mode,
        }
    }
}

/// Allocates a process-unique task id.
pub fn next_task_id() -> TaskId {
    TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}
