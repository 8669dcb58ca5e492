// Copyright 2025 hostcall Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # hostcall CLI
//!
//! Command implementations behind the `hostcall` binary.
//!
//! ## Key Commands
//!
//! - `hostcall run`: Run a script in a [`HostContext`] and deliver its async
//!   callbacks
//! - `hostcall call`: Invoke one operation through the [`Dispatcher`] and
//!   return its result as JSON

use anyhow::{anyhow, Context as _, Result};
use hostcall_common::{CallMode, ComputationRequest, Operation, StructuredValue};
use hostcall_native::{Dispatched, Dispatcher, HostConfig, HostContext};
use std::path::Path;

/// Runs a script file to completion and returns the number of callbacks
/// delivered by the event loop.
pub fn run_script(path: impl AsRef<Path>, config: HostConfig) -> Result<usize> {
    let path = path.as_ref();
    let mut host = HostContext::new(config)?;
    let delivered = host
        .run_script(path)
        .with_context(|| format!("failed to run {}", path.display()))?;
    Ok(delivered)
}

/// Calls `operation` with a JSON argument in the given mode.
///
/// The `fibonacciSync` and `fibonacci_async` aliases always run in the mode
/// their name says, whatever `mode` is.
///
/// # Errors
///
/// Returns an error if the operation name is unknown, the arguments are not
/// valid JSON, or the computation fails. Computation failures are reported
/// as `<code>: <message>`.
pub fn call_operation(operation: &str, args: &str, mode: CallMode, workers: usize) -> Result<serde_json::Value> {
    let mode = CallMode::implied_by(operation).unwrap_or(mode);
    let operation: Operation = operation.parse()?;
    let args: serde_json::Value =
        serde_json::from_str(args).with_context(|| format!("invalid JSON arguments: {}", args))?;

    let dispatcher = Dispatcher::new(workers)?;
    let request = ComputationRequest::new(operation, StructuredValue::from(args), mode);

    let outcome = match dispatcher.dispatch(request) {
        Dispatched::Completed(outcome) => outcome,
        Dispatched::Scheduled(task) => {
            dispatcher
                .wait_completion()
                .filter(|completion| completion.task == task)
                .ok_or_else(|| anyhow!("task {} finished without a completion", task))?
                .outcome
        }
    };

    match outcome.into_result() {
        Ok(value) => Ok(value.into()),
        Err(error) => Err(anyhow!("{}: {}", error.kind.code(), error.message)),
    }
}
