//! JavaScript bindings for the native module
//!
//! This module builds the module object that scripts see and the minimal
//! `console` global.
//!
//! # JavaScript API
//!
//! The following functions are registered on the module object (named
//! `native` unless configured otherwise):
//!
//! - `hello([cb])` - Fixed connectivity payload
//! - `cpu_count([cb])` / `thread_count([cb])` - Logical CPU count
//! - `objop(value[, cb])` - Appends `.rs` to the object's `id`
//! - `fibonacci(n[, cb])` - Decimal string of F(n)
//! - `fibonacciSync(n)` - Always synchronous
//! - `fibonacci_async(n, cb)` - Always asynchronous
//!
//! Passing a function after the declared arguments switches a call to async
//! mode: the call returns `undefined` and `cb(error, result)` runs later from
//! the host event loop. Without one, the result is returned (or thrown).
//!
//! # Captures
//!
//! Every exported function carries its own [`ExportCaptures`]: the shared
//! dispatcher and the table of pending callbacks. The table is a plain JS
//! object so the garbage collector sees the callbacks it holds.

use crate::dispatcher::{Dispatched, Dispatcher};
use crate::runtime::conversions::{error_to_throw, js_to_structured, script_error, structured_to_js};
use boa_engine::{
    js_string,
    native_function::NativeFunction,
    object::{FunctionObjectBuilder, JsObject, ObjectInitializer},
    property::Attribute,
    Context, JsNativeError, JsResult, JsString, JsValue,
};
use boa_gc::{Finalize, Trace};
use hostcall_common::protocol::requests::next_task_id;
use hostcall_common::{CallMode, ComputationRequest, ErrorInfo, Operation, Result, StructuredValue, TaskId};
use std::rc::Rc;

/// How an export picks its call mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportMode {
    /// Async when a callback follows the declared arguments
    Auto,
    Sync,
    Async,
}

const EXPORTS: &[(&str, Operation, ExportMode)] = &[
    ("hello", Operation::Hello, ExportMode::Auto),
    ("cpu_count", Operation::CpuCount, ExportMode::Auto),
    ("thread_count", Operation::CpuCount, ExportMode::Auto),
    ("objop", Operation::ObjectTransform, ExportMode::Auto),
    ("fibonacci", Operation::Fibonacci, ExportMode::Auto),
    ("fibonacciSync", Operation::Fibonacci, ExportMode::Sync),
    ("fibonacci_async", Operation::Fibonacci, ExportMode::Async),
];

/// Names of every function on the module object.
pub fn export_names() -> impl Iterator<Item = &'static str> {
    EXPORTS.iter().map(|(name, _, _)| *name)
}

#[derive(Trace, Finalize)]
struct ExportCaptures {
    callbacks: JsObject,
    #[unsafe_ignore_trace]
    dispatcher: Rc<Dispatcher>,
    #[unsafe_ignore_trace]
    operation: Operation,
    #[unsafe_ignore_trace]
    mode: ExportMode,
    max_depth: usize,
}

/// Installs the module object as the global `module_name`.
///
/// Returns the pending-callback table shared by the exported functions; the
/// event loop takes callbacks out of it as their completions arrive.
pub(crate) fn install_module(
    ctx: &mut Context,
    module_name: &str,
    max_depth: usize,
    dispatcher: &Rc<Dispatcher>,
) -> Result<JsObject> {
    let callbacks = JsObject::with_null_proto();
    let module = JsObject::default(ctx.intrinsics());

    for &(name, operation, mode) in EXPORTS {
        let captures = ExportCaptures {
            callbacks: callbacks.clone(),
            dispatcher: Rc::clone(dispatcher),
            operation,
            mode,
            max_depth,
        };

        let function = FunctionObjectBuilder::new(
            ctx.realm(),
            NativeFunction::from_copy_closure_with_captures(
                |_this, args: &[JsValue], captures: &ExportCaptures, context| {
                    call_export(args, captures, context)
                },
                captures,
            ),
        )
        .name(JsString::from(name))
        .length(operation.arity())
        .build();

        module
            .set(JsString::from(name), function, false, ctx)
            .map_err(script_error)?;
    }

    ctx.register_global_property(JsString::from(module_name), module, Attribute::all())
        .map_err(script_error)?;

    tracing::debug!(module_name, exports = EXPORTS.len(), "module installed");
    Ok(callbacks)
}

fn call_export(args: &[JsValue], captures: &ExportCaptures, ctx: &mut Context) -> JsResult<JsValue> {
    let arity = captures.operation.arity();
    let callback = match captures.mode {
        ExportMode::Sync => None,
        ExportMode::Auto => args.get(arity).and_then(callable),
        ExportMode::Async => Some(args.get(arity).and_then(callable).ok_or_else(|| {
            JsNativeError::typ().with_message("callback must be a function")
        })?),
    };
    let mode = if callback.is_some() { CallMode::Async } else { CallMode::Sync };

    let decoded = if arity == 0 {
        Ok(StructuredValue::Null)
    } else {
        let arg = args.first().cloned().unwrap_or_default();
        js_to_structured(&arg, ctx, captures.max_depth)
    };

    let args = match (decoded, callback.as_ref()) {
        (Ok(args), _) => args,
        (Err(err), Some(callback)) => {
            // reported through the callback like any other async failure
            let task = next_task_id();
            register_callback(&captures.callbacks, task, callback, ctx)?;
            captures.dispatcher.fail(task, err);
            return Ok(JsValue::undefined());
        }
        (Err(err), None) => return Err(error_to_throw(&ErrorInfo::from(err), ctx)),
    };

    let request = ComputationRequest::new(captures.operation, args, mode);
    if let Some(callback) = &callback {
        register_callback(&captures.callbacks, request.id, callback, ctx)?;
    }

    match captures.dispatcher.dispatch(request) {
        Dispatched::Completed(outcome) => match outcome.into_result() {
            Ok(value) => Ok(structured_to_js(value, ctx)),
            Err(info) => Err(error_to_throw(&info, ctx)),
        },
        Dispatched::Scheduled(_) => Ok(JsValue::undefined()),
    }
}

fn callable(value: &JsValue) -> Option<JsObject> {
    value
        .as_object()
        .filter(|obj| obj.is_callable())
        .map(|obj| obj.clone())
}

pub(crate) fn callback_key(task: TaskId) -> JsString {
    JsString::from(task.to_string())
}

fn register_callback(callbacks: &JsObject, task: TaskId, callback: &JsObject, ctx: &mut Context) -> JsResult<()> {
    callbacks.set(callback_key(task), callback.clone(), true, ctx)?;
    Ok(())
}

/// Installs a `console` global with `log` (stdout) and `error` (stderr).
///
/// Strings print as-is; other values print as JSON when they decode, and in
/// their display form otherwise.
pub(crate) fn install_console(ctx: &mut Context, max_depth: usize) -> Result<()> {
    let log = NativeFunction::from_copy_closure_with_captures(
        |_this, args: &[JsValue], max_depth: &usize, context| {
            println!("{}", format_line(args, *max_depth, context));
            Ok(JsValue::undefined())
        },
        max_depth,
    );
    let error = NativeFunction::from_copy_closure_with_captures(
        |_this, args: &[JsValue], max_depth: &usize, context| {
            eprintln!("{}", format_line(args, *max_depth, context));
            Ok(JsValue::undefined())
        },
        max_depth,
    );

    let console = ObjectInitializer::new(ctx)
        .function(log, js_string!("log"), 0)
        .function(error, js_string!("error"), 0)
        .build();

    ctx.register_global_property(js_string!("console"), console, Attribute::all())
        .map_err(script_error)?;
    Ok(())
}

fn format_line(args: &[JsValue], max_depth: usize, ctx: &mut Context) -> String {
    args.iter()
        .map(|arg| match arg.as_string() {
            Some(s) => s.to_std_string_escaped(),
            None => match js_to_structured(arg, ctx, max_depth) {
                Ok(value) => value.to_string(),
                Err(_) => arg.display().to_string(),
            },
        })
        .collect::<Vec<_>>()
        .join(" ")
}
