use boa_engine::{object::JsObject, Context, JsString, JsValue, Source};
use hostcall_common::{Completion, ComputationOutcome, HostcallError, Result, StructuredValue};
use std::path::Path;
use std::rc::Rc;

use crate::config::HostConfig;
use crate::dispatcher::Dispatcher;
use crate::runtime::bindings::{self, callback_key};
use crate::runtime::conversions::{
    error_info_from_js, error_to_js, js_to_structured, script_error, structured_to_js, thrown_error,
};

/// Boa context with the native module installed.
///
/// The context lives on the thread that created it; `HostContext` is neither
/// `Send` nor `Sync`. Async computations run on the dispatcher's workers, but
/// their callbacks only ever run here, from [`HostContext::run_event_loop`].
///
/// # Example
///
/// ```no_run
/// use hostcall_native::{HostConfig, HostContext};
///
/// let mut host = HostContext::new(HostConfig::default())?;
/// host.eval("native.fibonacci(13, (err, res) => console.log(res))")?;
/// let delivered = host.run_event_loop()?;
/// assert_eq!(delivered, 1);
/// # Ok::<(), hostcall_common::HostcallError>(())
/// ```
pub struct HostContext {
    ctx: Context,
    dispatcher: Rc<Dispatcher>,
    /// Pending callbacks keyed by task id
    callbacks: JsObject,
    config: HostConfig,
}

impl HostContext {
    /// Creates a context, its dispatcher and the module globals.
    pub fn new(config: HostConfig) -> Result<Self> {
        config.validate().map_err(HostcallError::Internal)?;
        let dispatcher = Dispatcher::new(config.worker_threads)?;
        Self::with_dispatcher(config, dispatcher)
    }

    /// Like [`HostContext::new`], with a caller-built dispatcher.
    pub fn with_dispatcher(config: HostConfig, dispatcher: Dispatcher) -> Result<Self> {
        config.validate().map_err(HostcallError::Internal)?;

        let mut ctx = Context::default();
        let dispatcher = Rc::new(dispatcher);

        bindings::install_console(&mut ctx, config.max_depth)?;
        let callbacks =
            bindings::install_module(&mut ctx, &config.module_name, config.max_depth, &dispatcher)?;

        tracing::info!(
            module = %config.module_name,
            workers = dispatcher.worker_threads(),
            "host context ready"
        );

        Ok(Self {
            ctx,
            dispatcher,
            callbacks,
            config,
        })
    }

    /// Evaluates script text and runs any promise jobs it queued.
    ///
    /// Async callbacks are not delivered; see [`HostContext::run_event_loop`].
    pub fn eval(&mut self, source: &str) -> Result<JsValue> {
        let value = self
            .ctx
            .eval(Source::from_bytes(source))
            .map_err(|e| thrown_error(e, &mut self.ctx))?;
        self.ctx.run_jobs().map_err(|e| thrown_error(e, &mut self.ctx))?;
        Ok(value)
    }

    /// Evaluates script text and decodes its completion value.
    pub fn eval_value(&mut self, source: &str) -> Result<StructuredValue> {
        let value = self.eval(source)?;
        js_to_structured(&value, &mut self.ctx, self.config.max_depth)
    }

    /// Evaluates script text, then drains the event loop.
    ///
    /// Returns the number of callbacks delivered.
    pub fn run_source(&mut self, source: &str) -> Result<usize> {
        self.eval(source)?;
        self.run_event_loop()
    }

    /// Loads and runs a script file, then drains the event loop.
    pub fn run_script(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), "running script");
        self.run_source(&source)
    }

    /// Delivers completions to their callbacks until nothing is in flight.
    ///
    /// Callbacks may start new async calls; those are waited for as well.
    ///
    /// # Errors
    ///
    /// Stops at the first callback that throws and returns the exception as
    /// `HostcallError::Script`.
    pub fn run_event_loop(&mut self) -> Result<usize> {
        let mut delivered = 0;
        while let Some(completion) = self.dispatcher.wait_completion() {
            if self.deliver(completion)? {
                delivered += 1;
            }
        }
        tracing::debug!(delivered, "event loop drained");
        Ok(delivered)
    }

    fn deliver(&mut self, completion: Completion) -> Result<bool> {
        let Completion { task, outcome } = completion;
        let key = callback_key(task);

        let callback = self
            .callbacks
            .get(key.clone(), &mut self.ctx)
            .map_err(script_error)?;
        self.callbacks
            .delete_property_or_throw(key, &mut self.ctx)
            .map_err(script_error)?;

        let Some(callback) = callback.as_object().filter(|obj| obj.is_callable()) else {
            tracing::warn!(task, "completion has no pending callback");
            return Ok(false);
        };

        let args = match outcome.into_result() {
            Ok(value) => [JsValue::null(), structured_to_js(value, &mut self.ctx)],
            Err(info) => [error_to_js(&info, &mut self.ctx), JsValue::null()],
        };

        tracing::debug!(task, "delivering completion");
        if let Err(e) = callback.call(&JsValue::undefined(), &args, &mut self.ctx) {
            let err = thrown_error(e, &mut self.ctx);
            tracing::error!(task, "uncaught exception in callback: {err}");
            return Err(err);
        }

        self.ctx.run_jobs().map_err(|e| thrown_error(e, &mut self.ctx))?;
        Ok(true)
    }

    /// Calls a module export from Rust.
    ///
    /// Errors the export throws with a known `code` come back as a failed
    /// outcome; anything else thrown is a `HostcallError::Script`.
    pub fn call(&mut self, export: &str, args: Vec<StructuredValue>) -> Result<ComputationOutcome> {
        let function = self.export(export)?;
        let args: Vec<JsValue> = args
            .into_iter()
            .map(|arg| structured_to_js(arg, &mut self.ctx))
            .collect();

        match function.call(&JsValue::undefined(), &args, &mut self.ctx) {
            Ok(value) => {
                js_to_structured(&value, &mut self.ctx, self.config.max_depth).map(ComputationOutcome::success)
            }
            Err(e) => {
                let thrown = e.to_opaque(&mut self.ctx);
                match error_info_from_js(&thrown, &mut self.ctx) {
                    Some(info) => Ok(ComputationOutcome::failure(info)),
                    None => Err(thrown_error(e, &mut self.ctx)),
                }
            }
        }
    }

    fn export(&mut self, name: &str) -> Result<JsObject> {
        let module_name = JsString::from(self.config.module_name.as_str());
        let module = self
            .ctx
            .global_object()
            .get(module_name, &mut self.ctx)
            .map_err(script_error)?;

        let function = match module.as_object() {
            Some(module) => module
                .get(JsString::from(name), &mut self.ctx)
                .map_err(script_error)?,
            None => JsValue::undefined(),
        };

        function
            .as_object()
            .filter(|obj| obj.is_callable())
            .map(|obj| obj.clone())
            .ok_or_else(|| HostcallError::InvalidShape(format!("module has no export named '{}'", name)))
    }

    /// Async calls submitted but not yet delivered.
    pub fn pending(&self) -> usize {
        self.dispatcher.in_flight()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}
