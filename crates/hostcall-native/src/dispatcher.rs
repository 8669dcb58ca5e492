//! Dual-mode computation dispatcher.
//!
//! The dispatcher owns the table of operation handlers and the worker pool used
//! for async calls. It is built once at startup and handed to whoever needs it;
//! there is no global instance.
//!
//! # Execution Model
//!
//! - **Sync**: [`Dispatcher::invoke`] runs the handler on the calling thread and
//!   returns the outcome directly.
//! - **Async**: [`Dispatcher::submit`] moves the request onto a tokio blocking
//!   thread (at most `worker_threads` run at once) and returns immediately. The
//!   finished [`Completion`] travels back through a channel and is picked up by
//!   the host thread with [`Dispatcher::wait_completion`].
//!
//! Handler panics are caught in both modes and reported as internal errors.
//!
//! # Threading
//!
//! `wait_completion` blocks and must be called from a plain thread, not from
//! inside an async runtime.

use crate::compute::{fibonacci, transform, SystemInfo};
use hostcall_common::{
    CallMode, Completion, ComputationOutcome, ComputationRequest, HostcallError, Operation,
    Result, StructuredValue, TaskId,
};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, Semaphore};

/// A registered operation implementation.
pub type Handler = Arc<dyn Fn(StructuredValue) -> Result<StructuredValue> + Send + Sync>;

/// What happened to a dispatched request.
#[derive(Debug)]
pub enum Dispatched {
    /// Sync request, already computed.
    Completed(ComputationOutcome),
    /// Async request, running on the worker pool.
    Scheduled(TaskId),
}

pub struct Dispatcher {
    handlers: HashMap<Operation, Handler>,
    runtime: Runtime,
    /// One permit per worker slot
    permits: Arc<Semaphore>,
    worker_threads: usize,
    system: SystemInfo,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: Mutex<mpsc::UnboundedReceiver<Completion>>,
    /// Submitted but not yet received by the host
    in_flight: AtomicUsize,
}

impl Dispatcher {
    /// Creates a dispatcher with the default handler table and a worker pool
    /// running at most `worker_threads` computations at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker runtime cannot be started.
    pub fn new(worker_threads: usize) -> Result<Self> {
        let worker_threads = worker_threads.max(1);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(worker_threads)
            .thread_name("hostcall-worker")
            .build()?;

        let system = SystemInfo::query();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        tracing::info!(worker_threads, "dispatcher started");

        Ok(Self {
            handlers: default_handlers(system),
            runtime,
            permits: Arc::new(Semaphore::new(worker_threads)),
            worker_threads,
            system,
            completion_tx,
            completion_rx: Mutex::new(completion_rx),
            in_flight: AtomicUsize::new(0),
        })
    }

    /// Replaces the handler for `operation`.
    pub fn with_handler<F>(mut self, operation: Operation, handler: F) -> Self
    where
        F: Fn(StructuredValue) -> Result<StructuredValue> + Send + Sync + 'static,
    {
        self.handlers.insert(operation, Arc::new(handler));
        self
    }

    /// Runs `operation` on the calling thread.
    pub fn invoke(&self, operation: Operation, args: StructuredValue) -> ComputationOutcome {
        tracing::debug!(%operation, "sync invoke");
        run_handler(self.handler(operation), operation, args)
    }

    /// Schedules the request on the worker pool and returns its task id
    /// without waiting. The request's arguments move into the worker.
    pub fn submit(&self, request: ComputationRequest) -> TaskId {
        let ComputationRequest {
            id,
            operation,
            args,
            ..
        } = request;
        let handler = self.handler(operation);
        let permits = Arc::clone(&self.permits);
        let completion_tx = self.completion_tx.clone();

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(task = id, %operation, "scheduling async computation");

        self.runtime.spawn(async move {
            let outcome = match permits.acquire_owned().await {
                Ok(permit) => tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    run_handler(handler, operation, args)
                })
                .await
                .unwrap_or_else(|e| {
                    ComputationOutcome::failure(HostcallError::Internal(format!(
                        "worker task failed: {}",
                        e
                    )))
                }),
                Err(e) => ComputationOutcome::failure(HostcallError::Internal(format!(
                    "worker pool closed: {}",
                    e
                ))),
            };

            if completion_tx.send(Completion { task: id, outcome }).is_err() {
                tracing::warn!(task = id, "dispatcher dropped before completion was delivered");
            }
        });

        id
    }

    /// Queues an already-failed completion for `task`, delivered through the
    /// same path as computed ones.
    pub fn fail(&self, task: TaskId, error: HostcallError) {
        tracing::debug!(task, %error, "queueing failed completion");
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let completion = Completion {
            task,
            outcome: ComputationOutcome::failure(error),
        };
        if self.completion_tx.send(completion).is_err() {
            // the receiver lives in self, so this cannot happen while we exist
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Runs the request in the mode it asks for.
    pub fn dispatch(&self, request: ComputationRequest) -> Dispatched {
        match request.mode {
            CallMode::Sync => Dispatched::Completed(self.invoke(request.operation, request.args)),
            CallMode::Async => Dispatched::Scheduled(self.submit(request)),
        }
    }

    /// Blocks until the next completion arrives. Returns `None` immediately
    /// when nothing is in flight.
    pub fn wait_completion(&self) -> Option<Completion> {
        if self.in_flight() == 0 {
            return None;
        }

        let completion = self.receiver().blocking_recv()?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(completion)
    }

    /// Returns the next completion if one is ready.
    pub fn try_completion(&self) -> Option<Completion> {
        let completion = self.receiver().try_recv().ok()?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(completion)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn system(&self) -> &SystemInfo {
        &self.system
    }

    fn handler(&self, operation: Operation) -> Option<Handler> {
        self.handlers.get(&operation).cloned()
    }

    fn receiver(&self) -> std::sync::MutexGuard<'_, mpsc::UnboundedReceiver<Completion>> {
        // a poisoned lock still holds a usable receiver
        self.completion_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn default_handlers(system: SystemInfo) -> HashMap<Operation, Handler> {
    let mut handlers: HashMap<Operation, Handler> = HashMap::new();
    handlers.insert(Operation::Fibonacci, Arc::new(fibonacci::handle));
    handlers.insert(Operation::ObjectTransform, Arc::new(transform::handle));
    handlers.insert(Operation::Hello, Arc::new(move |args: StructuredValue| system.handle_hello(args)));
    handlers.insert(Operation::CpuCount, Arc::new(move |args: StructuredValue| system.handle_cpu_count(args)));
    handlers
}

fn run_handler(handler: Option<Handler>, operation: Operation, args: StructuredValue) -> ComputationOutcome {
    let Some(handler) = handler else {
        return ComputationOutcome::failure(HostcallError::Internal(format!(
            "no handler registered for '{}'",
            operation
        )));
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
        Ok(result) => ComputationOutcome::from(result),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(%operation, "handler panicked: {message}");
            ComputationOutcome::failure(HostcallError::Internal(format!(
                "'{}' handler panicked: {}",
                operation, message
            )))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
