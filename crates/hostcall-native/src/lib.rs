//! hostcall Native Module
//!
//! This crate provides the native computations (arbitrary-precision Fibonacci,
//! object transform, system info), the dispatcher that runs them either inline
//! or on a worker pool, and the Boa host runtime that exposes them to scripts.

pub mod compute;
pub mod config;
pub mod dispatcher;
pub mod runtime;

pub use config::HostConfig;
pub use dispatcher::{Dispatched, Dispatcher, Handler};
pub use runtime::HostContext;
