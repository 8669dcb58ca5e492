//! Host configuration.
//!
//! Controls the size of the worker pool used for async calls, the nesting
//! limit applied when decoding host values, and the global name the module
//! object is installed under.

/// Configuration for a [`HostContext`](crate::HostContext) and its dispatcher.
///
/// # Fields
///
/// - `worker_threads` - Maximum number of computations running at once on the
///   worker pool (default: logical CPU count)
/// - `max_depth` - Deepest nesting accepted when decoding a host value
///   (default: 128, at most [`MAX_DEPTH_LIMIT`])
/// - `module_name` - Global the module object is registered as (default: `native`)
///
/// # Example
///
/// ```
/// use hostcall_native::HostConfig;
///
/// let config = HostConfig::new()
///     .with_worker_threads(2)
///     .with_module_name("nm");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub worker_threads: usize,
    pub max_depth: usize,
    pub module_name: String,
}

pub const DEFAULT_MAX_DEPTH: usize = 128;
/// Highest `max_depth` accepted. Decoding recurses once per level, so the
/// limit must stay within what the host thread's stack can hold.
pub const MAX_DEPTH_LIMIT: usize = 512;
pub const DEFAULT_MODULE_NAME: &str = "native";

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
            max_depth: DEFAULT_MAX_DEPTH,
            module_name: DEFAULT_MODULE_NAME.to_string(),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `worker_threads` is zero
    /// - `max_depth` is zero or above [`MAX_DEPTH_LIMIT`]
    /// - `module_name` is not a plain identifier
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == 0 {
            return Err("worker_threads must be greater than zero".to_string());
        }

        if self.max_depth == 0 {
            return Err("max_depth must be greater than zero".to_string());
        }

        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(format!(
                "max_depth must be at most {} (got {})",
                MAX_DEPTH_LIMIT, self.max_depth
            ));
        }

        let mut chars = self.module_name.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return Err(format!(
                "module_name must be a JavaScript identifier (got '{}')",
                self.module_name
            ));
        }

        Ok(())
    }
}
