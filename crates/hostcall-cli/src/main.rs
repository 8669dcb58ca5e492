//! # hostcall CLI Entry Point
//!
//! Main binary for running scripts against the native module and for making
//! one-off calls into it.
//!
//! ## Usage
//!
//! ```bash
//! # Run a script with the module installed as `native`
//! hostcall run demos/module_smoke.js
//!
//! # Same, with two workers and the module under another name
//! hostcall run script.js --workers 2 --module-name nm
//!
//! # Make a call (outputs raw JSON)
//! hostcall call fibonacci --args 13
//! hostcall call objop --args '{"id": "me"}' --async
//! ```

use anyhow::Result;
use argh::FromArgs;
use hostcall_common::CallMode;
use hostcall_native::HostConfig;

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// hostcall - native computations for an embedded script host
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
///
/// - **Run**: Evaluate a script file and drain its async callbacks
/// - **Call**: Make a single call (unix-friendly JSON output)
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Run(RunArgs),
    Call(CallArgs),
}

/// Arguments for running a script.
///
/// # Example
///
/// ```bash
/// hostcall run demos/module_smoke.js --workers 4
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
/// run a script with the native module installed
struct RunArgs {
    /// path to the JavaScript file to run
    #[argh(positional)]
    script: String,

    /// maximum number of async computations running at once
    ///
    /// Defaults to the number of logical CPUs.
    #[argh(option, short = 'w')]
    workers: Option<usize>,

    /// deepest array/object nesting accepted from the script (at most 512)
    #[argh(option, long = "max-depth")]
    max_depth: Option<usize>,

    /// global name the module object is installed under
    #[argh(option, long = "module-name")]
    module_name: Option<String>,
}

/// Arguments for making a single call.
///
/// The result is printed as raw JSON to stdout. Errors are printed to stderr
/// and the process exits with a non-zero status.
///
/// # Example
///
/// ```bash
/// hostcall call fibonacci --args 100 | jq .
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call an operation and print the result as JSON
struct CallArgs {
    /// operation name (fibonacci, objop, hello, cpu_count)
    #[argh(positional)]
    operation: String,

    /// argument as JSON (default: null)
    #[argh(option, short = 'a', default = "String::from(\"null\")")]
    args: String,

    /// run on the worker pool instead of the calling thread
    #[argh(switch, long = "async")]
    run_async: bool,

    /// number of workers for async calls
    #[argh(option, short = 'w')]
    workers: Option<usize>,
}

impl RunArgs {
    fn config(&self) -> HostConfig {
        let mut config = HostConfig::new();
        if let Some(workers) = self.workers {
            config = config.with_worker_threads(workers);
        }
        if let Some(max_depth) = self.max_depth {
            config = config.with_max_depth(max_depth);
        }
        if let Some(module_name) = &self.module_name {
            config = config.with_module_name(module_name.as_str());
        }
        config
    }
}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // call keeps stdout clean for piping into other tools
    if !matches!(cli.command, Commands::Call(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run(args) => {
            let config = args.config();
            tracing::info!("Running script: {}", args.script);
            let delivered = hostcall_cli::run_script(&args.script, config)?;
            tracing::info!("Script finished, {} callbacks delivered", delivered);
        }
        Commands::Call(args) => {
            let mode = if args.run_async { CallMode::Async } else { CallMode::Sync };
            let workers = args.workers.unwrap_or_else(|| HostConfig::default().worker_threads);
            let result = hostcall_cli::call_operation(&args.operation, &args.args, mode, workers)?;

            // Output raw JSON to stdout
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
