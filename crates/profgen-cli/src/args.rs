use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use profgen::{AggregationPolicy, GenerateOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate self-profiling C++ inference code", long_about = None)]
pub struct Cli {
    /// Minimum log level; RUST_LOG takes precedence when set.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
    /// Emit log records as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Emit the profiled translation unit for a graph description
    Generate(GenerateArgs),
    /// Average a recorded call history per operator
    Summarize {
        /// JSON array of per-call maps from operator name to microseconds
        #[arg(long)]
        history: PathBuf,
        #[arg(long, default_value_t = AggregationPolicy::Union)]
        aggregation: AggregationPolicy,
        /// Print the averages as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the JSON graph description
    #[arg(long)]
    pub graph: PathBuf,
    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    /// Do not emit GetOpAvgTime()
    #[arg(long)]
    pub no_utility: bool,
    /// Leave the emitted call history without a mutex
    #[arg(long)]
    pub unsynchronized: bool,
    #[arg(long)]
    pub aggregation: Option<AggregationPolicy>,
    #[arg(long)]
    pub namespace_prefix: Option<String>,
}

impl GenerateArgs {
    /// Applies the flags that were given on top of `base`.
    pub fn apply(&self, base: GenerateOptions) -> GenerateOptions {
        let mut options = base;
        if self.no_utility {
            options.utility_functions = false;
        }
        if self.unsynchronized {
            options.synchronized_history = false;
        }
        if let Some(policy) = self.aggregation {
            options.aggregation = policy;
        }
        if let Some(prefix) = &self.namespace_prefix {
            options.namespace_prefix = prefix.clone();
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
