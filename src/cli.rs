use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use crate::config::SchedPolicy;
use crate::logging::LogArgs;

#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    /// Plain text blocks, one value per line
    Console,
    /// CSV with header Sample,ExecutionTime(ns),Jitter(ns)
    Csv,
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Wake-up period in nanoseconds
    #[arg(short = 'p', long = "period-ns")]
    pub period_ns: Option<u64>,

    /// Number of iterations to sample
    #[arg(short = 'n', long)]
    pub samples: Option<usize>,

    /// Upper bound for the prime-counting workload
    #[arg(long)]
    pub prime_limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct RtArgs {
    /// Scheduling priority for the sampling thread
    #[arg(long)]
    pub priority: Option<i32>,

    /// Scheduling policy for the sampling thread
    #[arg(long, value_enum)]
    pub policy: Option<SchedPolicy>,

    /// Pin the sampling thread to these CPU cores (comma-separated)
    #[arg(long = "cpus", value_delimiter = ',')]
    pub cpus: Option<Vec<usize>>,
}

#[derive(Debug, Parser)]
#[command(name = "rtlat", about = "Periodic real-time scheduling latency sampler for Linux")]
pub struct Cli {
    /// Report format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Configuration file path (default: /etc/rtlat.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub task: TaskArgs,

    #[command(flatten)]
    pub rt: RtArgs,

    #[command(flatten)]
    pub log: LogArgs,
}
