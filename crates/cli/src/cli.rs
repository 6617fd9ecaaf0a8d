use std::path::PathBuf;

use clap::Parser;

/// Drive the execution scheduler with synthetic programs.
///
/// Starts a dispatcher pool backed by a simulated executor, submits programs
/// from concurrent submitters and reports how their outcomes were routed.
#[derive(Parser, Debug)]
#[command(name = "diffexec", version, about)]
pub struct CliArgs {
    /// Path to a TOML config file (falls back to DIFFEXEC_CONFIG, then defaults)
    #[arg(long, env = "DIFFEXEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of programs to submit
    #[arg(long, default_value_t = 100)]
    pub programs: usize,

    /// Number of concurrent submitters
    #[arg(long, default_value_t = 8)]
    pub submitters: usize,

    /// Dispatcher thread count override (0 = available parallelism)
    #[arg(long)]
    pub dispatchers: Option<usize>,

    /// Simulated execution time per program, in milliseconds
    #[arg(long, default_value_t = 5)]
    pub exec_delay_ms: u64,

    /// Print final metrics as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
