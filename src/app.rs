use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};

use crate::cli::Args;
use crate::config::{Config, ConfigError};
use crate::probe::{self, ProbeOptions};

/// How a run ended, and the process exit status for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    ProbeFailed = 1,
    Config = 2,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// Probe the configured project and write the report to `out`.
///
/// A configuration failure is reported on stderr before any report output.
pub async fn run<W: Write>(args: Args, config: Result<Config, ConfigError>, out: &mut W) -> Exit {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Exit::Config;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        endpoint = %config.supabase_url,
        "starting supaprobe"
    );

    let options = ProbeOptions {
        columns: args.columns,
        limit: args.limit,
        also: args.also,
        timeout: config.request_timeout(),
    };

    if probe::probe(&config.supabase_url, &config.supabase_key, &options, out).await {
        Exit::Success
    } else {
        error!("connectivity probe failed");
        Exit::ProbeFailed
    }
}
