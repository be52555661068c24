//! Setlist Minder - builds a playlist of the songs heard in each video.
//!
//! Every video in a folder has its audio extracted, cut into fixed-length
//! segments and sent segment by segment to a music recognition service.
//! The unique songs, in order of first appearance, are written to a CSV
//! file next to the video.

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod playlist;
pub mod recognition;
pub mod scanner;
pub mod scheduler;
#[cfg(test)]
pub mod test_utils;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log targets raised to debug by `--verbose`
const LOG_TARGETS: &[&str] = &[
    "setlist_minder",
    "config",
    "decoder",
    "pipeline",
    "playlist",
    "recognition",
    "scheduler",
];

fn main() -> anyhow::Result<ExitCode> {
    let args = cli::Cli::parse();

    // Initialize logging; RUST_LOG takes precedence
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    if args.verbose {
        for target in LOG_TARGETS {
            filter = filter.add_directive(format!("{}=debug", target).parse()?);
        }
    }
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    cli::cmd_run(&args)
}
