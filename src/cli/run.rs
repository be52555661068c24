//! Batch run command.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::Cli;
use crate::audio;
use crate::config;
use crate::pipeline::{PipelineOptions, VideoPipeline};
use crate::playlist::CsvPlaylistWriter;
use crate::recognition::AcrCloudClient;
use crate::scanner;
use crate::scheduler::{BatchReport, BatchScheduler};

/// Process every video in the input folder.
///
/// Configuration problems and an empty input folder abort before any video
/// is touched. Per-video failures are reported and reflected in the exit
/// code, but never stop the batch.
pub fn cmd_run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut config = config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let input_dir = config.batch.input_dir.clone();
    let videos = match scanner::discover_videos(
        &input_dir,
        &config.batch.extensions,
        config.batch.recursive,
    ) {
        Ok(videos) => videos,
        Err(e) => {
            error!(target: "scheduler::batch", dir = %input_dir.display(), error = %e, "Nothing to process");
            return Err(e.into());
        }
    };

    let decoder = audio::build_decoder(&config.decoder);
    let client = AcrCloudClient::new(config.acrcloud())?;
    info!(target: "recognition::acrcloud", endpoint = client.endpoint(), "Recognition client ready");
    let sink = CsvPlaylistWriter::new(config.output.dir.clone(), config.output.extension.clone());

    let pipeline = Arc::new(VideoPipeline::new(
        decoder,
        Arc::new(client),
        Arc::new(sink),
        config.segmenter()?,
        PipelineOptions {
            concurrency: config.segments.concurrency,
            write_empty: config.output.write_empty,
            scratch_root: config.batch.scratch_dir.clone(),
        },
    ));

    let rt = Runtime::new()?;
    let cancel = CancellationToken::new();
    let scheduler = BatchScheduler::new(pipeline, config.workers(), cancel.clone());
    let batch_timeout = config.batch_timeout();

    let report = rt.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(target: "scheduler::batch", "Interrupted, finishing in-flight segments");
                interrupt.cancel();
            }
        });

        if let Some(limit) = batch_timeout {
            let deadline = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {
                        warn!(target: "scheduler::batch", secs = limit.as_secs(), "Batch timeout reached, cancelling");
                        deadline.cancel();
                    }
                    _ = deadline.cancelled() => {}
                }
            });
        }

        scheduler.run(videos).await
    });

    print_report(&report);
    let summary = report.summary();
    println!();
    println!("{}", summary);

    if summary.has_failures() || cancel.is_cancelled() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_report(report: &BatchReport) {
    println!();
    for (video, result) in &report.results {
        match result {
            Ok(playlist) => {
                let marker = if playlist.is_cancelled() {
                    format!(
                        " (partial, {}/{} segments)",
                        playlist.segments_processed(),
                        playlist.segments_total()
                    )
                } else {
                    String::new()
                };
                match playlist.output() {
                    Some(path) => println!(
                        "✓ {} -> {} ({} songs){}",
                        video.display(),
                        path.display(),
                        playlist.songs().len(),
                        marker
                    ),
                    None => println!("- {} (no songs identified){}", video.display(), marker),
                }
            }
            Err(e) => println!("✗ {}: {}", video.display(), e),
        }
    }
}
