mod bootstrap;

use anyhow::{Context, Result};
use stats_core::formatting::{format_count, format_elapsed};
use stats_core::markers::MarkerSet;
use stats_core::settings::Settings;
use stats_core::time_utils::today_in;
use stats_runtime::orchestrator::{AnalysisJob, JobEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("IDE usage stats v{} starting", env!("CARGO_PKG_VERSION"));

    let today = today_in(&settings.timezone);
    let (reference_date, mode) = settings.reference(today)?;
    let log_dir = settings.resolve_log_dir(&bootstrap::default_log_dir());
    let output_dir = settings.resolve_output_dir(&log_dir);

    let markers = match &settings.markers {
        Some(path) => MarkerSet::load_from(path)
            .with_context(|| format!("loading markers from {}", path.display()))?,
        None => MarkerSet::default(),
    };

    tracing::info!(
        "Reference: {}, Mode: {}, Logs: {}, Output: {}",
        reference_date,
        mode,
        log_dir.display(),
        output_dir.display()
    );

    let job = AnalysisJob::new(log_dir, output_dir, reference_date, mode)
        .with_markers(markers)
        .with_secondary_query_divisor(settings.secondary_query_divisor);
    let (mut rx, handle) = job.start();

    let outcome = tokio::select! {
        outcome = async {
            while let Some(event) = rx.recv().await {
                match event {
                    JobEvent::Started => eprintln!("Analyzing logs, please wait..."),
                    JobEvent::Finished(result) => return Some(result),
                }
            }
            None
        } => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; cancelling analysis");
            handle.abort();
            anyhow::bail!("analysis cancelled");
        }
    };

    let summary = match outcome {
        Some(Ok(summary)) => summary,
        Some(Err(message)) => anyhow::bail!(message),
        None => anyhow::bail!("analysis ended without a result"),
    };

    for line in &summary.text_lines {
        println!("{}", line);
    }

    let counters = &summary.metadata.summary;
    eprintln!(
        "Analysis complete: {} users, {} of {} files, {} lines counted in {}",
        summary.users,
        counters.files_processed,
        counters.files_discovered,
        format_count(counters.lines_counted),
        format_elapsed(summary.metadata.elapsed_seconds),
    );
    for path in &summary.reports {
        eprintln!("Report written to {}", path.display());
    }

    Ok(())
}
