use std::path::PathBuf;
use std::sync::Arc;

use harvest_core::util::format_bytes;
use harvest_lib::{
    CheckpointOrigin, EventSink, HarvestError, IgdbCatalog, Pipeline, RunSummary, run_with_events,
};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::cli_types::RunArgs;
use crate::display::RunDisplay;
use crate::error::CliError;

/// Run the pipeline until the catalog is exhausted or a fatal error stops it.
pub(crate) fn run_harvest(
    settings_path: Option<PathBuf>,
    args: RunArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let mut settings = super::load_settings(settings_path)?;
    super::apply_run_args(&mut settings, &args);
    let ctx = super::build_context(settings)?;

    log::info!(
        "Harvesting into {} targets (batch {}, {} workers, min free {})",
        ctx.targets().len(),
        ctx.settings.pipeline.batch_size,
        ctx.settings.pipeline.workers,
        format_bytes(ctx.settings.storage.min_free_bytes),
    );
    log::info!("");

    let rt = super::runtime()?;
    rt.block_on(async {
        let client = super::connect_catalog(quiet).await?;
        let catalog = IgdbCatalog::new(
            client.clone(),
            ctx.settings.catalog.filter.clone(),
            ctx.settings.pipeline.max_screenshots,
        );
        let backend = Arc::new(ctx.rclone_backend());

        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        let pipeline = Pipeline::new(ctx.clone(), catalog, client, backend)
            .with_events(EventSink::new(event_tx));

        let mut display = RunDisplay::new(quiet);
        let result = run_with_events(pipeline.run(), event_rx, |e| display.handle(e)).await;
        display.finish();

        match result {
            Ok(summary) => {
                print_summary(&summary, &ctx.settings.paths.output);
                Ok::<(), CliError>(())
            }
            Err(e) => {
                report_stop(&e, &ctx.settings.paths.checkpoint);
                Err(CliError::from(e))
            }
        }
    })
}

fn print_summary(summary: &RunSummary, output: &std::path::Path) {
    log::info!("");
    log::info!("{}", "Summary".if_supports_color(Stdout, |t| t.bold()));
    match summary.origin {
        Some(CheckpointOrigin::Recovered { count }) => {
            log::info!("  Started from storage scan ({} images already present)", count);
        }
        Some(CheckpointOrigin::Loaded) => log::info!("  Resumed from checkpoint"),
        None => {}
    }
    log::info!(
        "  {} {} images delivered in {} batches over {} pages",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        summary.delivered,
        summary.batches,
        summary.pages,
    );
    for (target, count) in &summary.targets_used {
        log::info!(
            "    {} {}",
            format!("{}:", target).if_supports_color(Stdout, |t| t.cyan()),
            count,
        );
    }
    if summary.failed > 0 {
        log::warn!(
            "  {} {} images failed (retried on the next run)",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            summary.failed,
        );
    }
    if summary.abandoned > 0 {
        log::warn!(
            "  {} {} images skipped after too many failed attempts",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            summary.abandoned,
        );
    }
    log::info!(
        "  {} entries written to {}",
        summary.entries,
        output.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!(
        "  {}",
        format!("took {}s", summary.elapsed().num_seconds()).if_supports_color(Stdout, |t| t.dimmed()),
    );
}

fn report_stop(err: &HarvestError, checkpoint: &std::path::Path) {
    log::error!("");
    match err {
        HarvestError::AllTargetsFull { .. } => {
            log::error!("Every storage target is below the free-space threshold.");
            log::error!("Add a target with --targets or in the settings file, then run again.");
        }
        HarvestError::Checkpoint { .. } => {
            log::error!("Fix or remove the checkpoint file; removing it rebuilds state from storage.");
        }
        _ => {
            log::error!(
                "Progress up to the last committed batch is saved in {}.",
                checkpoint.display()
            );
            log::error!("Run 'harvest run' again to resume.");
        }
    }
    log::error!("");
}
