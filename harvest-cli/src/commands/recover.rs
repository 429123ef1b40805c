use std::path::PathBuf;

use harvest_lib::{CheckpointStore, EventSink, run_with_events};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::cli_types::PathArgs;
use crate::display::RunDisplay;
use crate::error::CliError;

/// List every target and merge what is stored there into the checkpoint.
pub(crate) fn run_recover(
    settings_path: Option<PathBuf>,
    paths: PathArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let mut settings = super::load_settings(settings_path)?;
    super::apply_path_args(&mut settings, &paths);
    let ctx = super::build_context(settings)?;

    let store = CheckpointStore::new(&ctx.settings.paths.checkpoint);
    let backend = ctx.rclone_backend();

    let rt = super::runtime()?;
    let (checkpoint, report) = rt.block_on(async {
        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
        let events = EventSink::new(event_tx);
        let targets = ctx.targets().to_vec();
        let task_store = store.clone();
        let task = async move { task_store.rebuild(&backend, &targets, &events).await };

        let mut display = RunDisplay::new(quiet);
        let result = run_with_events(task, event_rx, |e| display.handle(e)).await;
        display.finish();
        result
    })?;

    for target in ctx.targets() {
        let count = report.per_target.get(target).copied().unwrap_or(0);
        log::info!(
            "  {} {} images",
            format!("{}:", target).if_supports_color(Stdout, |t| t.cyan()),
            count,
        );
    }
    if !report.skipped_names.is_empty() {
        log::warn!(
            "  {} {} files ignored (name is not an image id)",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            report.skipped_names.len(),
        );
    }
    log::info!(
        "{} Checkpoint {} now records {} delivered images (offset {})",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        store.path().display(),
        checkpoint.delivered.len(),
        checkpoint.offset,
    );
    Ok(())
}
