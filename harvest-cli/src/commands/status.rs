use std::path::PathBuf;

use harvest_lib::CheckpointStore;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::error::CliError;

/// Print what the checkpoint says about progress. No network access.
pub(crate) fn run_status(
    settings_path: Option<PathBuf>,
    checkpoint: Option<PathBuf>,
) -> Result<(), CliError> {
    let settings = super::load_settings(settings_path)?;
    let path = checkpoint.unwrap_or_else(|| settings.paths.checkpoint.clone());
    let store = CheckpointStore::new(&path);

    log::info!("{}", "Harvest status".if_supports_color(Stdout, |t| t.bold()));
    log::info!("");

    let Some(cp) = store.try_load()? else {
        log::info!(
            "  Checkpoint: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
        if settings.paths.output.exists() {
            log::info!(
                "  {} Output {} exists; the last run completed",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                settings.paths.output.display(),
            );
        } else {
            log::info!("  No run in progress; 'harvest run' starts with a storage scan");
        }
        return Ok(());
    };

    let max_attempts = settings.pipeline.max_attempts;
    let abandoned = cp
        .attempts
        .keys()
        .filter(|id| cp.is_abandoned(**id, max_attempts))
        .count();
    let screenshots: usize = cp.entries.iter().map(|e| e.screenshots.len()).sum();

    log::info!(
        "  Checkpoint: {}",
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!("  {:<18} {}", "Catalog offset:", cp.offset);
    log::info!("  {:<18} {}", "Delivered images:", cp.delivered.len());
    log::info!(
        "  {:<18} {} ({} screenshots)",
        "Entries collected:",
        cp.entries.len(),
        screenshots
    );
    if !cp.attempts.is_empty() {
        log::info!(
            "  {:<18} {} {}",
            "Failed images:",
            cp.attempts.len(),
            format!("({} abandoned)", abandoned).if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}
