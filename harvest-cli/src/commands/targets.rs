use std::path::PathBuf;

use harvest_storage::FreeSpace;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::error::CliError;

/// Probe every target in routing order and show which one would be used.
pub(crate) fn run_targets(
    settings_path: Option<PathBuf>,
    targets: Option<Vec<String>>,
    quiet: bool,
) -> Result<(), CliError> {
    let mut settings = super::load_settings(settings_path)?;
    if let Some(t) = targets {
        settings.storage.targets = t;
    }
    let ctx = super::build_context(settings)?;
    let backend = ctx.rclone_backend();

    let rt = super::runtime()?;
    let probes = rt.block_on(async {
        let pb = super::spinner(quiet, format!("Probing {} targets...", ctx.targets().len()));
        let probes = ctx.router.probe_all(&backend).await;
        pb.finish_and_clear();
        probes
    });

    log::info!(
        "{} {}",
        "Storage targets".if_supports_color(Stdout, |t| t.bold()),
        format!(
            "(minimum free: {}, on probe failure: {})",
            harvest_core::util::format_bytes(ctx.settings.storage.min_free_bytes),
            ctx.settings.storage.on_probe_failure,
        )
        .if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!("");

    let selected = probes.iter().position(|p| p.eligible);
    for (i, probe) in probes.iter().enumerate() {
        let free = match probe.free {
            FreeSpace::Bytes(n) => harvest_core::util::format_bytes(n),
            other => other.to_string(),
        };
        let glyph = if probe.eligible {
            format!("{}", "\u{2714}".if_supports_color(Stdout, |t| t.green()))
        } else {
            format!("{}", "\u{2718}".if_supports_color(Stdout, |t| t.red()))
        };
        let marker = if selected == Some(i) {
            format!(" {}", "<- next".if_supports_color(Stdout, |t| t.bold()))
        } else {
            String::new()
        };
        log::info!(
            "  {} {:<12} {}{}",
            glyph,
            probe.target,
            free,
            marker
        );
    }

    if selected.is_none() {
        log::warn!("");
        log::warn!(
            "{} All targets are full; 'harvest run' would stop at its first batch",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
        );
    }
    Ok(())
}
