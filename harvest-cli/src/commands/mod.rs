use std::path::PathBuf;
use std::sync::Arc;

use harvest_catalog::{Credentials, IgdbClient};
use harvest_lib::{HarvestContext, Settings};
use harvest_storage::ProbeFailurePolicy;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::cli_types::{PathArgs, RunArgs};
use crate::error::CliError;

pub(crate) mod config;
pub(crate) mod recover;
pub(crate) mod run;
pub(crate) mod status;
pub(crate) mod targets;

/// Load the settings file, `path` or the default location.
pub(crate) fn load_settings(path: Option<PathBuf>) -> Result<Settings, CliError> {
    let path = path.unwrap_or_else(harvest_lib::settings_path);
    log::debug!("Loading settings from {}", path.display());
    Ok(Settings::load(&path)?)
}

pub(crate) fn apply_path_args(settings: &mut Settings, args: &PathArgs) {
    if let Some(checkpoint) = &args.checkpoint {
        settings.paths.checkpoint = checkpoint.clone();
    }
    if let Some(targets) = &args.targets {
        settings.storage.targets = targets.clone();
    }
}

pub(crate) fn apply_run_args(settings: &mut Settings, args: &RunArgs) {
    apply_path_args(settings, &args.paths);
    if let Some(output) = &args.output {
        settings.paths.output = output.clone();
    }
    if let Some(stage) = &args.stage_dir {
        settings.paths.stage_dir = stage.clone();
    }
    if let Some(n) = args.workers {
        settings.pipeline.workers = n;
    }
    if let Some(n) = args.batch_size {
        settings.pipeline.batch_size = n;
    }
    if args.skip_on_probe_failure {
        settings.storage.on_probe_failure = ProbeFailurePolicy::Skip;
    }
}

pub(crate) fn build_context(settings: Settings) -> Result<HarvestContext, CliError> {
    Ok(HarvestContext::new(settings)?)
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new().map_err(|e| CliError::runtime(e.to_string()))
}

pub(crate) fn spinner(quiet: bool, msg: impl Into<String>) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .expect("static pattern")
            .tick_chars("/-\\|"),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Exchange credentials for a token, with a spinner while waiting.
pub(crate) async fn connect_catalog(quiet: bool) -> Result<Arc<IgdbClient>, CliError> {
    let creds = Credentials::load()?;
    let pb = spinner(quiet, "Connecting to IGDB...");
    let client = IgdbClient::connect(&creds).await;
    pb.finish_and_clear();

    let client = client.map_err(|e| CliError::Auth(e.to_string()))?;
    log::info!(
        "{} Connected to IGDB",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
    );
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_override_settings() {
        let mut settings = Settings::default();
        let args = RunArgs {
            paths: PathArgs {
                checkpoint: Some(PathBuf::from("state/cp.json")),
                targets: Some(vec!["x".into(), "y".into()]),
            },
            workers: Some(4),
            skip_on_probe_failure: true,
            ..RunArgs::default()
        };
        apply_run_args(&mut settings, &args);

        assert_eq!(settings.paths.checkpoint, PathBuf::from("state/cp.json"));
        assert_eq!(settings.storage.targets, vec!["x", "y"]);
        assert_eq!(settings.pipeline.workers, 4);
        assert_eq!(settings.pipeline.batch_size, 500);
        assert_eq!(settings.storage.on_probe_failure, ProbeFailurePolicy::Skip);
        assert_eq!(settings.paths.output, PathBuf::from("game_screenshots.json"));
    }

    #[test]
    fn cli_parses_run_flags() {
        use clap::Parser;

        let cli = crate::cli_types::Cli::parse_from([
            "harvest",
            "run",
            "--targets",
            "a,b,c",
            "--batch-size",
            "100",
            "-q",
        ]);
        assert!(cli.quiet);
        match cli.command {
            crate::cli_types::Commands::Run(args) => {
                assert_eq!(args.paths.targets, Some(vec!["a".into(), "b".into(), "c".into()]));
                assert_eq!(args.batch_size, Some(100));
            }
            _ => panic!("expected run"),
        }
    }
}
