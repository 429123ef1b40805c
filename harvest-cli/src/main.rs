//! harvest CLI
//!
//! Command-line interface for harvesting catalog screenshots into a pool of
//! rclone storage targets.

mod cli_types;
mod commands;
mod display;
mod error;
mod logging;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cli_types::{Cli, Commands, ConfigAction};
use commands::config::{run_config_path, run_config_setup, run_config_show, run_config_test};
use commands::recover::run_recover;
use commands::run::run_harvest;
use commands::status::run_status;
use commands::targets::run_targets;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.quiet, cli.verbose);

    let settings = cli.settings.clone();
    let result = match cli.command {
        Commands::Run(args) => run_harvest(settings, args, cli.quiet),
        Commands::Recover { paths } => run_recover(settings, paths, cli.quiet),
        Commands::Status { checkpoint } => run_status(settings, checkpoint),
        Commands::Targets { targets } => run_targets(settings, targets, cli.quiet),
        Commands::Config { action } => match action {
            ConfigAction::Show => run_config_show(settings),
            ConfigAction::Setup => run_config_setup(),
            ConfigAction::Test => run_config_test(settings, cli.quiet),
            ConfigAction::Path => run_config_path(settings),
        },
    };

    if let Err(e) = result {
        log::error!(
            "{} {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            e,
        );
        if e.needs_credentials() {
            log::error!("");
            log::error!("Set credentials via environment variables:");
            log::error!("  TWITCH_CLIENT_ID, TWITCH_CLIENT_SECRET");
            log::error!("");
            log::error!("Or run 'harvest config setup' to configure credentials.");
        }
        std::process::exit(1);
    }
}
