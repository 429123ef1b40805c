use std::io::Write;
use std::path::PathBuf;

use harvest_catalog::{CatalogQuery, CredentialSource, Credentials};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use crate::error::CliError;

fn mask_value(s: &str) -> String {
    match s.char_indices().nth(2) {
        Some((i, _)) => format!("{}****", &s[..i]),
        None => "****".to_string(),
    }
}

fn print_path_status(label: &str, path: Option<&std::path::Path>) {
    match path {
        Some(p) if p.exists() => {
            log::info!(
                "  {}: {} {}",
                label,
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(exists)".if_supports_color(Stdout, |t| t.green()),
            );
        }
        Some(p) => {
            log::info!(
                "  {}: {} {}",
                label,
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        None => {
            log::info!(
                "  {}: {}",
                label,
                "could not determine path".if_supports_color(Stdout, |t| t.red()),
            );
        }
    }
}

/// Show credentials with their sources, then the effective settings.
pub(crate) fn run_config_show(settings_path: Option<PathBuf>) -> Result<(), CliError> {
    let settings_file = settings_path.clone().unwrap_or_else(harvest_lib::settings_path);
    let creds_file = harvest_catalog::config_path();
    let sources = harvest_catalog::credential_sources();

    log::info!(
        "{}",
        "Harvest Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    print_path_status("Credentials file", creds_file.as_deref());
    print_path_status("Settings file", Some(&settings_file));
    log::info!("");

    let creds = Credentials::load().ok();
    let fields = [
        (
            "client_id",
            &sources.client_id,
            creds.as_ref().map(|c| c.client_id.clone()),
            false,
        ),
        (
            "client_secret",
            &sources.client_secret,
            creds.as_ref().map(|c| c.client_secret.clone()),
            true,
        ),
    ];

    for (name, source, value, secret) in fields {
        let value = match source {
            CredentialSource::Missing => None,
            _ => value.map(|v| if secret { mask_value(&v) } else { v }),
        };
        let source_str = format!("({})", source);
        match value {
            Some(v) => log::info!(
                "  {} {} {}",
                format!("{}:", name).if_supports_color(Stdout, |t| t.cyan()),
                v,
                source_str.if_supports_color(Stdout, |t| t.dimmed()),
            ),
            None => log::info!(
                "  {} {} {}",
                format!("{}:", name).if_supports_color(Stdout, |t| t.cyan()),
                "not set".if_supports_color(Stdout, |t| t.yellow()),
                source_str.if_supports_color(Stdout, |t| t.dimmed()),
            ),
        }
    }

    let settings = super::load_settings(settings_path)?;
    let rendered = toml::to_string_pretty(&settings)
        .map_err(|e| CliError::config(format!("Failed to render settings: {e}")))?;
    log::info!("");
    log::info!(
        "{}",
        "Effective settings".if_supports_color(Stdout, |t| t.bold()),
    );
    for line in rendered.lines() {
        log::info!("  {}", line);
    }
    Ok(())
}

fn read_line(prompt: &str, default: Option<&str>) -> Result<String, CliError> {
    loop {
        match default {
            Some(def) => print!("  {} [{}]: ", prompt, def),
            None => print!("  {}: ", prompt),
        }
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let trimmed = input.trim();

        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
        if let Some(def) = default {
            return Ok(def.to_string());
        }
        println!(
            "    {}",
            "This field is required.".if_supports_color(Stdout, |t| t.yellow()),
        );
    }
}

/// Interactively set up catalog credentials.
pub(crate) fn run_config_setup() -> Result<(), CliError> {
    println!(
        "{}",
        "IGDB Credential Setup".if_supports_color(Stdout, |t| t.bold()),
    );
    println!();
    println!(
        "  {}",
        "Create an application at https://dev.twitch.tv/console/apps to get these."
            .if_supports_color(Stdout, |t| t.dimmed()),
    );

    let existing = Credentials::load().ok();
    let client_id = read_line("client_id", existing.as_ref().map(|c| c.client_id.as_str()))?;
    let masked = existing.as_ref().map(|c| mask_value(&c.client_secret));
    let secret_input = read_line("client_secret", masked.as_deref())?;

    // Enter on the masked default keeps the stored secret.
    let client_secret = match (&existing, &masked) {
        (Some(c), Some(m)) if &secret_input == m => c.client_secret.clone(),
        _ => secret_input,
    };

    let path = harvest_catalog::save_to_file(&Credentials {
        client_id,
        client_secret,
    })?;
    println!();
    println!(
        "{} Credentials saved to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    Ok(())
}

/// Exchange a token and request a single catalog entry.
pub(crate) fn run_config_test(settings_path: Option<PathBuf>, quiet: bool) -> Result<(), CliError> {
    let settings = super::load_settings(settings_path)?;
    log::info!("Testing credentials against the IGDB API...");

    let rt = super::runtime()?;
    rt.block_on(async {
        let client = super::connect_catalog(quiet).await?;
        let pb = super::spinner(quiet, "Querying one entry...");
        let query = CatalogQuery::page(settings.catalog.filter.clone(), 1, 0);
        let games = client.query_games(&query).await;
        pb.finish_and_clear();

        let games = games?;
        log::info!(
            "{} Credentials are valid!",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        );
        if let Some(game) = games.first() {
            log::info!(
                "  First entry: {} ({} screenshots)",
                game.name.as_deref().unwrap_or("<unnamed>"),
                game.screenshots.len(),
            );
        }
        Ok::<(), CliError>(())
    })
}

/// Print the config file paths.
pub(crate) fn run_config_path(settings_path: Option<PathBuf>) -> Result<(), CliError> {
    let creds = harvest_catalog::config_path()
        .ok_or_else(|| CliError::config("Could not determine config directory"))?;
    let settings = settings_path.unwrap_or_else(harvest_lib::settings_path);
    println!("{}", creds.display());
    println!("{}", settings.display());
    Ok(())
}
