use std::path::PathBuf;

use crate::error::CatalogError;

const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";

/// Client credentials exchanged for a catalog bearer token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Where a credential field's value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable.
    EnvVar(&'static str),
    /// Loaded from the config file.
    ConfigFile,
    /// Not set anywhere.
    Missing,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Provenance of each credential field.
#[derive(Debug)]
pub struct CredentialSources {
    pub client_id: CredentialSource,
    pub client_secret: CredentialSource,
}

/// TOML config file format.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct ConfigFile {
    twitch: Option<TwitchConfig>,
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
struct TwitchConfig {
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl Credentials {
    /// Load credentials from environment variables or the config file.
    ///
    /// Priority: env vars > config file. Both fields are required.
    pub fn load() -> Result<Self, CatalogError> {
        let config = load_config_file();

        let client_id = std::env::var(ENV_CLIENT_ID)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| config.as_ref().and_then(|c| c.client_id.clone()))
            .ok_or_else(|| {
                CatalogError::Config(format!(
                    "Missing client_id. Set {ENV_CLIENT_ID} env var or add to config file"
                ))
            })?;

        let client_secret = std::env::var(ENV_CLIENT_SECRET)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| config.as_ref().and_then(|c| c.client_secret.clone()))
            .ok_or_else(|| {
                CatalogError::Config(format!(
                    "Missing client_secret. Set {ENV_CLIENT_SECRET} env var or add to config file"
                ))
            })?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Replace fields with explicit values (e.g., from CLI args).
    pub fn with_overrides(mut self, client_id: Option<String>, client_secret: Option<String>) -> Self {
        if let Some(id) = client_id {
            self.client_id = id;
        }
        if let Some(secret) = client_secret {
            self.client_secret = secret;
        }
        self
    }
}

/// Return the path to the credentials config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("harvest").join("credentials.toml"))
}

/// Save credentials to the config file, creating parent directories as needed.
///
/// Returns the path the file was written to.
pub fn save_to_file(creds: &Credentials) -> Result<PathBuf, CatalogError> {
    let path = config_path()
        .ok_or_else(|| CatalogError::Config("Could not determine config directory".to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = ConfigFile {
        twitch: Some(TwitchConfig {
            client_id: Some(creds.client_id.clone()),
            client_secret: Some(creds.client_secret.clone()),
        }),
    };

    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| CatalogError::Config(format!("Failed to serialize config: {}", e)))?;

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, toml_str)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

/// Determine where each credential field is coming from.
pub fn credential_sources() -> CredentialSources {
    let config = load_config_file();

    let source = |var: &'static str, in_file: bool| {
        if std::env::var(var).is_ok_and(|v| !v.is_empty()) {
            CredentialSource::EnvVar(var)
        } else if in_file {
            CredentialSource::ConfigFile
        } else {
            CredentialSource::Missing
        }
    };

    CredentialSources {
        client_id: source(
            ENV_CLIENT_ID,
            config.as_ref().and_then(|c| c.client_id.as_ref()).is_some(),
        ),
        client_secret: source(
            ENV_CLIENT_SECRET,
            config
                .as_ref()
                .and_then(|c| c.client_secret.as_ref())
                .is_some(),
        ),
    }
}

fn load_config_file() -> Option<TwitchConfig> {
    let path = config_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Option<TwitchConfig> {
    let config: ConfigFile = toml::from_str(content).ok()?;
    config.twitch
}
