use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::probe_config::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub struct AppConfig {
    pub config: Config,
    pub max_target_width: usize,
}

impl AppConfig {
    pub fn pacing_interval(&self) -> Duration {
        Duration::from_secs(self.config.pacing_interval_seconds)
    }

    pub fn probe_deadline(&self) -> Duration {
        Duration::from_secs(self.config.probe.deadline_seconds)
    }
}

/// Load the application configuration from a YAML file and environment variables.
/// The file is located by the `CONFIG_FILE` environment variable and defaults to `config.yml`;
/// a missing default file means the built in defaults are used.
/// `DATABASE_PATH` overrides the store location from the file.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let explicit_location = env::var("CONFIG_FILE").ok();
    let config_file_location = PathBuf::from(
        explicit_location
            .clone()
            .unwrap_or_else(|| "config.yml".to_string()),
    );

    let mut config = match std::fs::read_to_string(&config_file_location) {
        Ok(config_str) => parse_config(&config_str).map_err(|source| ConfigError::Parse {
            path: config_file_location.clone(),
            source,
        })?,
        Err(e) if explicit_location.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "No {} found, using default configuration",
                config_file_location.display()
            );
            Config::default()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: config_file_location,
                source,
            });
        }
    };

    if let Ok(database) = env::var("DATABASE_PATH") {
        config.database = PathBuf::from(database);
    }

    build_app_config(config)
}

pub fn parse_config(config_str: &str) -> Result<Config, serde_yaml::Error> {
    serde_yaml::from_str(config_str)
}

/// Validates the configuration and derives the values the scheduler needs.
pub fn build_app_config(config: Config) -> Result<AppConfig, ConfigError> {
    if config.targets.is_empty() {
        return Err(ConfigError::Invalid("no targets configured".to_string()));
    }
    if config.pacing_interval_seconds == 0 {
        return Err(ConfigError::Invalid(
            "pacing_interval_seconds must be at least 1".to_string(),
        ));
    }
    if config.probe.deadline_seconds == 0 {
        return Err(ConfigError::Invalid(
            "probe.deadline_seconds must be at least 1".to_string(),
        ));
    }

    log::info!("Probing targets: {:?}", config.targets);
    log::info!("Recording results in {}", config.database.display());

    let max_target_width = config.targets.iter().map(|t| t.len()).max().unwrap_or(10);

    Ok(AppConfig {
        config,
        max_target_width,
    })
}
