//! Configuration file loading and validation

use crate::config::{DocgeomConfig, RelationalDriver};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or TOML for [`DocgeomConfig`]
    #[error("Error parsing config file {path}: {message}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The file parsed but a value is unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON, the legacy format
    Json,
    /// TOML
    Toml,
}

impl ConfigFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Loads [`DocgeomConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate a configuration file
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<DocgeomConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content, ConfigFormat::from_path(path)).map_err(|message| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            }
        })?;

        Self::validate(&config)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration text.
    ///
    /// Without a known format JSON is tried first, then TOML.
    pub fn parse(content: &str, format: Option<ConfigFormat>) -> Result<DocgeomConfig, String> {
        match format {
            Some(ConfigFormat::Json) => serde_json::from_str(content).map_err(|e| e.to_string()),
            Some(ConfigFormat::Toml) => toml::from_str(content).map_err(|e| e.to_string()),
            None => serde_json::from_str(content).or_else(|json_err| {
                toml::from_str(content).map_err(|toml_err| {
                    format!("not JSON ({}) and not TOML ({})", json_err, toml_err)
                })
            }),
        }
    }

    /// Check values that would otherwise fail later against a live store
    pub fn validate(config: &DocgeomConfig) -> ConfigResult<()> {
        if config.source.host.trim().is_empty() {
            return Err(ConfigError::Invalid("source.host must be set".to_string()));
        }
        for (name, value) in [
            ("source.table_meta_table", &config.source.table_meta_table),
            ("source.record_link_table", &config.source.record_link_table),
            ("destination.output_table", &config.destination.output_table),
            ("destination.geometry_column", &config.destination.geometry_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        if config.destination.database.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "destination.database must be set".to_string(),
            ));
        }
        if config.destination.driver == RelationalDriver::Postgres
            && config.destination.host.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "destination.host must be set for the postgres driver".to_string(),
            ));
        }
        if config.pipeline.insert_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.insert_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_JSON: &str = r#"{
        "Logfile": "/var/log/docgeom.log",
        "PostgresDB": {
            "Driver": "postgres",
            "Host": "localhost",
            "Port": 5432,
            "Database": "main",
            "User": "postgres",
            "Password": "pw",
            "SSL": false
        },
        "MongoDB": { "Host": "ws://localhost:8000" }
    }"#;

    #[test]
    fn test_parse_legacy_json_keys() {
        let config = ConfigLoader::parse(LEGACY_JSON, Some(ConfigFormat::Json)).unwrap();
        assert_eq!(
            config.logfile.as_deref(),
            Some(Path::new("/var/log/docgeom.log"))
        );
        assert_eq!(config.destination.host, "localhost");
        assert_eq!(config.destination.port, 5432);
        assert_eq!(config.source.host, "ws://localhost:8000");
        assert_eq!(config.source.record_link_table, "record_link");
        assert_eq!(config.source.table_meta_limit, 100);
        assert_eq!(config.pipeline.insert_batch_size, 500);
        assert!(!config.pipeline.atomic_replace);
    }

    #[test]
    fn test_parse_without_extension_falls_back_to_toml() {
        let toml_text = r#"
            [source]
            host = "mem://"

            [destination]
            driver = "sqlite"
            database = ":memory:"
        "#;
        let config = ConfigLoader::parse(toml_text, None).unwrap();
        assert_eq!(config.destination.driver, RelationalDriver::Sqlite);
        assert_eq!(config.destination.output_table, "DocumentGeometry");
    }

    #[test]
    fn test_parse_garbage_reports_both_formats() {
        let err = ConfigLoader::parse("{{ nope", None).unwrap_err();
        assert!(err.contains("not JSON"));
        assert!(err.contains("not TOML"));
    }

    #[test]
    fn test_validate_rejects_missing_postgres_host() {
        let mut config = ConfigLoader::parse(LEGACY_JSON, Some(ConfigFormat::Json)).unwrap();
        config.destination.host.clear();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(err.to_string().contains("destination.host"));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = ConfigLoader::parse(LEGACY_JSON, Some(ConfigFormat::Json)).unwrap();
        config.pipeline.insert_batch_size = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::Invalid(_))
        ));
    }
}
