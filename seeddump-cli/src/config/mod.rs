//! Run settings
//!
//! Settings are layered, lowest precedence first: built-in defaults, the
//! TOML settings file, environment variables, command-line flags. Each layer
//! is a [`Settings`] whose `None` fields defer to the layer below.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::emit::EmitOptions;
use crate::error::ConfigError;
use crate::plan::ScanOrder;

/// Destination used when none is configured
pub const DEFAULT_DESTINATION: &str = "db/seeds.sql";

/// Database used when none is configured
pub const DEFAULT_DATABASE_URL: &str = "sqlite:db/development.sqlite3";

/// One layer of settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: Option<String>,
    /// Entity names to export; all types when unset
    pub models: Option<Vec<String>>,
    pub append: Option<bool>,
    pub batch_size: Option<usize>,
    pub exclude: Option<Vec<String>>,
    pub file: Option<PathBuf>,
    pub import: Option<bool>,
    pub limit: Option<u64>,
    pub scan_order: Option<ScanOrder>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub database_url: String,
    pub selector: Option<Vec<String>>,
    pub options: EmitOptions,
    pub scan_order: ScanOrder,
}

/// Split a comma list, trimming entries and dropping empty ones
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn lookup<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl Settings {
    /// Read the environment variables the exporter understands
    ///
    /// `APPEND` and `IMPORT` are enabled only by the exact value `true`.
    /// `MODEL` wins over `MODELS` when both are set.
    pub fn from_env_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| lookup(&env, key);

        Ok(Self {
            database_url: get("DATABASE_URL").map(str::to_string),
            models: get("MODEL").or_else(|| get("MODELS")).map(split_list),
            append: get("APPEND").map(|v| v == "true"),
            batch_size: get("BATCH_SIZE")
                .map(|v| parse_number("BATCH_SIZE", v))
                .transpose()?,
            exclude: get("EXCLUDE").map(split_list),
            file: get("FILE").map(PathBuf::from),
            import: get("IMPORT").map(|v| v == "true"),
            limit: get("LIMIT").map(|v| parse_number("LIMIT", v)).transpose()?,
            scan_order: None,
        })
    }

    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_vars(std::env::vars())
    }

    /// Parse a TOML settings file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidFile {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        toml::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Parse `path` when it exists; an absent file is an empty layer
    pub fn from_file_if_present(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            log::debug!("Loading settings from {}", path.display());
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlay `higher` onto `self`
    pub fn merge(self, higher: Settings) -> Settings {
        Settings {
            database_url: higher.database_url.or(self.database_url),
            models: higher.models.or(self.models),
            append: higher.append.or(self.append),
            batch_size: higher.batch_size.or(self.batch_size),
            exclude: higher.exclude.or(self.exclude),
            file: higher.file.or(self.file),
            import: higher.import.or(self.import),
            limit: higher.limit.or(self.limit),
            scan_order: higher.scan_order.or(self.scan_order),
        }
    }

    /// Apply defaults and validate
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let batch_size = match self.batch_size {
            Some(size) => Some(NonZeroUsize::new(size).ok_or_else(|| ConfigError::ZeroBatchSize {
                key: "batch_size".to_string(),
            })?),
            None => None,
        };

        Ok(RunConfig {
            database_url: self
                .database_url
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            selector: self.models.filter(|models| !models.is_empty()),
            options: EmitOptions {
                limit: self.limit,
                append: self.append.unwrap_or(false),
                batch_size,
                exclude: self
                    .exclude
                    .map(|fields| fields.into_iter().collect::<BTreeSet<_>>()),
                destination: self
                    .file
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION)),
                import_mode: self.import.unwrap_or(false),
            },
            scan_order: self.scan_order.unwrap_or_default(),
        })
    }
}

/// `<config dir>/seeddump/config.toml`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("seeddump").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Settings::default().resolve().unwrap();

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.selector, None);
        assert_eq!(config.options.destination, PathBuf::from("db/seeds.sql"));
        assert!(!config.options.append);
        assert!(!config.options.import_mode);
        assert_eq!(config.options.limit, None);
        assert_eq!(config.options.batch_size, None);
        assert_eq!(config.options.exclude, None);
        assert_eq!(config.scan_order, ScanOrder::Reverse);
    }

    #[test]
    fn test_env_vars() {
        let settings = Settings::from_env_vars([
            ("MODELS", "User, Post,,Comment"),
            ("APPEND", "true"),
            ("BATCH_SIZE", "500"),
            ("EXCLUDE", " id , created_at"),
            ("FILE", "out/seeds.sql"),
            ("IMPORT", "yes"),
            ("LIMIT", "0"),
        ])
        .unwrap();

        assert_eq!(
            settings.models,
            Some(vec!["User".to_string(), "Post".to_string(), "Comment".to_string()])
        );
        assert_eq!(settings.append, Some(true));
        assert_eq!(settings.batch_size, Some(500));
        assert_eq!(settings.exclude, Some(vec!["id".to_string(), "created_at".to_string()]));
        assert_eq!(settings.file, Some(PathBuf::from("out/seeds.sql")));
        assert_eq!(settings.import, Some(false));
        assert_eq!(settings.limit, Some(0));
    }

    #[test]
    fn test_model_wins_over_models() {
        let settings = Settings::from_env_vars([("MODEL", "User"), ("MODELS", "Post")]).unwrap();
        assert_eq!(settings.models, Some(vec!["User".to_string()]));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let err = Settings::from_env_vars([("LIMIT", "ten")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: "LIMIT".into(),
                value: "ten".into()
            }
        );
        assert!(Settings::from_env_vars([("BATCH_SIZE", "-1")]).is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let settings = Settings::from_env_vars([("BATCH_SIZE", "0")]).unwrap();
        assert!(matches!(settings.resolve(), Err(ConfigError::ZeroBatchSize { .. })));
    }

    #[test]
    fn test_merge_precedence() {
        let file = Settings {
            file: Some(PathBuf::from("file.sql")),
            limit: Some(5),
            append: Some(true),
            ..Settings::default()
        };
        let env = Settings {
            limit: Some(10),
            ..Settings::default()
        };
        let flags = Settings {
            append: Some(false),
            ..Settings::default()
        };

        let merged = file.merge(env).merge(flags);
        assert_eq!(merged.file, Some(PathBuf::from("file.sql")));
        assert_eq!(merged.limit, Some(10));
        assert_eq!(merged.append, Some(false));
    }

    #[test]
    fn test_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_url = "sqlite:app.db"
models = ["users", "posts"]
batch_size = 100
exclude = ["password_digest"]
scan_order = "forward"
"#
        )
        .unwrap();

        let config = Settings::from_file(file.path()).unwrap().resolve().unwrap();
        assert_eq!(config.database_url, "sqlite:app.db");
        assert_eq!(config.selector, Some(vec!["users".to_string(), "posts".to_string()]));
        assert_eq!(config.options.batch_size, NonZeroUsize::new(100));
        assert!(config.options.exclude.unwrap().contains("password_digest"));
        assert_eq!(config.scan_order, ScanOrder::Forward);
    }

    #[test]
    fn test_invalid_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limit = \"lots\"").unwrap();
        assert!(matches!(
            Settings::from_file(file.path()),
            Err(ConfigError::InvalidFile { .. })
        ));
    }

    #[test]
    fn test_missing_settings_file_is_empty_layer() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_file_if_present(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
