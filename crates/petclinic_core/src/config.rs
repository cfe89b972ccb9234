//! Process configuration.
//!
//! # Responsibility
//! - Parse `petclinic.toml` into [`ClinicConfig`], defaulting every field.
//! - Resolve the storage profile, letting `PETCLINIC_PROFILE` override it.
//!
//! # Invariants
//! - An unknown profile name fails at load time, before any repository is
//!   bound.

use crate::db::{open_db, open_db_in_memory, DbResult};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable that replaces the configured profile.
pub const PROFILE_ENV: &str = "PETCLINIC_PROFILE";

/// Storage strategy bound for the whole process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Profile {
    /// Hand-written statements with manual aggregate assembly.
    #[default]
    Raw,
    /// Entity manager with a persistence context.
    Managed,
    /// Generated CRUD with overridden deletes and a read cache.
    Convention,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Raw, Profile::Managed, Profile::Convention];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Managed => "managed",
            Self::Convention => "convention",
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "managed" => Ok(Self::Managed),
            "convention" => Ok(Self::Convention),
            _ => Err(ConfigError::UnknownProfile(value.to_string())),
        }
    }
}

impl TryFrom<String> for Profile {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    UnknownProfile(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::UnknownProfile(name) => write!(
                f,
                "unknown storage profile `{name}`; expected raw|managed|convention"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::UnknownProfile(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClinicConfig {
    pub profile: Profile,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Defaults to the build-mode level when unset.
    pub level: Option<String>,
    /// Logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl ClinicConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads `path` and applies the `PETCLINIC_PROFILE` override.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)?.with_profile_override(std::env::var(PROFILE_ENV).ok())
    }

    /// Defaults plus the `PETCLINIC_PROFILE` override, for runs without a file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_profile_override(std::env::var(PROFILE_ENV).ok())
    }

    /// Replaces the profile when `value` is set and non-blank.
    pub fn with_profile_override(mut self, value: Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
            self.profile = value.parse()?;
        }
        Ok(self)
    }

    /// Opens the configured database with migrations applied.
    pub fn open_database(&self) -> DbResult<Connection> {
        match &self.database.path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}
