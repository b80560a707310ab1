use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{RepoError, Result};

pub const CONFIG_FILE_NAME: &str = "repokit.toml";

/// Storage backend the CLI wires a repository to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Sqlite,
    Document,
}

impl FromStr for Backend {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "document" => Ok(Self::Document),
            other => Err(RepoError::Config(format!(
                "unknown backend {other:?}; expected memory, sqlite or document"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Document => "document",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    pub backend: Backend,
    /// SQLite database file; an in-memory database when unset.
    pub sqlite_path: Option<PathBuf>,
    pub table: String,
    pub collection: String,
    /// Identity field override; the model's own identity field when unset.
    pub primary_key: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            sqlite_path: None,
            table: "users".to_string(),
            collection: "users".to_string(),
            primary_key: None,
            log_dir: None,
            log_level: None,
        }
    }
}

impl RepoConfig {
    /// # Errors
    /// Returns `RepoError::Config` when the text is not valid TOML for this shape.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RepoError::Config(e.to_string()))
    }

    /// # Errors
    /// Returns `RepoError::Io` when the file cannot be read and `RepoError::Config` when
    /// it does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RepoError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))
    }

    /// Config file locations in lookup order: explicit path, `REPOKIT_CONFIG`, the user
    /// config directory, then the working directory.
    #[must_use]
    pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(p) = explicit {
            paths.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("REPOKIT_CONFIG") {
            paths.push(PathBuf::from(p));
        }
        if let Some(dir) = dirs_next::config_dir() {
            paths.push(dir.join(CONFIG_FILE_NAME));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Loads the first config file found, then applies environment overrides.
    ///
    /// # Errors
    /// An explicitly requested file that does not exist is an error; so is any file
    /// that exists but does not parse, and any malformed environment override.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit
            && !p.exists()
        {
            return Err(RepoError::Config(format!("config file not found: {}", p.display())));
        }
        let mut cfg = Self::candidate_paths(explicit)
            .into_iter()
            .find(|p| p.is_file())
            .map_or_else(|| Ok(Self::default()), |p| {
                log::debug!("loading config from {}", p.display());
                Self::from_file(&p)
            })?;
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Applies `REPOKIT_BACKEND`, `REPOKIT_SQLITE_PATH` and `REPOKIT_TABLE` from `lookup`.
    ///
    /// # Errors
    /// Returns `RepoError::Config` for an unknown backend name.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(b) = lookup("REPOKIT_BACKEND") {
            self.backend = b.parse()?;
        }
        if let Some(p) = lookup("REPOKIT_SQLITE_PATH") {
            self.sqlite_path = Some(PathBuf::from(p));
        }
        if let Some(t) = lookup("REPOKIT_TABLE") {
            self.table = t;
        }
        Ok(())
    }
}
