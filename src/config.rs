//! Configuration loading.
//!
//! Settings come from an optional TOML file; every field has a default so a
//! partial file (or none at all) is fine. Command-line flags override the
//! file afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OrganizerError, Result};

/// Library configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the organized library (`<library>/<Artist>/<Artist - Title.ext>`).
    pub library_dir: PathBuf,
    /// Where downloads land before organization.
    pub downloads_dir: PathBuf,
    /// SQLite database URL for schema migrations.
    pub database_url: String,
    /// Upper bound on simultaneous downloads.
    pub max_concurrent_downloads: usize,
    /// Embed title/artist/year/thumbnail tags into downloaded files.
    pub embed_tags: bool,
    /// Delete byte-identical duplicates from the downloads directory.
    pub remove_duplicates: bool,
    /// IMVDb application key.
    pub imvdb_app_key: Option<String>,
    /// Recorded as `applied_by` on migrations.
    pub applied_by: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("library"),
            downloads_dir: PathBuf::from("downloads"),
            database_url: "sqlite://mvorg.db".to_string(),
            max_concurrent_downloads: 3,
            embed_tags: true,
            remove_duplicates: true,
            imvdb_app_key: None,
            applied_by: "mvorg".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load from `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_downloads == 0 {
            return Err(OrganizerError::Config(
                "max_concurrent_downloads must be at least 1".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(OrganizerError::Config(
                "database_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_concurrent_downloads, 3);
        assert!(config.embed_tags);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            library_dir = "/media/videos"
            max_concurrent_downloads = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/media/videos"));
        assert_eq!(config.max_concurrent_downloads, 5);
        assert_eq!(config.downloads_dir, PathBuf::from("downloads"));
        assert_eq!(config.imvdb_app_key, None);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = Config::from_toml("max_concurrent_downloads = 0").unwrap_err();
        assert!(matches!(err, OrganizerError::Config(_)));
    }

    #[test]
    fn test_malformed_file() {
        let err = Config::from_toml("library_dir = [").unwrap_err();
        assert!(matches!(err, OrganizerError::TomlError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mvorg.toml");
        fs::write(&path, "embed_tags = false\napplied_by = \"admin\"\n").unwrap();

        let config = Config::load_or_default(Some(&path)).unwrap();
        assert!(!config.embed_tags);
        assert_eq!(config.applied_by, "admin");
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
