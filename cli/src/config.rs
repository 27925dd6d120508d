use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const DB_FILE: &str = "macromate.db";
const CONFIG_FILE: &str = "config.json";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub backend_url: String,
}

/// Optional settings file in the data directory.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    backend_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "macromate")
            .context("Could not determine data directory")?;
        let data_dir = dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;

        Self::from_dir(
            &data_dir,
            std::env::var("MACROMATE_DB").ok(),
            std::env::var("MACROMATE_BACKEND_URL").ok(),
        )
    }

    /// Resolve settings for `data_dir`. Explicit overrides win over
    /// `config.json`, which wins over the defaults.
    pub fn from_dir(
        data_dir: &Path,
        db_override: Option<String>,
        backend_override: Option<String>,
    ) -> Result<Self> {
        let file = read_file_config(&data_dir.join(CONFIG_FILE))?;

        let db_path = db_override
            .filter(|p| !p.trim().is_empty())
            .map_or_else(|| data_dir.join(DB_FILE), PathBuf::from);

        let backend_url = backend_override
            .or(file.backend_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            anyhow::bail!("Invalid backend URL '{backend_url}'. It must start with http:// or https://");
        }

        Ok(Self {
            db_path,
            data_dir: data_dir.to_path_buf(),
            backend_url,
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_dir(dir.path(), None, None).unwrap();
        assert_eq!(config.db_path, dir.path().join("macromate.db"));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_config_file_backend_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"backend_url": "http://10.0.0.5:5000/"}"#,
        )
        .unwrap();
        let config = Config::from_dir(dir.path(), None, None).unwrap();
        assert_eq!(config.backend_url, "http://10.0.0.5:5000");
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"backend_url": "http://10.0.0.5:5000"}"#,
        )
        .unwrap();
        let config = Config::from_dir(
            dir.path(),
            Some("/tmp/other.db".to_string()),
            Some("https://macromate.example.com".to_string()),
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.backend_url, "https://macromate.example.com");
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "not json").unwrap();
        assert!(Config::from_dir(dir.path(), None, None).is_err());
    }

    #[test]
    fn test_invalid_backend_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_dir(dir.path(), None, Some("localhost:5000".to_string()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("http://"));
    }
}
