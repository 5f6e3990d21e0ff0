use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiblioConfig {
    /// Directory holding the stored library image
    pub data_dir: PathBuf,
    pub google_books_url: String,
    pub open_library_url: String,
    pub lookup_timeout_secs: u64,
    pub author_timeout_secs: u64,
}

impl Default for BiblioConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            google_books_url: "https://www.googleapis.com/books/v1".to_string(),
            open_library_url: "https://openlibrary.org".to_string(),
            lookup_timeout_secs: 5,
            author_timeout_secs: 3,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("biblipartage.toml")
}

pub fn default_data_dir() -> PathBuf {
    PathBuf::from(".biblipartage")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BiblioConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: BiblioConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BiblioConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_data_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biblipartage.toml");
        std::fs::write(&path, "data_dir = \"/srv/books\"\nlookup_timeout_secs = 9\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/books"));
        assert_eq!(config.lookup_timeout_secs, 9);
        assert_eq!(config.author_timeout_secs, 3);
        assert_eq!(config.open_library_url, "https://openlibrary.org");
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biblipartage.toml");
        let config = BiblioConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        assert_eq!(load_config(Some(&path)).unwrap().unwrap(), config);
    }

    #[test]
    fn test_ensure_data_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("a").join("b");
        ensure_data_dir(&data).unwrap();
        assert!(data.is_dir());
    }
}
