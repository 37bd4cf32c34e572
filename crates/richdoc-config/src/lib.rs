use richdoc_engine::Document;
use richdoc_engine::document::DocumentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Editor settings stored in `config.toml`.
///
/// Every section is optional in the file; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Loads the user's config, falling back to defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/richdoc");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// An empty document that follows these settings.
    pub fn new_document(&self) -> Document {
        Document::with_config(self.document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use richdoc_engine::DocumentError;
    use richdoc_engine::document::{DocumentNode, InsertPolicy};
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/richdoc/config.toml"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/dir/config.toml");
        let test_config = Config {
            document: DocumentConfig {
                insert_policy: InsertPolicy::Clamp,
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.document.insert_policy, InsertPolicy::Reject);

        let config: Config = toml::from_str("[document]\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_insert_policy_in_toml() {
        let config_content = r#"
[document]
insert_policy = "clamp"
"#;

        let config: Config = toml::from_str(config_content).unwrap();
        assert_eq!(config.document.insert_policy, InsertPolicy::Clamp);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[document]\ninsert_policy = \"sideways\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_new_document_follows_insert_policy() {
        let clamping = Config {
            document: DocumentConfig {
                insert_policy: InsertPolicy::Clamp,
            },
        };
        let mut doc = clamping.new_document();
        doc.insert_node_at(5, DocumentNode::paragraph("end")).unwrap();
        assert_eq!(doc.len(), 1);

        let mut doc = Config::default().new_document();
        assert_eq!(
            doc.insert_node_at(5, DocumentNode::paragraph("end")),
            Err(DocumentError::IndexOutOfBounds { index: 5, len: 0 })
        );
    }
}
