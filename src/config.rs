//! Configuration management for model generation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (swagger-models.toml)
//! - Environment variables (SWAGGER_MODELS__*)
//!
//! ## Example config file (swagger-models.toml):
//! ```toml
//! [input]
//! swagger = "./swagger.json"
//!
//! [filter]
//! include_tags = ["Pets", "Store"]
//! exclude_tags = []
//! ignore_unused_models = true
//! default_tag = "Api"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Main configuration for a generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Where the contract comes from
    #[serde(default)]
    pub input: InputConfig,

    /// Operation group selection and model pruning
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    /// Path to the Swagger 2.0 JSON document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger: Option<PathBuf>,
}

/// Tag selection over operation groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Groups to keep. Empty keeps every group.
    #[serde(default)]
    pub include_tags: Vec<String>,

    /// Groups to drop. Empty drops none.
    #[serde(default)]
    pub exclude_tags: Vec<String>,

    /// Remove models no retained group reaches
    #[serde(default = "default_true")]
    pub ignore_unused_models: bool,

    /// Group for operations without tags
    #[serde(default = "default_tag")]
    pub default_tag: String,
}

fn default_true() -> bool {
    true
}

fn default_tag() -> String {
    "Api".to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            ignore_unused_models: true,
            default_tag: default_tag(),
        }
    }
}

impl FilterConfig {
    /// Keep only the given groups.
    pub fn including<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Drop the given groups.
    pub fn excluding<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` layered over the default
    /// locations and environment variables over everything.
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "swagger-models.toml",
            ".swagger-models.toml",
            "config/swagger-models.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "swagger-models", "swagger-models") {
            let xdg_config = config_dir.config_dir().join("swagger-models.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SWAGGER_MODELS__FILTER__INCLUDE_TAGS=Pets,Store
        builder = builder.add_source(
            Environment::with_prefix("SWAGGER_MODELS")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("filter.include_tags")
                .with_list_parse_key("filter.exclude_tags")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert!(config.filter.ignore_unused_models);
        assert_eq!(config.filter.default_tag, "Api");
        assert!(config.filter.include_tags.is_empty());
        assert!(config.input.swagger.is_none());
    }

    #[test]
    fn test_serialize_config() {
        let config = GeneratorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[filter]"));
        assert!(toml_str.contains("default_tag = \"Api\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[input]\nswagger = \"api/swagger.json\"\n\n[filter]\ninclude_tags = [\"Pets\"]\nignore_unused_models = false"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = GeneratorConfig::load_from(Some(&path)).unwrap();

        assert_eq!(config.input.swagger, Some(PathBuf::from("api/swagger.json")));
        assert_eq!(config.filter.include_tags, vec!["Pets".to_string()]);
        assert!(!config.filter.ignore_unused_models);
        assert_eq!(config.filter.default_tag, "Api");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(GeneratorConfig::load_from(path.to_str()).is_err());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let config = GeneratorConfig {
            filter: FilterConfig::default().excluding(["Admin"]),
            ..GeneratorConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = GeneratorConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.filter.exclude_tags, vec!["Admin".to_string()]);
    }
}
