//! Tool configuration for Berth
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (BERTH_*)
//! 3. Project config (./berth.toml)
//! 4. User config (~/.config/berth/config.toml)
//! 5. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BerthError, BerthResult};

/// Which container engine CLI to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Prefer docker, fall back to podman
    #[default]
    Auto,
    Docker,
    Podman,
}

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine selection
    pub engine: EngineKind,

    /// Default recipe path
    pub file: PathBuf,

    /// Name prefix for containers and built images
    ///
    /// Defaults to the recipe's directory name at invocation time.
    pub project: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineKind::Auto,
            file: PathBuf::from("compose.yaml"),
            project: None,
        }
    }
}

/// Non-fatal configuration warning surfaced to CLI users
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> BerthResult<Self> {
        load_with_warnings(path).map(|(config, _)| config)
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys)
pub fn load_with_warnings(path: &Path) -> BerthResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| BerthError::InvalidConfig {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|key| ConfigWarning {
            key,
            file: path.to_path_buf(),
        })
        .collect();

    Ok((config, warnings))
}

/// Load from project config, user config, or defaults
pub fn load_or_default(project_root: Option<&Path>) -> Config {
    // Try project config first
    if let Some(root) = project_root {
        let project_config = root.join("berth.toml");
        if project_config.exists() {
            if let Ok(config) = Config::load(&project_config) {
                return with_env_overrides(config);
            }
        }
    }

    // Try user config
    if let Some(user_config_dir) = dirs::config_dir() {
        let user_config = user_config_dir.join("berth/config.toml");
        if user_config.exists() {
            if let Ok(config) = Config::load(&user_config) {
                return with_env_overrides(config);
            }
        }
    }

    // Return defaults with env overrides
    with_env_overrides(Config::default())
}

/// Apply environment variable overrides (BERTH_* prefix)
pub fn with_env_overrides(mut config: Config) -> Config {
    // BERTH_ENGINE
    if let Ok(engine) = std::env::var("BERTH_ENGINE") {
        config.engine = match engine.to_lowercase().as_str() {
            "docker" => EngineKind::Docker,
            "podman" => EngineKind::Podman,
            _ => EngineKind::Auto,
        };
    }

    // BERTH_FILE
    if let Ok(file) = std::env::var("BERTH_FILE") {
        if !file.trim().is_empty() {
            config.file = PathBuf::from(file);
        }
    }

    // BERTH_PROJECT
    if let Ok(project) = std::env::var("BERTH_PROJECT") {
        if !project.trim().is_empty() {
            config.project = Some(project);
        }
    }

    config
}

/// Fallback project name: the recipe directory's name, lowercased
///
/// Mirrors what operators expect from compose-style tools; callers pass the
/// directory containing the recipe.
pub fn default_project(root: &Path) -> String {
    root.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_lowercase().replace([' ', '.'], "-"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "berth".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.engine, EngineKind::Auto);
        assert_eq!(config.file, PathBuf::from("compose.yaml"));
        assert!(config.project.is_none());
    }

    #[test]
    fn test_config_load_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "engine = \"podman\"\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.engine, EngineKind::Podman);
        assert_eq!(config.file, PathBuf::from("compose.yaml"));
    }

    #[test]
    fn test_config_load_full() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "engine = \"docker\"\nfile = \"deploy/compose.yaml\"\nproject = \"invoices\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.engine, EngineKind::Docker);
        assert_eq!(config.file, PathBuf::from("deploy/compose.yaml"));
        assert_eq!(config.project, Some("invoices".to_string()));
    }

    #[test]
    fn test_config_unknown_key_warns() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "engine = \"docker\"\nrestart = true\n").unwrap();

        let (config, warnings) = load_with_warnings(file.path()).unwrap();
        assert_eq!(config.engine, EngineKind::Docker);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "restart");
    }

    #[test]
    fn test_config_invalid_toml_fails() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "engine = [broken\n").unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(BerthError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_default_project_from_directory_name() {
        assert_eq!(default_project(Path::new("/srv/Invoice Shop")), "invoice-shop");
        assert_eq!(default_project(Path::new("/")), "berth");
    }
}
