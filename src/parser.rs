//! Recipe loading and validation
//!
//! Reads the orchestration recipe (a compose-file subset) and enforces the
//! structural rules the startup workflow relies on. Unknown keys are not
//! errors - the recipe format is wider than the subset Berth executes - but
//! they are surfaced as warnings so typos don't silently disappear.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BerthError, BerthResult};
use crate::models::ComposeFile;

/// Non-fatal warning about a recipe key Berth does not interpret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeWarning {
    /// Dotted path of the ignored key (e.g. `services.app.restart`)
    pub key: String,
    pub file: PathBuf,
}

/// Load and validate a recipe, discarding unknown-key warnings
pub fn load_recipe(path: &Path) -> BerthResult<ComposeFile> {
    load_recipe_with_warnings(path).map(|(compose, _)| compose)
}

/// Load and validate a recipe, collecting unknown-key warnings
pub fn load_recipe_with_warnings(
    path: &Path,
) -> BerthResult<(ComposeFile, Vec<RecipeWarning>)> {
    if !path.exists() {
        return Err(BerthError::RecipeNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = serde_yaml_ng::Deserializer::from_str(&content);

    let compose: ComposeFile = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| BerthError::InvalidRecipe {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    validate(&compose)?;

    let warnings = unknown_paths
        .into_iter()
        .map(|key| RecipeWarning {
            key,
            file: path.to_path_buf(),
        })
        .collect();

    Ok((compose, warnings))
}

/// Enforce the structural rules of the recipe subset
///
/// - the format version is present and non-empty
/// - at least one service is declared
/// - every service declares exactly one of `build` / `image`
/// - every `depends_on` entry names another service in the recipe
/// - no two services claim the same host port
///
/// Cycle detection lives in `plan::build_plan`, which reports the services
/// involved rather than just a yes/no.
pub fn validate(compose: &ComposeFile) -> BerthResult<()> {
    if compose.version.trim().is_empty() {
        return Err(BerthError::MissingVersion);
    }

    if compose.services.is_empty() {
        return Err(BerthError::NoServices);
    }

    let mut host_ports: BTreeMap<u16, &str> = BTreeMap::new();

    for (name, service) in &compose.services {
        match (&service.build, &service.image) {
            (Some(_), Some(_)) => {
                return Err(BerthError::InvalidService {
                    service: name.clone(),
                    message: "declares both 'build' and 'image'".to_string(),
                });
            }
            (None, None) => {
                return Err(BerthError::InvalidService {
                    service: name.clone(),
                    message: "declares neither 'build' nor 'image'".to_string(),
                });
            }
            _ => {}
        }

        for dependency in &service.depends_on {
            if dependency == name {
                return Err(BerthError::InvalidService {
                    service: name.clone(),
                    message: "depends on itself".to_string(),
                });
            }
            if !compose.services.contains_key(dependency) {
                return Err(BerthError::UnknownDependency {
                    service: name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        for mapping in &service.ports {
            if let Some(first) = host_ports.insert(mapping.host, name.as_str()) {
                if first != name.as_str() {
                    return Err(BerthError::DuplicateHostPort {
                        port: mapping.host,
                        first: first.to_string(),
                        second: name.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}
