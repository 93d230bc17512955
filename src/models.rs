//! Core data models for Berth
//!
//! Defines the fundamental data structures used throughout Berth:
//! - `ComposeFile`: the parsed orchestration recipe
//! - `ServiceDecl`: one named service declaration
//! - `PortMapping`: a `host:container` port pair
//! - `RunSpec`: the engine-facing description of one container run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::BerthError;

/// A `host:container` port mapping
///
/// Serialized as the string form used by the recipe (`"8080:8080"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl FromStr for PortMapping {
    type Err = BerthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| BerthError::InvalidPortMapping {
            value: s.to_string(),
            message: message.to_string(),
        };

        let (host, container) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected 'host:container'"))?;

        let host: u16 = host
            .trim()
            .parse()
            .map_err(|_| invalid("host port is not a number in 1-65535"))?;
        let container: u16 = container
            .trim()
            .parse()
            .map_err(|_| invalid("container port is not a number in 1-65535"))?;

        if host == 0 || container == 0 {
            return Err(invalid("port 0 is not bindable"));
        }

        Ok(PortMapping { host, container })
    }
}

impl TryFrom<String> for PortMapping {
    type Error = BerthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortMapping> for String {
    fn from(mapping: PortMapping) -> Self {
        mapping.to_string()
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

/// One named service declaration in the orchestration recipe
///
/// Exactly one of `build` / `image` must be set; `parser::validate` enforces
/// this. Environment values are strings only - the recipe subset does not
/// interpolate or coerce scalars.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceDecl {
    /// Path to a build context, relative to the recipe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<PathBuf>,

    /// Prebuilt image reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Explicit container name (defaults to `<project>-<service>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    /// Host-to-container port mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortMapping>,

    /// Services that must be started before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Environment key/value pairs passed to the container
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Local environment-variable file merged beneath `environment`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
}

impl ServiceDecl {
    /// Image reference to run: the declared image, or the tag `berth build`
    /// gives images built from a `build:` context.
    pub fn image_ref(&self, project: &str, name: &str) -> String {
        self.image
            .clone()
            .unwrap_or_else(|| format!("{}-{}", project, name))
    }

    /// Container name: the declared `container_name`, or `<project>-<service>`.
    pub fn container_ref(&self, project: &str, name: &str) -> String {
        self.container_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", project, name))
    }
}

/// The parsed orchestration recipe
///
/// `services` is a `BTreeMap` so iteration order (and everything derived from
/// it, like plans) is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    /// Format-version tag; required by the format, recorded, not interpreted
    pub version: String,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceDecl>,
}

/// Engine-facing description of one container run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    /// Container name
    pub name: String,
    /// Image reference
    pub image: String,
    /// Host-to-container port mappings
    pub ports: Vec<PortMapping>,
    /// Environment values, already merged (env file beneath explicit pairs)
    pub env: BTreeMap<String, String>,
}

impl RunSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ports: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}
