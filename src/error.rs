//! Error types for Berth
//!
//! Uses `thiserror` for library errors; binaries wrap these in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

/// Result type alias for Berth operations
pub type BerthResult<T> = Result<T, BerthError>;

/// Main error type for Berth operations
#[derive(Error, Debug)]
pub enum BerthError {
    /// Orchestration recipe file does not exist
    #[error("recipe not found: {path}")]
    RecipeNotFound { path: PathBuf },

    /// Recipe failed to parse as YAML
    #[error("invalid recipe in {file}: {message}")]
    InvalidRecipe { file: PathBuf, message: String },

    /// Recipe parsed but declares no services
    #[error("recipe declares no services")]
    NoServices,

    /// Recipe parsed but carries no format version
    #[error("recipe is missing a format version")]
    MissingVersion,

    /// A service declaration violates a structural rule
    #[error("service '{service}': {message}")]
    InvalidService { service: String, message: String },

    /// A port mapping string could not be parsed
    #[error("invalid port mapping '{value}': {message}")]
    InvalidPortMapping { value: String, message: String },

    /// A `depends_on` entry names a service not in the recipe
    #[error("service '{service}' depends on unknown service '{dependency}'")]
    UnknownDependency { service: String, dependency: String },

    /// Dependency edges form a cycle
    #[error("dependency cycle involving: {}", services.join(", "))]
    DependencyCycle { services: Vec<String> },

    /// Two services claim the same host port
    #[error("host port {port} is claimed by both '{first}' and '{second}'")]
    DuplicateHostPort {
        port: u16,
        first: String,
        second: String,
    },

    /// A referenced environment file does not exist
    #[error("env file not found: {path}")]
    EnvFileNotFound { path: PathBuf },

    /// A line in an environment file is malformed
    #[error("invalid env file {file}:{line}: {message}")]
    EnvFile {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Tool configuration failed to parse
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Neither docker nor podman is on PATH
    #[error("no container engine found - install docker or podman, or set `engine` in berth.toml")]
    EngineUnavailable,

    /// A container with the target name already exists
    #[error("container '{container}' already exists - use --force to replace it")]
    ContainerExists { container: String },

    /// The engine CLI failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Startup pass was aborted by the user at a conflict prompt
    #[error("up aborted by user")]
    UpAborted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
