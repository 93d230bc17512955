//! Berth - compose-style startup workflow for small container projects
//!
//! Berth reads a static orchestration recipe (a compose-file subset),
//! validates it, and brings the declared services up in dependency order by
//! driving a container engine CLI. It is a sequencer, not an orchestrator:
//! one pass, no readiness probing, no restart policy, failures surfaced
//! directly to the operator.

pub mod config;
pub mod conflict;
pub mod down;
pub mod engine;
pub mod envfile;
pub mod error;
pub mod models;
pub mod parser;
pub mod plan;
pub mod security;
pub mod up;

// Re-exports for convenience
pub use config::{Config, EngineKind};
pub use conflict::{AutoResolver, ConflictChoice, ConflictResolver, InteractiveResolver};
pub use down::{run_down, DownResult};
pub use engine::{detect_engine, CliEngine, ContainerEngine, EngineError, EngineOptions};
pub use error::{BerthError, BerthResult};
pub use models::{ComposeFile, PortMapping, RunSpec, ServiceDecl};
pub use parser::{load_recipe, load_recipe_with_warnings, RecipeWarning};
pub use plan::{build_plan, StartupPlan};
pub use security::{run_check, CheckReport, CheckStatus};
pub use up::{run_up, UpEvent, UpOptions, UpResult};
