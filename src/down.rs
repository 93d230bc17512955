//! Teardown of a recipe's containers
//!
//! The inverse of the startup pass: stop and remove each declared container
//! in reverse start order. Containers that don't exist are reported, not
//! errors - `down` after a partial `up` is the common case.

use crate::engine::{ContainerEngine, EngineOptions};
use crate::error::BerthResult;
use crate::models::ComposeFile;
use crate::plan::build_plan;

/// Result of a teardown pass
#[derive(Debug, Clone, Default)]
pub struct DownResult {
    /// Containers stopped and removed
    pub removed: Vec<String>,
    /// Declared containers that did not exist
    pub missing: Vec<String>,
}

/// Progress notifications emitted while the pass runs
#[derive(Debug, Clone)]
pub enum DownEvent<'a> {
    Remove { service: &'a str, container: &'a str },
    Missing { service: &'a str, container: &'a str },
}

/// Stop and remove the recipe's containers in reverse start order
pub fn run_down(
    compose: &ComposeFile,
    engine: &dyn ContainerEngine,
    project: &str,
    engine_options: &EngineOptions,
    on_event: &mut dyn FnMut(DownEvent<'_>),
) -> BerthResult<DownResult> {
    let plan = build_plan(compose)?;
    let mut result = DownResult::default();

    for name in plan.order.iter().rev() {
        let service = &compose.services[name];
        let container = service.container_ref(project, name);

        if engine.stop_remove(&container, engine_options)? {
            on_event(DownEvent::Remove {
                service: name,
                container: &container,
            });
            result.removed.push(container);
        } else {
            on_event(DownEvent::Missing {
                service: name,
                container: &container,
            });
            result.missing.push(container);
        }
    }

    Ok(result)
}
