//! The startup workflow
//!
//! A single pass: plan the start order, build what needs building, then
//! launch one detached container per declaration. "Started" means the
//! engine's run invocation succeeded - there is no readiness probing, no
//! retry, and no rollback. The first failure aborts the pass and services
//! already started are left running for manual inspection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::conflict::{ConflictChoice, ConflictContext, ConflictResolver};
use crate::engine::{ContainerEngine, EngineOptions};
use crate::envfile::parse_env_file;
use crate::error::{BerthError, BerthResult};
use crate::models::{ComposeFile, RunSpec, ServiceDecl};
use crate::plan::build_plan;

/// Options for a startup pass
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Name prefix for containers and built images
    pub project: String,
    /// Directory the recipe lives in; build contexts and env files resolve
    /// against it
    pub root: PathBuf,
    /// Output routing for engine invocations
    pub engine_options: EngineOptions,
}

/// One service the pass started
#[derive(Debug, Clone, Serialize)]
pub struct StartedService {
    pub service: String,
    pub container: String,
    pub image: String,
    pub started_at: DateTime<Utc>,
}

/// Result of a completed startup pass
#[derive(Debug, Clone, Default)]
pub struct UpResult {
    pub started: Vec<StartedService>,
    /// Services skipped at a conflict prompt
    pub skipped: Vec<String>,
}

/// Progress notifications emitted while the pass runs
///
/// The pass streams these before acting, so the operator sees what is about
/// to happen even when a later step aborts.
#[derive(Debug, Clone)]
pub enum UpEvent<'a> {
    Plan { order: &'a [String] },
    Build { service: &'a str, image: &'a str },
    Replace { service: &'a str, container: &'a str },
    Skip { service: &'a str, container: &'a str },
    Start { service: &'a str, container: &'a str, image: &'a str },
}

/// Resolve a service's environment: env file values beneath explicit pairs
pub fn service_env(
    service: &ServiceDecl,
    root: &Path,
) -> BerthResult<BTreeMap<String, String>> {
    let mut env = match &service.env_file {
        Some(env_file) => parse_env_file(&root.join(env_file))?,
        None => BTreeMap::new(),
    };
    for (key, value) in &service.environment {
        env.insert(key.clone(), value.clone());
    }
    Ok(env)
}

/// Assemble the engine-facing run spec for one service
pub fn run_spec(
    name: &str,
    service: &ServiceDecl,
    options: &UpOptions,
) -> BerthResult<RunSpec> {
    Ok(RunSpec {
        name: service.container_ref(&options.project, name),
        image: service.image_ref(&options.project, name),
        ports: service.ports.clone(),
        env: service_env(service, &options.root)?,
    })
}

/// Run the startup workflow
///
/// `resolver` handles existing-container conflicts; pass `None` for
/// non-interactive runs, where a conflict is a hard error pointing at
/// `--force`.
pub fn run_up(
    compose: &ComposeFile,
    engine: &dyn ContainerEngine,
    resolver: Option<&dyn ConflictResolver>,
    options: &UpOptions,
    on_event: &mut dyn FnMut(UpEvent<'_>),
) -> BerthResult<UpResult> {
    let plan = build_plan(compose)?;
    on_event(UpEvent::Plan { order: &plan.order });

    // Build phase: everything with a build context, in start order. A build
    // failure aborts before any container is launched.
    for name in &plan.order {
        let service = &compose.services[name];
        if let Some(build) = &service.build {
            let image = service.image_ref(&options.project, name);
            on_event(UpEvent::Build {
                service: name,
                image: &image,
            });
            engine.build(&image, &options.root.join(build), &options.engine_options)?;
        }
    }

    // Run phase: one detached container per declaration, dependencies first.
    let mut result = UpResult::default();

    for name in &plan.order {
        let service = &compose.services[name];
        let spec = run_spec(name, service, options)?;

        if engine.exists(&spec.name)? {
            let choice = match resolver {
                Some(resolver) => resolver.resolve(&ConflictContext {
                    service: name,
                    container: &spec.name,
                }),
                None => {
                    return Err(BerthError::ContainerExists {
                        container: spec.name,
                    });
                }
            };

            match choice {
                ConflictChoice::Replace | ConflictChoice::ReplaceAll => {
                    on_event(UpEvent::Replace {
                        service: name,
                        container: &spec.name,
                    });
                    engine.stop_remove(&spec.name, &options.engine_options)?;
                }
                ConflictChoice::Skip | ConflictChoice::SkipAll => {
                    on_event(UpEvent::Skip {
                        service: name,
                        container: &spec.name,
                    });
                    result.skipped.push(name.clone());
                    continue;
                }
                ConflictChoice::Abort => return Err(BerthError::UpAborted),
            }
        }

        on_event(UpEvent::Start {
            service: name,
            container: &spec.name,
            image: &spec.image,
        });
        engine.run(&spec, &options.engine_options)?;

        result.started.push(StartedService {
            service: name.clone(),
            container: spec.name,
            image: spec.image,
            started_at: Utc::now(),
        });
    }

    Ok(result)
}
