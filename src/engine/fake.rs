//! Scriptable in-memory engine
//!
//! Records every invocation and lets tests script pre-existing containers
//! and failures, so workflow behavior (ordering, conflicts, abort-on-first-
//! failure) can be exercised without a container engine installed.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use super::{ContainerEngine, EngineError, EngineOptions};
use crate::models::RunSpec;

/// In-memory engine double
#[derive(Debug, Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<String>>,
    run_specs: Mutex<Vec<RunSpec>>,
    existing: Mutex<BTreeSet<String>>,
    failing_builds: Mutex<BTreeSet<String>>,
    failing_runs: Mutex<BTreeSet<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a container with this name already exists
    pub fn with_existing(self, container: &str) -> Self {
        self.existing.lock().unwrap().insert(container.to_string());
        self
    }

    /// Script a build failure for this image
    pub fn failing_build(self, image: &str) -> Self {
        self.failing_builds.lock().unwrap().insert(image.to_string());
        self
    }

    /// Script a run failure for this container name
    pub fn failing_run(self, container: &str) -> Self {
        self.failing_runs.lock().unwrap().insert(container.to_string());
        self
    }

    /// Every invocation so far, in order, as `action subject` strings
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every run spec handed to `run`, in order
    pub fn run_specs(&self) -> Vec<RunSpec> {
        self.run_specs.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn failed(&self, action: &'static str, subject: &str) -> EngineError {
        EngineError::CommandFailed {
            program: "fake".to_string(),
            action,
            subject: subject.to_string(),
            code: Some(1),
        }
    }
}

impl ContainerEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn build(
        &self,
        image: &str,
        context: &Path,
        _options: &EngineOptions,
    ) -> Result<(), EngineError> {
        self.record(format!("build {} {}", image, context.display()));
        if self.failing_builds.lock().unwrap().contains(image) {
            return Err(self.failed("build", image));
        }
        Ok(())
    }

    fn run(&self, spec: &RunSpec, _options: &EngineOptions) -> Result<(), EngineError> {
        self.record(format!("run {} {}", spec.name, spec.image));
        self.run_specs.lock().unwrap().push(spec.clone());
        if self.failing_runs.lock().unwrap().contains(&spec.name) {
            return Err(self.failed("run", &spec.name));
        }
        self.existing.lock().unwrap().insert(spec.name.clone());
        Ok(())
    }

    fn run_attached(&self, spec: &RunSpec) -> Result<(), EngineError> {
        self.record(format!("run-attached {} {}", spec.name, spec.image));
        if self.failing_runs.lock().unwrap().contains(&spec.name) {
            return Err(self.failed("run", &spec.name));
        }
        Ok(())
    }

    fn exists(&self, container: &str) -> Result<bool, EngineError> {
        Ok(self.existing.lock().unwrap().contains(container))
    }

    fn stop_remove(
        &self,
        container: &str,
        _options: &EngineOptions,
    ) -> Result<bool, EngineError> {
        let existed = self.existing.lock().unwrap().remove(container);
        if existed {
            self.record(format!("remove {}", container));
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_engine_records_calls_in_order() {
        let engine = FakeEngine::new();
        let options = EngineOptions::default();

        engine.build("shop-app", Path::new("."), &options).unwrap();
        engine.run(&RunSpec::new("shop-db", "postgres:16"), &options).unwrap();

        assert_eq!(engine.calls(), vec!["build shop-app .", "run shop-db postgres:16"]);
    }

    #[test]
    fn fake_engine_run_creates_container() {
        let engine = FakeEngine::new();
        let options = EngineOptions::default();

        assert!(!engine.exists("shop-db").unwrap());
        engine.run(&RunSpec::new("shop-db", "postgres:16"), &options).unwrap();
        assert!(engine.exists("shop-db").unwrap());

        assert!(engine.stop_remove("shop-db", &options).unwrap());
        assert!(!engine.exists("shop-db").unwrap());
        assert!(!engine.stop_remove("shop-db", &options).unwrap());
    }

    #[test]
    fn fake_engine_scripted_failures() {
        let engine = FakeEngine::new().failing_build("shop-app");
        let options = EngineOptions::default();

        assert!(engine.build("shop-app", Path::new("."), &options).is_err());
        assert!(engine.build("shop-admin", Path::new("."), &options).is_ok());
    }
}
