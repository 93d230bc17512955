//! Engine CLI adapter
//!
//! Drives `docker` or `podman` through `std::process::Command`. The two CLIs
//! share the argument surface Berth needs, so one adapter covers both.
//! Argument construction is kept separate from execution so it can be unit
//! tested without an engine installed.

use std::path::Path;
use std::process::{Command, Stdio};

use super::{ContainerEngine, EngineError, EngineOptions};
use crate::models::RunSpec;

/// Engine adapter shelling out to a container CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliEngine {
    program: &'static str,
}

impl CliEngine {
    pub const DOCKER: CliEngine = CliEngine { program: "docker" };
    pub const PODMAN: CliEngine = CliEngine { program: "podman" };

    /// Check if the engine binary is installed and responding
    pub fn check_available(program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn build_args(image: &str, context: &Path) -> Vec<String> {
        vec![
            "build".to_string(),
            "-t".to_string(),
            image.to_string(),
            context.display().to_string(),
        ]
    }

    fn run_args(spec: &RunSpec, detach: bool) -> Vec<String> {
        let mut args = vec!["run".to_string()];
        if detach {
            args.push("-d".to_string());
        }
        args.push("--name".to_string());
        args.push(spec.name.clone());
        for mapping in &spec.ports {
            args.push("-p".to_string());
            args.push(mapping.to_string());
        }
        for (key, value) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(spec.image.clone());
        args
    }

    fn status(
        &self,
        args: &[String],
        action: &'static str,
        subject: &str,
        options: &EngineOptions,
    ) -> Result<(), EngineError> {
        let mut cmd = Command::new(self.program);
        cmd.args(args);

        // Stderr always reaches the operator: failures surface directly,
        // with no recovery attempted on Berth's side.
        if options.quiet {
            cmd.stdout(Stdio::null());
        } else {
            cmd.stdout(Stdio::inherit());
        }
        cmd.stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| EngineError::Spawn {
            program: self.program.to_string(),
            source: e,
        })?;

        if !status.success() {
            return Err(EngineError::CommandFailed {
                program: self.program.to_string(),
                action,
                subject: subject.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

impl ContainerEngine for CliEngine {
    fn name(&self) -> &'static str {
        self.program
    }

    fn is_available(&self) -> bool {
        Self::check_available(self.program)
    }

    fn build(
        &self,
        image: &str,
        context: &Path,
        options: &EngineOptions,
    ) -> Result<(), EngineError> {
        let args = Self::build_args(image, context);
        self.status(&args, "build", image, options)
    }

    fn run(&self, spec: &RunSpec, options: &EngineOptions) -> Result<(), EngineError> {
        let args = Self::run_args(spec, true);
        // The detached run prints a container id; the name is Berth's handle,
        // so the id is noise outside of verbose inspection.
        self.status(&args, "run", &spec.name, options)
    }

    fn run_attached(&self, spec: &RunSpec) -> Result<(), EngineError> {
        let args = Self::run_args(spec, false);
        let status = Command::new(self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| EngineError::Spawn {
                program: self.program.to_string(),
                source: e,
            })?;

        if !status.success() {
            return Err(EngineError::CommandFailed {
                program: self.program.to_string(),
                action: "run",
                subject: spec.name.clone(),
                code: status.code(),
            });
        }

        Ok(())
    }

    fn exists(&self, container: &str) -> Result<bool, EngineError> {
        let status = Command::new(self.program)
            .args(["container", "inspect", container])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| EngineError::Spawn {
                program: self.program.to_string(),
                source: e,
            })?;

        Ok(status.success())
    }

    fn stop_remove(
        &self,
        container: &str,
        options: &EngineOptions,
    ) -> Result<bool, EngineError> {
        if !self.exists(container)? {
            return Ok(false);
        }
        let args = vec!["rm".to_string(), "-f".to_string(), container.to_string()];
        self.status(&args, "remove", container, options)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortMapping;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn test_build_args() {
        let args = CliEngine::build_args("shop-app", &PathBuf::from("."));
        assert_eq!(args, vec!["build", "-t", "shop-app", "."]);
    }

    #[test]
    fn test_run_args_detached() {
        let mut env = BTreeMap::new();
        env.insert("POSTGRES_DB".to_string(), "invoices".to_string());

        let spec = RunSpec {
            name: "shop-db".to_string(),
            image: "postgres:16".to_string(),
            ports: vec![PortMapping {
                host: 5432,
                container: 5432,
            }],
            env,
        };

        let args = CliEngine::run_args(&spec, true);
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--name",
                "shop-db",
                "-p",
                "5432:5432",
                "-e",
                "POSTGRES_DB=invoices",
                "postgres:16",
            ]
        );
    }

    #[test]
    fn test_run_args_attached_omits_detach_flag() {
        let spec = RunSpec::new("shop-app", "shop-app");
        let args = CliEngine::run_args(&spec, false);
        assert_eq!(args, vec!["run", "--name", "shop-app", "shop-app"]);
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(CliEngine::DOCKER.name(), "docker");
        assert_eq!(CliEngine::PODMAN.name(), "podman");
    }

    #[test]
    fn check_available_does_not_panic() {
        let _ = CliEngine::check_available("docker");
    }
}
