//! Recipe and environment hygiene checks
//!
//! Backs `berth check`: validates the recipe, confirms an engine is
//! available, and audits the credential conventions the recipe relies on -
//! env files present on disk but excluded from version control, no
//! credential-looking values inlined in the recipe itself.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::config::EngineKind;
use crate::engine::detect_engine;
use crate::envfile::parse_env_file;
use crate::parser::load_recipe_with_warnings;

/// Environment keys whose inline values get flagged
const SECRET_KEY_MARKERS: &[&str] = &["PASSWORD", "SECRET", "TOKEN", "APIKEY", "API_KEY"];

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

/// A single check result
#[derive(Debug, Clone)]
pub struct Check {
    /// Check area ("recipe", "engine", "services", "env")
    pub area: String,
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub recommendation: Option<String>,
}

/// Aggregated check results
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub checks: Vec<Check>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, area: &str, name: &str, message: &str) {
        self.push(area, name, CheckStatus::Pass, message, None);
    }

    pub fn add_warning(&mut self, area: &str, name: &str, message: &str, rec: Option<&str>) {
        self.push(area, name, CheckStatus::Warning, message, rec);
    }

    pub fn add_error(&mut self, area: &str, name: &str, message: &str, rec: Option<&str>) {
        self.push(area, name, CheckStatus::Error, message, rec);
    }

    fn push(
        &mut self,
        area: &str,
        name: &str,
        status: CheckStatus,
        message: &str,
        rec: Option<&str>,
    ) {
        self.checks.push(Check {
            area: area.to_string(),
            name: name.to_string(),
            status,
            message: message.to_string(),
            recommendation: rec.map(str::to_string),
        });
    }

    pub fn passes(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count(CheckStatus::Error)
    }

    pub fn is_success(&self) -> bool {
        self.errors() == 0
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

/// Run all checks for the recipe at `file`, rooted at `root`
pub fn run_check(root: &Path, file: &Path, engine_kind: EngineKind) -> CheckReport {
    let mut report = CheckReport::new();

    // Recipe must load before anything else is worth checking.
    let (compose, warnings) = match load_recipe_with_warnings(file) {
        Ok(loaded) => loaded,
        Err(e) => {
            report.add_error(
                "recipe",
                "parse",
                &e.to_string(),
                Some("Fix the recipe and re-run `berth check`"),
            );
            return report;
        }
    };

    report.add_pass(
        "recipe",
        "parse",
        &format!("{} services", compose.services.len()),
    );

    for warning in &warnings {
        report.add_warning(
            "recipe",
            "unknown_key",
            &format!("'{}' is not interpreted by berth", warning.key),
            Some("Remove the key or check its spelling"),
        );
    }

    // Engine availability
    match detect_engine(engine_kind) {
        Some(engine) => {
            report.add_pass("engine", "available", engine.name());
        }
        None => {
            report.add_error(
                "engine",
                "available",
                "no container engine found",
                Some("Install docker or podman, or set `engine` in berth.toml"),
            );
        }
    }

    let gitignore = load_gitignore(root);

    for (name, service) in &compose.services {
        // Build contexts must exist before the engine is invoked on them.
        if let Some(build) = &service.build {
            let context = root.join(build);
            if context.is_dir() {
                report.add_pass("services", name, "build context exists");
            } else {
                report.add_error(
                    "services",
                    name,
                    &format!("build context '{}' not found", build.display()),
                    Some("Fix the 'build' path in the recipe"),
                );
            }
        }

        for mapping in &service.ports {
            if mapping.host < 1024 {
                report.add_warning(
                    "services",
                    name,
                    &format!("host port {} is privileged", mapping.host),
                    Some("Ports below 1024 usually require elevated permissions"),
                );
            }
        }

        // Inline credential-looking values defeat the env-file convention.
        for (key, value) in &service.environment {
            let upper = key.to_uppercase();
            if !value.is_empty() && SECRET_KEY_MARKERS.iter().any(|m| upper.contains(m)) {
                report.add_warning(
                    "env",
                    name,
                    &format!("'{}' looks like a credential inlined in the recipe", key),
                    Some("Move the value to the env file"),
                );
            }
        }

        if let Some(env_file) = &service.env_file {
            check_env_file(root, name, env_file, gitignore.as_ref(), &mut report);
        }
    }

    report
}

fn check_env_file(
    root: &Path,
    service: &str,
    env_file: &Path,
    gitignore: Option<&Gitignore>,
    report: &mut CheckReport,
) {
    let on_disk = root.join(env_file);

    if !on_disk.exists() {
        report.add_error(
            "env",
            service,
            &format!("env file '{}' not found", env_file.display()),
            Some("Create it locally (see .env.example if the project ships one)"),
        );
        return;
    }

    match parse_env_file(&on_disk) {
        Ok(values) => {
            report.add_pass(
                "env",
                service,
                &format!("env file '{}' ({} values)", env_file.display(), values.len()),
            );
        }
        Err(e) => {
            report.add_error("env", service, &e.to_string(), Some("Fix the env file"));
            return;
        }
    }

    // The file must stay out of version control while living on disk.
    match gitignore {
        Some(gitignore) if gitignore.matched(env_file, false).is_ignore() => {}
        Some(_) => {
            report.add_warning(
                "env",
                service,
                &format!(
                    "env file '{}' is not covered by .gitignore",
                    env_file.display()
                ),
                Some("Add it to .gitignore to keep credentials out of version control"),
            );
        }
        None => {
            report.add_warning(
                "env",
                service,
                "no .gitignore found next to the recipe",
                Some("Create one and exclude the env file"),
            );
        }
    }
}

fn load_gitignore(root: &Path) -> Option<Gitignore> {
    let path = root.join(".gitignore");
    if !path.exists() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(root);
    builder.add(path);
    builder.build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BASIC: &str = r#"
version: "3"
services:
  app:
    build: .
    ports:
      - "8080:8080"
    depends_on:
      - db
    env_file: .env
  db:
    image: postgres:16
"#;

    fn project(recipe: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("compose.yaml"), recipe).unwrap();
        dir
    }

    fn check(dir: &TempDir) -> CheckReport {
        run_check(
            dir.path(),
            &dir.path().join("compose.yaml"),
            EngineKind::Auto,
        )
    }

    #[test]
    fn test_check_reports_parse_error_and_stops() {
        let dir = project("version: [broken");
        let report = check(&dir);

        assert_eq!(report.errors(), 1);
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].name, "parse");
    }

    #[test]
    fn test_check_missing_env_file_is_error() {
        let dir = project(BASIC);
        fs::write(dir.path().join(".gitignore"), ".env\n").unwrap();

        let report = check(&dir);
        let env_checks: Vec<_> = report.checks.iter().filter(|c| c.area == "env").collect();
        assert_eq!(env_checks.len(), 1);
        assert_eq!(env_checks[0].status, CheckStatus::Error);
        assert!(env_checks[0].message.contains("not found"));
    }

    #[test]
    fn test_check_env_file_covered_by_gitignore_passes() {
        let dir = project(BASIC);
        fs::write(dir.path().join(".env"), "POSTGRES_PASSWORD=s3cret\n").unwrap();
        fs::write(dir.path().join(".gitignore"), ".env\n").unwrap();

        let report = check(&dir);
        let env_warnings = report
            .checks
            .iter()
            .filter(|c| c.area == "env" && c.status != CheckStatus::Pass)
            .count();
        assert_eq!(env_warnings, 0);
    }

    #[test]
    fn test_check_env_file_not_gitignored_warns() {
        let dir = project(BASIC);
        fs::write(dir.path().join(".env"), "POSTGRES_PASSWORD=s3cret\n").unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n").unwrap();

        let report = check(&dir);
        assert!(report.checks.iter().any(|c| c.status == CheckStatus::Warning
            && c.message.contains("not covered by .gitignore")));
    }

    #[test]
    fn test_check_missing_gitignore_warns() {
        let dir = project(BASIC);
        fs::write(dir.path().join(".env"), "POSTGRES_PASSWORD=s3cret\n").unwrap();

        let report = check(&dir);
        assert!(report
            .checks
            .iter()
            .any(|c| c.status == CheckStatus::Warning && c.message.contains("no .gitignore")));
    }

    #[test]
    fn test_check_inline_credential_warns() {
        let dir = project(
            r#"
version: "3"
services:
  db:
    image: postgres:16
    environment:
      POSTGRES_PASSWORD: hunter2
"#,
        );

        let report = check(&dir);
        assert!(report.checks.iter().any(|c| c.status == CheckStatus::Warning
            && c.message.contains("looks like a credential")));
    }

    #[test]
    fn test_check_privileged_port_warns() {
        let dir = project(
            r#"
version: "3"
services:
  app:
    build: .
    ports:
      - "80:8080"
"#,
        );

        let report = check(&dir);
        assert!(report
            .checks
            .iter()
            .any(|c| c.status == CheckStatus::Warning && c.message.contains("privileged")));
    }

    #[test]
    fn test_check_missing_build_context_is_error() {
        let dir = project(
            r#"
version: "3"
services:
  app:
    build: ./missing
"#,
        );

        let report = check(&dir);
        assert!(report
            .checks
            .iter()
            .any(|c| c.status == CheckStatus::Error && c.message.contains("build context")));
    }

    #[test]
    fn test_check_unknown_recipe_key_warns() {
        let dir = project(
            r#"
version: "3"
services:
  db:
    image: postgres:16
    restart: always
"#,
        );

        let report = check(&dir);
        assert!(report
            .checks
            .iter()
            .any(|c| c.name == "unknown_key" && c.status == CheckStatus::Warning));
    }
}
