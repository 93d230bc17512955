//! Startup ordering
//!
//! Derives the order in which services are started from the recipe's
//! `depends_on` edges. A dependency is started before its dependent; nothing
//! more is promised - no readiness wait, no health semantics. Among services
//! with no ordering relation the order is lexicographic, so plans are
//! deterministic and testable.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BerthError, BerthResult};
use crate::models::ComposeFile;

/// Result of planning a startup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupPlan {
    /// Service names in start order
    pub order: Vec<String>,
}

impl StartupPlan {
    /// Position of a service in the start order
    pub fn position(&self, service: &str) -> Option<usize> {
        self.order.iter().position(|name| name == service)
    }
}

/// Compute the start order for a recipe
///
/// Kahn's algorithm over the dependency edges. Unknown dependencies are
/// reported here as well as in `parser::validate`, so the plan is safe to
/// build from any `ComposeFile`. Leftover services after the sort form a
/// cycle and are reported together.
pub fn build_plan(compose: &ComposeFile) -> BerthResult<StartupPlan> {
    let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, service) in &compose.services {
        indegree.entry(name).or_insert(0);
        for dependency in &service.depends_on {
            if !compose.services.contains_key(dependency) {
                return Err(BerthError::UnknownDependency {
                    service: name.clone(),
                    dependency: dependency.clone(),
                });
            }
            *indegree.entry(name).or_insert(0) += 1;
            dependents.entry(dependency).or_default().push(name);
        }
    }

    // BTreeSet keeps the ready set sorted: ties start lexicographically.
    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(compose.services.len());

    while let Some(name) = ready.iter().next().copied() {
        ready.remove(name);
        order.push(name.to_string());

        if let Some(children) = dependents.get(name) {
            for child in children {
                let degree = indegree.get_mut(child).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(child);
                }
            }
        }
    }

    if order.len() != compose.services.len() {
        let services = indegree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        return Err(BerthError::DependencyCycle { services });
    }

    Ok(StartupPlan { order })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(content: &str) -> ComposeFile {
        serde_yaml_ng::from_str(content).unwrap()
    }

    #[test]
    fn test_plan_dependency_starts_first() {
        let compose = recipe(
            r#"
version: "3"
services:
  app:
    build: .
    depends_on:
      - db
  db:
    image: postgres:16
"#,
        );
        let plan = build_plan(&compose).unwrap();
        assert_eq!(plan.order, vec!["db", "app"]);
        assert!(plan.position("db").unwrap() < plan.position("app").unwrap());
    }

    #[test]
    fn test_plan_independent_services_lexicographic() {
        let compose = recipe(
            r#"
version: "3"
services:
  worker:
    image: worker:latest
  app:
    build: .
  db:
    image: postgres:16
"#,
        );
        let plan = build_plan(&compose).unwrap();
        assert_eq!(plan.order, vec!["app", "db", "worker"]);
    }

    #[test]
    fn test_plan_chain() {
        let compose = recipe(
            r#"
version: "3"
services:
  app:
    build: .
    depends_on:
      - cache
  cache:
    image: redis:7
    depends_on:
      - db
  db:
    image: postgres:16
"#,
        );
        let plan = build_plan(&compose).unwrap();
        assert_eq!(plan.order, vec!["db", "cache", "app"]);
    }

    #[test]
    fn test_plan_cycle_reports_services() {
        let compose = recipe(
            r#"
version: "3"
services:
  a:
    image: a:latest
    depends_on:
      - b
  b:
    image: b:latest
    depends_on:
      - a
  standalone:
    image: s:latest
"#,
        );
        let err = build_plan(&compose).unwrap_err();
        match err {
            BerthError::DependencyCycle { services } => {
                assert_eq!(services, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_unknown_dependency() {
        let compose = recipe(
            r#"
version: "3"
services:
  app:
    build: .
    depends_on:
      - cache
"#,
        );
        assert!(matches!(
            build_plan(&compose),
            Err(BerthError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_plan_duplicate_dependency_edges() {
        // Declaring the same dependency twice is harmless
        let compose = recipe(
            r#"
version: "3"
services:
  app:
    build: .
    depends_on:
      - db
      - db
  db:
    image: postgres:16
"#,
        );
        let plan = build_plan(&compose).unwrap();
        assert_eq!(plan.order, vec!["db", "app"]);
    }
}
