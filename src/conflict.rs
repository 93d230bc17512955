//! Existing-container conflict resolution
//!
//! A startup pass never destroys an existing container without an explicit
//! operator decision: replace it, skip the service, or abort the pass.

use std::io::{self, Write};
use std::sync::Mutex;

/// Operator decision for one conflicting container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Replace,
    Skip,
    Abort,
    ReplaceAll,
    SkipAll,
}

/// Context for a conflict prompt
#[derive(Debug, Clone)]
pub struct ConflictContext<'a> {
    pub service: &'a str,
    pub container: &'a str,
}

/// Strategy for resolving existing-container conflicts
pub trait ConflictResolver {
    fn resolve(&self, context: &ConflictContext<'_>) -> ConflictChoice;
}

/// Fixed-choice resolver for `--force` (replace), `--yes` (skip), and
/// non-interactive runs (abort)
pub struct AutoResolver {
    choice: ConflictChoice,
}

impl AutoResolver {
    pub fn new(choice: ConflictChoice) -> Self {
        Self { choice }
    }
}

impl ConflictResolver for AutoResolver {
    fn resolve(&self, _context: &ConflictContext<'_>) -> ConflictChoice {
        self.choice
    }
}

/// Interactive conflict resolver using stdin/stderr
///
/// Prompts the operator to choose how to resolve each conflict.
/// Supports: replace, skip, abort, and "apply to all" options.
pub struct InteractiveResolver {
    /// Track "apply to all" choice
    apply_all: Mutex<Option<ConflictChoice>>,
}

impl InteractiveResolver {
    pub fn new() -> Self {
        Self {
            apply_all: Mutex::new(None),
        }
    }

    fn prompt_single(&self, context: &ConflictContext<'_>) -> ConflictChoice {
        loop {
            eprintln!();
            eprintln!(
                "Conflict: container '{}' for service '{}' already exists",
                context.container, context.service
            );
            eprint!("[r]eplace / [s]kip / [a]bort / [A]ll? ");
            let _ = io::stderr().flush();

            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                return ConflictChoice::Abort;
            }

            match input.trim() {
                "r" | "R" => return ConflictChoice::Replace,
                "s" | "S" => return ConflictChoice::Skip,
                "a" => return ConflictChoice::Abort,
                "A" => {
                    // Ask for "apply to all" choice
                    loop {
                        eprint!("Apply to all conflicts: [r]eplace / [s]kip / [a]bort? ");
                        let _ = io::stderr().flush();
                        let mut all = String::new();
                        if io::stdin().read_line(&mut all).is_err() {
                            return ConflictChoice::Abort;
                        }
                        match all.trim() {
                            "r" | "R" => return ConflictChoice::ReplaceAll,
                            "s" | "S" => return ConflictChoice::SkipAll,
                            "a" => return ConflictChoice::Abort,
                            _ => continue,
                        }
                    }
                }
                _ => continue,
            }
        }
    }
}

impl Default for InteractiveResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictResolver for InteractiveResolver {
    fn resolve(&self, context: &ConflictContext<'_>) -> ConflictChoice {
        // Check if "apply to all" was previously chosen
        {
            let guard = self.apply_all.lock().unwrap();
            if let Some(choice) = *guard {
                return choice;
            }
        }

        let choice = self.prompt_single(context);

        // Handle "apply to all" choices
        match choice {
            ConflictChoice::ReplaceAll => {
                let mut guard = self.apply_all.lock().unwrap();
                *guard = Some(ConflictChoice::Replace);
                ConflictChoice::Replace
            }
            ConflictChoice::SkipAll => {
                let mut guard = self.apply_all.lock().unwrap();
                *guard = Some(ConflictChoice::Skip);
                ConflictChoice::Skip
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolver_returns_fixed_choice() {
        let resolver = AutoResolver::new(ConflictChoice::Skip);
        let context = ConflictContext {
            service: "db",
            container: "shop-db",
        };
        assert_eq!(resolver.resolve(&context), ConflictChoice::Skip);
        assert_eq!(resolver.resolve(&context), ConflictChoice::Skip);
    }

    #[test]
    fn interactive_resolver_default() {
        let resolver = InteractiveResolver::default();
        assert!(resolver.apply_all.lock().unwrap().is_none());
    }

    #[test]
    fn interactive_resolver_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InteractiveResolver>();
    }

    #[test]
    fn apply_all_state_short_circuits_prompt() {
        let resolver = InteractiveResolver::new();
        {
            let mut guard = resolver.apply_all.lock().unwrap();
            *guard = Some(ConflictChoice::Replace);
        }

        let context = ConflictContext {
            service: "db",
            container: "shop-db",
        };
        // With apply_all set, resolve never touches stdin.
        assert_eq!(resolver.resolve(&context), ConflictChoice::Replace);
    }

    // Note: prompt_single reads stdin directly; full prompt flows are not
    // unit tested here. The workflow tests cover conflicts via AutoResolver.
}
