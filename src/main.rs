//! Berth CLI - compose-style startup workflow for small container projects
//!
//! Usage: berth <COMMAND>
//!
//! Commands:
//!   up     Bring the recipe's services up in dependency order
//!   down   Stop and remove the recipe's containers
//!   build  Build images for services with a build context
//!   run    Run a single service in the foreground
//!   check  Validate the recipe and audit env-file hygiene

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;

use berth::config::{self, Config};
use berth::conflict::{AutoResolver, ConflictChoice, ConflictResolver, InteractiveResolver};
use berth::down::{run_down, DownEvent};
use berth::engine::{detect_engine, ContainerEngine, EngineOptions};
use berth::error::BerthError;
use berth::parser::load_recipe_with_warnings;
use berth::security::{run_check, CheckStatus};
use berth::up::{run_spec, run_up, UpEvent, UpOptions};

/// Berth - compose-style startup workflow for small container projects
#[derive(Parser, Debug)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring the recipe's services up in dependency order
    Up {
        /// Path to the orchestration recipe
        #[arg(short, long, default_value = "compose.yaml")]
        file: PathBuf,

        /// Name prefix for containers and built images
        #[arg(short, long)]
        project: Option<String>,

        /// Replace existing containers without prompting
        #[arg(long)]
        force: bool,

        /// Skip interactive prompts (conflicting containers are skipped)
        #[arg(short, long)]
        yes: bool,

        /// Dry run - show the plan without invoking the engine
        #[arg(long)]
        dry_run: bool,
    },

    /// Stop and remove the recipe's containers in reverse start order
    Down {
        /// Path to the orchestration recipe
        #[arg(short, long, default_value = "compose.yaml")]
        file: PathBuf,

        /// Name prefix for containers and built images
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Build images for services with a build context
    Build {
        /// Path to the orchestration recipe
        #[arg(short, long, default_value = "compose.yaml")]
        file: PathBuf,

        /// Name prefix for containers and built images
        #[arg(short, long)]
        project: Option<String>,

        /// Build only this service
        service: Option<String>,
    },

    /// Run a single service in the foreground (dependencies are not started)
    Run {
        /// Service name from the recipe
        service: String,

        /// Path to the orchestration recipe
        #[arg(short, long, default_value = "compose.yaml")]
        file: PathBuf,

        /// Name prefix for containers and built images
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Validate the recipe and audit env-file hygiene
    Check {
        /// Path to the orchestration recipe
        #[arg(short, long, default_value = "compose.yaml")]
        file: PathBuf,

        /// Fail on warnings too (CI mode)
        #[arg(long)]
        strict_warnings: bool,
    },

    /// Parse and display the recipe (debugging)
    #[command(hide = true)]
    Parse {
        /// Path to the orchestration recipe
        #[arg(short, long, default_value = "compose.yaml")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Up {
            file,
            project,
            force,
            yes,
            dry_run,
        } => cmd_up(&file, project, force, yes, dry_run, cli.json, cli.verbose),
        Commands::Down { file, project } => cmd_down(&file, project, cli.json),
        Commands::Build {
            file,
            project,
            service,
        } => cmd_build(&file, project, service, cli.json),
        Commands::Run {
            service,
            file,
            project,
        } => cmd_run(&file, project, &service),
        Commands::Check {
            file,
            strict_warnings,
        } => cmd_check(&file, strict_warnings, cli.json),
        Commands::Parse { file } => cmd_parse(&file, cli.json),
    }
}

/// Resolved invocation context shared by the commands
struct Context {
    config: Config,
    /// Absolute recipe path
    file: PathBuf,
    /// Directory the recipe lives in
    root: PathBuf,
    /// Effective project name
    project: String,
}

fn resolve_context(file: &PathBuf, project: Option<String>) -> Result<Context> {
    let cwd = std::env::current_dir()?;
    let config = config::load_or_default(Some(&cwd));

    // The default recipe path yields to config; an explicit -f wins.
    let file = if file == &PathBuf::from("compose.yaml") && config.file != *file {
        config.file.clone()
    } else {
        file.clone()
    };

    let file = if file.is_absolute() {
        file
    } else {
        cwd.join(file)
    };

    let root = file
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| cwd.clone());

    let project = project
        .or_else(|| config.project.clone())
        .unwrap_or_else(|| config::default_project(&root));

    Ok(Context {
        config,
        file,
        root,
        project,
    })
}

fn require_engine(ctx: &Context) -> Result<Box<dyn ContainerEngine>> {
    detect_engine(ctx.config.engine).ok_or_else(|| BerthError::EngineUnavailable.into())
}

fn print_recipe_warnings(warnings: &[berth::parser::RecipeWarning], json: bool) {
    for warning in warnings {
        if json {
            let event = serde_json::json!({
                "event": "warning",
                "key": warning.key,
                "file": warning.file.display().to_string(),
            });
            println!("{}", serde_json::to_string(&event).unwrap_or_default());
        } else {
            println!("⚠ Ignored recipe key: {}", warning.key);
        }
    }
}

fn cmd_up(
    file: &PathBuf,
    project: Option<String>,
    force: bool,
    yes: bool,
    dry_run: bool,
    json: bool,
    verbose: u8,
) -> Result<()> {
    let ctx = resolve_context(file, project)?;

    if !json {
        println!("📦 Berth Up");
        println!("Recipe: {}", ctx.file.display());
        println!("Project: {}", ctx.project);
        if force {
            println!("Mode: Force replace");
        }
        if dry_run {
            println!("Mode: Dry run");
        }
    }

    let (compose, warnings) = load_recipe_with_warnings(&ctx.file)?;
    print_recipe_warnings(&warnings, json);

    if dry_run {
        let plan = berth::plan::build_plan(&compose)?;
        let builds: Vec<String> = plan
            .order
            .iter()
            .filter(|name| compose.services[*name].build.is_some())
            .map(|name| compose.services[name].image_ref(&ctx.project, name))
            .collect();

        if json {
            let event = serde_json::json!({
                "event": "plan",
                "order": plan.order,
                "builds": builds,
            });
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("\nStart order: {}", plan.order.join(", "));
            if !builds.is_empty() {
                println!("Would build: {}", builds.join(", "));
            }
            println!("\nDry run - nothing was started.");
        }
        return Ok(());
    }

    let engine = require_engine(&ctx)?;
    if verbose > 0 && !json {
        println!("Engine: {}", engine.name());
    }

    // Conflict handling: --force replaces, --yes skips, a terminal prompts,
    // and a non-interactive run without either flag fails on the conflict.
    let auto_replace = AutoResolver::new(ConflictChoice::Replace);
    let auto_skip = AutoResolver::new(ConflictChoice::Skip);
    let interactive = InteractiveResolver::new();
    let resolver: Option<&dyn ConflictResolver> = if force {
        Some(&auto_replace)
    } else if yes {
        Some(&auto_skip)
    } else if std::io::stderr().is_terminal() {
        Some(&interactive)
    } else {
        None
    };

    let options = UpOptions {
        project: ctx.project.clone(),
        root: ctx.root.clone(),
        engine_options: EngineOptions { quiet: json },
    };

    let mut on_event = |event: UpEvent<'_>| {
        if json {
            let value = match event {
                UpEvent::Plan { order } => serde_json::json!({
                    "event": "plan",
                    "order": order,
                }),
                UpEvent::Build { service, image } => serde_json::json!({
                    "event": "build",
                    "service": service,
                    "image": image,
                }),
                UpEvent::Replace { service, container } => serde_json::json!({
                    "event": "replace",
                    "service": service,
                    "container": container,
                }),
                UpEvent::Skip { service, container } => serde_json::json!({
                    "event": "skip",
                    "service": service,
                    "container": container,
                }),
                UpEvent::Start {
                    service,
                    container,
                    image,
                } => serde_json::json!({
                    "event": "start",
                    "service": service,
                    "container": container,
                    "image": image,
                }),
            };
            println!("{}", serde_json::to_string(&value).unwrap_or_default());
        } else {
            match event {
                UpEvent::Plan { order } => {
                    println!("\nStart order: {}", order.join(", "));
                }
                UpEvent::Build { service, image } => {
                    println!("🔄 Building '{}' ({})", service, image);
                }
                UpEvent::Replace { service: _, container } => {
                    println!("🔄 Replacing container {}", container);
                }
                UpEvent::Skip { service, container } => {
                    println!("⚠ Skipped '{}' (container {} exists)", service, container);
                }
                UpEvent::Start {
                    service, container, ..
                } => {
                    println!("✓ Started '{}' ({})", service, container);
                }
            }
        }
    };

    let result = run_up(&compose, engine.as_ref(), resolver, &options, &mut on_event)?;

    if json {
        let event = serde_json::json!({
            "event": "up",
            "status": "success",
            "started": result.started,
            "skipped": result.skipped,
            "ts": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", serde_json::to_string(&event)?);
    } else {
        println!("\n📊 Up Results:");
        println!("  ✓ Started: {} services", result.started.len());
        for started in &result.started {
            println!("    - {} ({})", started.service, started.container);
        }
        if !result.skipped.is_empty() {
            println!("  ⚠ Skipped: {} services", result.skipped.len());
            for service in &result.skipped {
                println!("    - {}", service);
            }
        }
        println!();
    }

    Ok(())
}

fn cmd_down(file: &PathBuf, project: Option<String>, json: bool) -> Result<()> {
    let ctx = resolve_context(file, project)?;

    if !json {
        println!("📦 Berth Down");
        println!("Recipe: {}", ctx.file.display());
        println!("Project: {}", ctx.project);
        println!();
    }

    let (compose, warnings) = load_recipe_with_warnings(&ctx.file)?;
    print_recipe_warnings(&warnings, json);

    let engine = require_engine(&ctx)?;
    let engine_options = EngineOptions { quiet: true };

    let mut on_event = |event: DownEvent<'_>| {
        if json {
            let value = match event {
                DownEvent::Remove { service, container } => serde_json::json!({
                    "event": "remove",
                    "service": service,
                    "container": container,
                }),
                DownEvent::Missing { service, container } => serde_json::json!({
                    "event": "missing",
                    "service": service,
                    "container": container,
                }),
            };
            println!("{}", serde_json::to_string(&value).unwrap_or_default());
        } else {
            match event {
                DownEvent::Remove { container, .. } => {
                    println!("✓ Removed {}", container);
                }
                DownEvent::Missing { container, .. } => {
                    println!("  - {} (not found)", container);
                }
            }
        }
    };

    let result = run_down(
        &compose,
        engine.as_ref(),
        &ctx.project,
        &engine_options,
        &mut on_event,
    )?;

    if json {
        let event = serde_json::json!({
            "event": "down",
            "status": "success",
            "removed": result.removed,
            "missing": result.missing,
            "ts": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", serde_json::to_string(&event)?);
    } else {
        println!(
            "\nSummary: {} removed, {} not found",
            result.removed.len(),
            result.missing.len()
        );
    }

    Ok(())
}

fn cmd_build(
    file: &PathBuf,
    project: Option<String>,
    service: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = resolve_context(file, project)?;

    if !json {
        println!("📦 Berth Build");
        println!("Recipe: {}", ctx.file.display());
    }

    let (compose, warnings) = load_recipe_with_warnings(&ctx.file)?;
    print_recipe_warnings(&warnings, json);

    if let Some(name) = &service {
        if !compose.services.contains_key(name) {
            anyhow::bail!("service '{}' is not declared in the recipe", name);
        }
        if compose.services[name].build.is_none() {
            anyhow::bail!("service '{}' declares no build context", name);
        }
    }

    let engine = require_engine(&ctx)?;
    let engine_options = EngineOptions { quiet: json };
    let plan = berth::plan::build_plan(&compose)?;

    let mut built: Vec<String> = Vec::new();
    for name in &plan.order {
        if let Some(only) = &service {
            if only != name {
                continue;
            }
        }
        let decl = &compose.services[name];
        let Some(build) = &decl.build else {
            continue;
        };

        let image = decl.image_ref(&ctx.project, name);
        if json {
            let event = serde_json::json!({
                "event": "build",
                "service": name,
                "image": image,
            });
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("🔄 Building '{}' ({})", name, image);
        }
        engine.build(&image, &ctx.root.join(build), &engine_options)?;
        built.push(image);
    }

    if json {
        let event = serde_json::json!({
            "event": "build_done",
            "images": built,
            "ts": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", serde_json::to_string(&event)?);
    } else if built.is_empty() {
        println!("\nNothing to build - no service declares a build context.");
    } else {
        println!("\n✓ Built {} image(s)", built.len());
    }

    Ok(())
}

fn cmd_run(file: &PathBuf, project: Option<String>, service: &str) -> Result<()> {
    let ctx = resolve_context(file, project)?;

    let (compose, _) = load_recipe_with_warnings(&ctx.file)?;
    let Some(decl) = compose.services.get(service) else {
        anyhow::bail!("service '{}' is not declared in the recipe", service);
    };

    let engine = require_engine(&ctx)?;
    let options = UpOptions {
        project: ctx.project.clone(),
        root: ctx.root.clone(),
        engine_options: EngineOptions::default(),
    };
    let spec = run_spec(service, decl, &options)?;

    println!("📦 Berth Run");
    println!("Service: {} ({})", service, spec.image);
    for mapping in &spec.ports {
        println!("Port: {}", mapping);
    }
    println!();

    // Foreground run: the engine inherits the terminal until the container
    // exits or the operator interrupts it.
    engine.run_attached(&spec)?;

    Ok(())
}

fn cmd_check(file: &PathBuf, strict_warnings: bool, json: bool) -> Result<()> {
    let ctx = resolve_context(file, None)?;

    if !json {
        println!("🩺 Berth Check");
        println!("Recipe: {}", ctx.file.display());
        if strict_warnings {
            println!("Strict: failing on warnings");
        }
        println!();
    }

    let report = run_check(&ctx.root, &ctx.file, ctx.config.engine);

    let has_issues = if strict_warnings {
        report.errors() > 0 || report.warnings() > 0
    } else {
        report.errors() > 0
    };

    if json {
        let event = serde_json::json!({
            "event": "check",
            "passes": report.passes(),
            "warnings": report.warnings(),
            "errors": report.errors(),
            "success": !has_issues,
        });
        println!("{}", serde_json::to_string(&event)?);
    } else {
        // Group by area
        let mut current_area = String::new();

        for check in &report.checks {
            if check.area != current_area {
                if !current_area.is_empty() {
                    println!();
                }
                println!("{}", check.area);
                current_area = check.area.clone();
            }

            let icon = match check.status {
                CheckStatus::Pass => "✓",
                CheckStatus::Warning => "⚠",
                CheckStatus::Error => "✗",
            };

            println!("  {} {} - {}", icon, check.name, check.message);

            if let Some(rec) = &check.recommendation {
                println!("    ↳ {}", rec);
            }
        }

        println!();
        println!(
            "Summary: {} passed, {} warnings, {} errors",
            report.passes(),
            report.warnings(),
            report.errors()
        );
    }

    if has_issues {
        if !json {
            println!();
            println!("🔴 Check FAILED");
        }
        std::process::exit(1);
    } else if report.warnings() > 0 {
        if !json {
            println!();
            println!("🟡 Check passed with warnings.");
        }
    } else if !json {
        println!();
        println!("🟢 All checks passed!");
    }

    Ok(())
}

fn cmd_parse(file: &PathBuf, json: bool) -> Result<()> {
    let ctx = resolve_context(file, None)?;

    if !json {
        println!("🔍 Parsing recipe: {}", ctx.file.display());
    }

    let (compose, warnings) = load_recipe_with_warnings(&ctx.file)?;
    print_recipe_warnings(&warnings, json);

    if json {
        for (name, service) in &compose.services {
            let event = serde_json::json!({
                "event": "service",
                "name": name,
                "build": service.build.as_ref().map(|p| p.display().to_string()),
                "image": service.image,
                "ports": service.ports.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
                "depends_on": service.depends_on,
                "env_file": service.env_file.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string(&event)?);
        }
    } else {
        println!("\nVersion: {}", compose.version);
        println!("Found {} services:\n", compose.services.len());
        for (name, service) in &compose.services {
            println!("┌─ {}", name);
            if let Some(build) = &service.build {
                println!("│  Build: {}", build.display());
            }
            if let Some(image) = &service.image {
                println!("│  Image: {}", image);
            }
            if !service.ports.is_empty() {
                let ports: Vec<String> =
                    service.ports.iter().map(|p| p.to_string()).collect();
                println!("│  Ports: {}", ports.join(", "));
            }
            if !service.depends_on.is_empty() {
                println!("│  Depends on: {}", service.depends_on.join(", "));
            }
            if !service.environment.is_empty() {
                println!("│  Environment: {} values", service.environment.len());
            }
            if let Some(env_file) = &service.env_file {
                println!("│  Env file: {}", env_file.display());
            }
            println!("└─");
        }
    }

    Ok(())
}
