use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use uebuild_core::{AssembledTarget, ModuleOrigin, ResolvedModule};

use crate::build::{Project, project_root};
use crate::config::Settings;
use crate::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "uebuild")]
#[command(version, about = "Resolve Unreal Engine module and target rules")]
pub struct Cli {
    /// Project directory or .uproject file (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Settings file applied on top of every other source
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise the log level, repeat for more
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the project, its engine and what was discovered
    Info,
    /// List build targets
    Targets,
    /// List registered modules and where they come from
    Modules,
    /// Show one module's PCH policy and direct dependencies
    Resolve {
        module: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the ordered modules compiled for a target
    Assemble {
        target: String,
        #[arg(long)]
        json: bool,
    },
    /// Assemble every target and report all failures
    Check,
}

pub fn launch() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!("{err:?}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project_path = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("failed to get the current directory")?,
    };

    let settings = Settings::load(&project_root(&project_path), cli.config.as_deref())
        .context("failed to load settings")?;
    init_logging(&settings.log_level, cli.verbose);

    let project = Project::load(&project_path, &settings)
        .with_context(|| format!("failed to load project at {}", project_path.display()))?;

    let mut stdout = std::io::stdout().lock();
    run_command(&project, &cli.command, &mut stdout)
}

/// Run `command` against a loaded project, writing its report to `out`
pub fn run_command(project: &Project, command: &Commands, out: &mut dyn Write) -> Result<ExitCode> {
    match command {
        Commands::Info => print_info(project, out)?,
        Commands::Targets => {
            for target in project.targets.values() {
                let descriptor = &target.descriptor;
                writeln!(
                    out,
                    "{:<24} {:<8} {:<6} [{}]",
                    descriptor.name,
                    descriptor.target_type,
                    descriptor.build_settings_version,
                    descriptor.extra_modules.join(", ")
                )?;
            }
        }
        Commands::Modules => {
            for module in project.registry.modules() {
                let location = module
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                writeln!(out, "{:<24} {:<8} {}", module.name(), module.origin, location)?;
            }
        }
        Commands::Resolve { module, json } => {
            let resolved = project.resolve(module)?;
            if *json {
                write_json(out, &resolved)?;
            } else {
                print_resolved(&resolved, out)?;
            }
        }
        Commands::Assemble { target, json } => {
            let assembled = project.assemble(target)?;
            if *json {
                write_json(out, &assembled)?;
            } else {
                print_assembled(&assembled, out)?;
            }
        }
        Commands::Check => {
            let checks = project.check();
            for check in &checks {
                match &check.error {
                    None => writeln!(out, "ok    {} ({} modules)", check.target, check.module_count)?,
                    Some(error) => writeln!(out, "FAIL  {}: {}", check.target, error)?,
                }
            }

            let failed = checks.iter().filter(|check| !check.is_ok()).count();
            if failed > 0 {
                writeln!(out, "{} of {} targets failed", failed, checks.len())?;
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_info(project: &Project, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Project:  {}", project.name)?;
    writeln!(out, "Root:     {}", project.root.display())?;
    if let Some(association) = &project.engine_association {
        writeln!(out, "Engine association: {}", association)?;
    }
    match &project.engine {
        Some(engine) => writeln!(
            out,
            "Engine:   {} ({})",
            engine.root.display(),
            engine.version.as_deref().unwrap_or("unknown version")
        )?,
        None => writeln!(out, "Engine:   not found")?,
    }

    let counts = [ModuleOrigin::Project, ModuleOrigin::Engine, ModuleOrigin::Catalog]
        .iter()
        .map(|origin| {
            let count = project.registry.modules_from(*origin).count();
            format!("{} {}", origin.as_ref().to_lowercase(), count)
        })
        .join(", ");
    writeln!(out, "Modules:  {} ({})", project.registry.len(), counts)?;
    writeln!(
        out,
        "Targets:  {}",
        project.targets.keys().join(", ")
    )?;
    Ok(())
}

fn print_resolved(resolved: &ResolvedModule, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{} ({}, {})",
        resolved.name,
        resolved.pch_usage,
        resolved.origin.as_ref().to_lowercase()
    )?;
    for dependency in &resolved.dependencies {
        if resolved.circular_dependencies.contains(dependency) {
            writeln!(out, "  {} (circular)", dependency)?;
        } else {
            writeln!(out, "  {}", dependency)?;
        }
    }
    Ok(())
}

fn print_assembled(assembled: &AssembledTarget, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{} ({}, {}): {} modules",
        assembled.name,
        assembled.target_type,
        assembled.build_settings_version,
        assembled.len()
    )?;
    for (index, module) in assembled.modules.iter().enumerate() {
        writeln!(out, "{:>3}. {} ({})", index + 1, module.name, module.pch_usage)?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
