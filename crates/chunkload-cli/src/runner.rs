use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use chunkload_core::{load_directory, split_file, LoaderConfig, SplitConfig};
use chunkload_reports::{JsonFormatter, Reporter, StdOutFormatter};

use crate::{
    constructor::{construct_load, construct_split},
    parser::{parse_config, Config},
    writer::report_path,
    Args, Command, LoadArgs, OutputFormat, SplitArgs,
};

/// What a single invocation does, resolved from flags and config
enum Plan {
    Split(PathBuf, SplitConfig),
    Load(PathBuf, LoaderConfig),
    Run {
        source: PathBuf,
        split: SplitConfig,
        dir: PathBuf,
        loader: LoaderConfig,
    },
}

impl Plan {
    fn split_step(&self) -> Option<(&Path, &SplitConfig)> {
        match self {
            Plan::Split(source, split) | Plan::Run { source, split, .. } => Some((source.as_path(), split)),
            Plan::Load(..) => None,
        }
    }

    fn load_step(&self) -> Option<(&Path, &LoaderConfig)> {
        match self {
            Plan::Load(dir, loader) | Plan::Run { dir, loader, .. } => Some((dir.as_path(), loader)),
            Plan::Split(..) => None,
        }
    }
}

fn plan(config: &Config, command: &Command) -> Result<Plan> {
    match command {
        Command::Split(split_args) => {
            let (source, split) = construct_split(config, split_args)?;
            Ok(Plan::Split(source, split))
        }
        Command::Load(load_args) => {
            let (dir, loader) = construct_load(config, load_args, None)?;
            Ok(Plan::Load(dir, loader))
        }
        Command::Run { split, load } => run_plan(config, split, load),
    }
}

fn run_plan(config: &Config, split_args: &SplitArgs, load_args: &LoadArgs) -> Result<Plan> {
    let (source, split) = construct_split(config, split_args)?;
    let (dir, loader) = construct_load(config, load_args, Some(split.destination.clone()))?;
    Ok(Plan::Run {
        source,
        split,
        dir,
        loader,
    })
}

/// Execute the plan, feeding every step to `reporter`.
/// Returns `false` when some chunks failed to load.
fn execute<R: Reporter>(reporter: &mut R, plan: &Plan) -> Result<bool> {
    reporter.on_start();

    if let Some((source, split)) = plan.split_step() {
        let outcome = split_file(source, split)
            .with_context(|| format!("Failed to split '{}'", source.display()))?;
        reporter.on_split(&outcome);
    }

    let mut passed = true;
    if let Some((dir, loader)) = plan.load_step() {
        reporter.on_loading(dir);
        let outcome = load_directory(dir, loader)
            .with_context(|| format!("Failed to load '{}'", dir.display()))?;
        passed = outcome.failures.is_empty();
        reporter.on_load_complete(&outcome);
        reporter.on_memory(&outcome.table);
    }

    reporter.on_summary();
    Ok(passed)
}

pub fn run(args: Args) -> Result<bool> {
    let config = parse_config(args.config.as_deref())?;
    let plan = plan(&config, &args.command)?;
    let version = env!("CARGO_PKG_VERSION");

    match args.output {
        OutputFormat::Stdout => {
            let mut formatter = StdOutFormatter::new(version.to_string());
            execute(&mut formatter, &plan)
        }
        OutputFormat::Json => {
            let mut formatter = JsonFormatter::new(version.to_string());
            let passed = execute(&mut formatter, &plan)?;
            let json = formatter.to_json().context("Failed to serialize report")?;
            match args.report_path.as_deref() {
                Some(target) => {
                    let timestamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
                    let path = report_path(Some(target), args.command.name(), &timestamp)?;
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write report: {}", path.display()))?;
                    tracing::info!(path = %path.display(), "report written");
                }
                None => println!("{}", json),
            }
            Ok(passed)
        }
    }
}
