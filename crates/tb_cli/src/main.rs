//! `tb_cli`: drive two-board episodes from the terminal.

mod demos;
mod repl;
mod script;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tb_env::{ActionDescriptor, EnvConfig, Episode, Variant};
use tracing_subscriber::EnvFilter;

use crate::demos::Demo;

#[derive(Parser, Debug)]
#[command(name = "tb_cli", version, about = "Two-board polynomial equation environment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Environment configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reward variant; overrides the configuration file
    #[arg(long, global = true, value_enum)]
    variant: Option<VariantArg>,

    /// Log engine and environment activity (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a scripted episode
    Demo(DemoArgs),
    /// Play interactively, one action per line
    Play(PlayArgs),
    /// Run a JSON action script against an equation
    Run(RunArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug)]
struct DemoArgs {
    #[arg(value_enum)]
    name: Demo,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Equation to solve, e.g. "x^2 - 5*x + 6 = 0"
    equation: String,

    /// Variable to solve for (default: x, else the first alphabetically)
    #[arg(long)]
    unknown: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Equation to solve
    equation: String,

    /// JSON array of action descriptors; `-` reads stdin
    script: PathBuf,

    #[arg(long)]
    unknown: Option<String>,

    /// Stop at the first rejected action
    #[arg(long)]
    stop_on_error: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VariantArg {
    SingleRoot,
    MultiRoot,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::SingleRoot => Variant::SingleRoot,
            VariantArg::MultiRoot => Variant::MultiRoot,
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// A configuration file wins over the presets; `--variant` then overrides
/// the file's variant, or picks the preset when there is no file.
fn resolve_config(cli: &Cli, default_variant: Option<Variant>) -> Result<EnvConfig> {
    let requested = cli.variant.map(Variant::from).or(default_variant);
    match &cli.config {
        Some(path) => {
            let mut config = EnvConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            if let Some(variant) = cli.variant {
                config.variant = variant.into();
            }
            Ok(config)
        }
        None => Ok(match requested {
            Some(Variant::SingleRoot) => EnvConfig::single_root(),
            Some(Variant::MultiRoot) | None => EnvConfig::multi_root(),
        }),
    }
}

fn read_script(path: &Path) -> Result<Vec<ActionDescriptor>> {
    let json = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading script from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    Ok(ActionDescriptor::script_from_json(&json)?)
}

fn print_report(episode: &Episode, report: &script::RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", script::render_text(episode, report));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Demo(args) => {
            let config = resolve_config(&cli, Some(args.name.variant()))?;
            let mut episode = Episode::symbolic(args.name.equation(), None, config)?;
            let report = script::run_script(&mut episode, &args.name.script(), false);
            print_report(&episode, &report, args.json)?;
        }
        Commands::Play(args) => {
            let config = resolve_config(&cli, None)?;
            let session = repl::Session::new(&args.equation, args.unknown.clone(), config)?;
            repl::run(session)?;
        }
        Commands::Run(args) => {
            let config = resolve_config(&cli, None)?;
            let descriptors = read_script(&args.script)?;
            let mut episode = Episode::symbolic(&args.equation, args.unknown.as_deref(), config)?;
            let report = script::run_script(&mut episode, &descriptors, args.stop_on_error);
            print_report(&episode, &report, args.json)?;
            if args.stop_on_error && report.errors > 0 {
                anyhow::bail!("script stopped after a rejected action");
            }
        }
        Commands::Config => {
            let config = resolve_config(&cli, None)?;
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}
