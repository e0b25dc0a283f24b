use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use saltnorm::config::Config;
use saltnorm::normalizer::NormalizeOptions;
use saltnorm::output::{Target, write_results};
use saltnorm::types::SaltReturn;
use saltnorm::{checkin, returner};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config layered over the built-in defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level to stderr (RUST_LOG wins when set).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a state run return into the results file.
    Return {
        /// Job return JSON, `-` for stdin.
        #[arg(long, value_name = "FILE")]
        ret: String,

        /// Grains JSON.
        #[arg(long, value_name = "FILE")]
        grains: Option<PathBuf>,

        /// `stdout` or a path; defaults to the configured results file.
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Merge the results file and minion log into the checkin report.
    Checkin {
        #[arg(long, value_name = "FILE")]
        log_file: Option<PathBuf>,

        /// Keep messages that match the blacklist.
        #[arg(long)]
        no_blacklist: bool,

        /// `stdout` or a path; defaults to the configured checkin file.
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let start_time = Instant::now();
    let mut cfg = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Return { ret, grains, output } => {
            let ret: SaltReturn = serde_json::from_str(&read_input(&ret)?).context("parsing job return")?;
            let grains = match grains {
                Some(path) => read_grains(&path)?,
                None => Map::new(),
            };
            let opts = NormalizeOptions {
                unknown_action: cfg.status.unknown_action,
            };
            let results = returner::build_results(ret, grains, &opts, &Local::now());
            let target = output
                .map(|o| Target::parse(&o))
                .unwrap_or_else(|| Target::File(cfg.paths.results_file.clone()));
            write_results(&target, &results)?;
        }
        Command::Checkin {
            log_file,
            no_blacklist,
            output,
        } => {
            if let Some(path) = log_file {
                cfg.log.file = path;
            }
            if no_blacklist {
                cfg.log.filter_blacklist = false;
            }
            let target = output
                .map(|o| Target::parse(&o))
                .unwrap_or_else(|| Target::File(cfg.paths.checkin_file.clone()));
            let report = checkin::run(&cfg, &Local, &target)?;
            tracing::info!(
                managed_items = report.managed_items.len(),
                messages = report.messages.len(),
                "checkin report written"
            );
        }
    }

    tracing::debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, "done");
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(arg).with_context(|| format!("reading {arg}"))
}

fn read_grains(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} is not a JSON object", path.display()),
    }
}
