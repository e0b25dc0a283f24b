//! Second stage: pick up the returner's results, add the minion's logged
//! warnings and errors, and hand the report to Sal.

use crate::config::Config;
use crate::facts;
use crate::output::{self, MODULE_NAME, Target};
use crate::parsers::{self, ExtractConfig, minion};
use crate::types::CheckinReport;
use anyhow::{Context, Result};
use chrono::TimeZone;
use std::io::ErrorKind;
use std::path::Path;

/// Read the returner's results file. `Ok(None)` when there is none.
pub fn read_results(path: &Path) -> Result<Option<CheckinReport>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };
    let report = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(report))
}

/// Append the messages logged by the run's minion process to `prior`.
///
/// The process id comes from the `pid` fact; without it the log is not
/// looked at.
pub fn build_report<Tz: TimeZone>(mut prior: CheckinReport, log: &str, cfg: &ExtractConfig, tz: &Tz) -> CheckinReport {
    match facts::pid(&prior.facts) {
        Some(pid) => {
            let logged = minion::extract(log, &pid, cfg, tz);
            prior.messages.extend(logged);
        }
        None => tracing::info!("no pid fact, skipping log extraction"),
    }
    prior
}

/// Run the whole checkin stage and write the `Salt` section to `target`.
pub fn run<Tz: TimeZone>(cfg: &Config, tz: &Tz, target: &Target) -> Result<CheckinReport> {
    let results_file = &cfg.paths.results_file;
    let prior = match read_results(results_file) {
        Ok(Some(report)) => report,
        Ok(None) => {
            tracing::info!(path = %results_file.display(), "no salt results yet");
            CheckinReport::default()
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "ignoring unusable salt results");
            CheckinReport::default()
        }
    };

    let log = if facts::pid(&prior.facts).is_some() {
        parsers::read_log(&cfg.log.file).unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "could not read minion log");
            String::new()
        })
    } else {
        String::new()
    };

    let report = build_report(prior, &log, &ExtractConfig::from_config(cfg), tz);
    output::write_section(target, MODULE_NAME, &report)?;
    Ok(report)
}
