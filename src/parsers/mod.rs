pub mod minion;

use crate::config::{Config, DedupPolicy};
use anyhow::{Context, Result};
use regex::Regex;
use std::io::ErrorKind;
use std::path::Path;

/// Benign warnings that are never worth reporting.
const BUILTIN_BLACKLIST: &[&str] = &[
    r"The minion failed to return the job information for job req\. This is often due to the master being shut down or overloaded\.",
];

/// Compiled message filters. A message is dropped when any pattern is found
/// anywhere in its text.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<Regex>,
}

impl Blacklist {
    /// The built-in patterns plus `extra`. Extra patterns that fail to
    /// compile are logged and left out.
    pub fn new(extra: &[String]) -> Self {
        let mut patterns: Vec<Regex> = BUILTIN_BLACKLIST
            .iter()
            .map(|p| Regex::new(p).expect("built-in blacklist pattern must compile"))
            .collect();

        for pattern in extra {
            match Regex::new(pattern) {
                Ok(re) => patterns.push(re),
                Err(err) => tracing::warn!(%pattern, error = %err, "ignoring invalid blacklist pattern"),
            }
        }
        Self { patterns }
    }

    /// Filters nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// Everything the extractor needs, resolved once per run.
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
    pub dedup: DedupPolicy,
    pub blacklist: Blacklist,
}

impl ExtractConfig {
    pub fn from_config(cfg: &Config) -> Self {
        let blacklist = if cfg.log.filter_blacklist {
            Blacklist::new(&cfg.log.extra_blacklist)
        } else {
            Blacklist::disabled()
        };
        Self {
            dedup: cfg.log.dedup,
            blacklist,
        }
    }
}

/// Read a whole log file. A missing file reads as empty.
///
/// The file is read in one go rather than mapped: logrotate may truncate the
/// live minion log under us. Line endings are normalized to `\n`.
pub fn read_log(path: &Path) -> Result<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "log file does not exist");
            return Ok(String::new());
        }
        Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
    };

    let text = String::from_utf8_lossy(&bytes);
    if memchr::memchr(b'\r', text.as_bytes()).is_none() {
        return Ok(text.into_owned());
    }
    Ok(text.replace("\r\n", "\n").replace('\r', "\n"))
}
