//! Salt minion log extraction.
//!
//! Example entry:
//!
//! ```text
//! 2019-03-06 10:01:23,094 [salt.state       :1905][ERROR   ][6972] <THE MESSAGE>
//! ```
//!
//! A message runs until the next timestamped line or the end of the file, so
//! it may span several lines.

use super::ExtractConfig;
use crate::config::DedupPolicy;
use crate::timestamp;
use crate::types::{Message, MessageType};
use chrono::TimeZone;
use memchr::memmem;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const STAMP: &str = r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}";

fn entry_start_re() -> &'static Regex {
    static ENTRY_START_RE: OnceLock<Regex> = OnceLock::new();
    ENTRY_START_RE.get_or_init(|| Regex::new(&format!(r"(?m)^{STAMP}")).expect("valid entry start regex"))
}

/// A matched entry before its timestamp is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawEntry<'a> {
    pub date: &'a str,
    pub message_type: MessageType,
    pub text: &'a str,
}

impl RawEntry<'_> {
    fn to_message<Tz: TimeZone>(self, tz: &Tz) -> Message {
        let date = match timestamp::log_stamp(self.date, tz) {
            Ok(date) => Some(date),
            Err(err) => {
                tracing::warn!(error = %err, "keeping log entry without a date");
                None
            }
        };
        Message {
            text: self.text.to_string(),
            message_type: self.message_type,
            date,
        }
    }
}

/// Header pattern for one entry block, scoped to `pid`.
pub fn entry_pattern(pid: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"\A(?P<date>{STAMP})\s*?\[[^\n]*?\]\[(?P<message_type>WARNING|ERROR)\s*\]\[{pid}\]\s*(?P<text>(?s:.*))\z",
        pid = regex::escape(pid),
    ))
}

/// Split `log` into entry blocks. Each block starts at a timestamped line and
/// stops before the newline ahead of the next one; the last block drops a
/// single trailing newline. Anything before the first timestamp is ignored.
fn blocks(log: &str) -> Vec<&str> {
    let starts: Vec<usize> = entry_start_re().find_iter(log).map(|m| m.start()).collect();
    let last_end = log.strip_suffix('\n').map_or(log.len(), str::len);

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            // every later start sits right after a '\n'
            let end = starts.get(i + 1).map_or(last_end, |&next| next - 1);
            &log[start..end.max(start)]
        })
        .collect()
}

/// All entries matching `pattern`, in file order.
pub fn scan<'a>(log: &'a str, pattern: &Regex) -> Vec<RawEntry<'a>> {
    blocks(log)
        .into_iter()
        .filter_map(|block| {
            let caps = pattern.captures(block)?;
            Some(RawEntry {
                date: caps.name("date")?.as_str(),
                message_type: MessageType::from_level(caps.name("message_type")?.as_str())?,
                text: caps.name("text")?.as_str(),
            })
        })
        .collect()
}

/// Extract the WARNING and ERROR messages logged by process `pid`.
///
/// Repeats are dropped according to `cfg.dedup`, blacklisted texts are
/// dropped silently, and dates are read as local time in `tz` and reported in
/// UTC. Nothing is kept between calls.
pub fn extract<Tz: TimeZone>(log: &str, pid: &str, cfg: &ExtractConfig, tz: &Tz) -> Vec<Message> {
    let pid = pid.trim();
    if pid.is_empty() {
        return Vec::new();
    }

    let needle = format!("[{pid}]");
    if memmem::find(log.as_bytes(), needle.as_bytes()).is_none() {
        tracing::debug!(%pid, "no log lines for pid");
        return Vec::new();
    }

    let pattern = match entry_pattern(pid) {
        Ok(re) => re,
        Err(err) => {
            tracing::warn!(%pid, error = %err, "could not build log pattern");
            return Vec::new();
        }
    };

    let mut seen: HashSet<(Option<&str>, MessageType, &str)> = HashSet::new();
    let mut messages = Vec::new();
    for entry in scan(log, &pattern) {
        let key = match cfg.dedup {
            DedupPolicy::Full => Some((Some(entry.date), entry.message_type, entry.text)),
            DedupPolicy::Text => Some((None, entry.message_type, entry.text)),
            DedupPolicy::Off => None,
        };
        if let Some(key) = key {
            if !seen.insert(key) {
                continue;
            }
        }
        if cfg.blacklist.is_match(entry.text) {
            tracing::trace!(text = entry.text, "blacklisted");
            continue;
        }
        messages.push(entry.to_message(tz));
    }

    tracing::debug!(%pid, count = messages.len(), "extracted log messages");
    messages
}
