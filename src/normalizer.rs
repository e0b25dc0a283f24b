//! Result normalizer: turns a state run's return value into Sal managed
//! items plus one error message per failed state.

use crate::config::UnknownAction;
use crate::error::NormalizeError;
use crate::timestamp;
use crate::types::{ExecutionReturn, ManagedItem, Message, Status};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;

const PRESENT_FUNCS: &[&str] = &[
    "cached",
    "directory",
    "enabled",
    "exists",
    "installed",
    "managed",
    "present",
    "running",
];
const ABSENT_FUNCS: &[&str] = &["absent", "dead", "disabled", "removed"];

const ID_KEY: &str = "__id__";
const START_TIME_KEY: &str = "start_time";
const SERIALIZED_KEYS: &[&str] = &["changes", "pchanges"];

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub unknown_action: UnknownAction,
}

#[derive(Debug, Default, PartialEq)]
pub struct Normalized {
    pub managed_items: BTreeMap<String, ManagedItem>,
    pub messages: Vec<Message>,
}

/// Normalize a state run return.
///
/// `now` supplies the current date and the zone Salt's date-less
/// `start_time` values are read in. A malformed state ends processing with a
/// single error message; whatever was normalized before it is kept.
pub fn normalize<Tz: TimeZone>(ret: ExecutionReturn, opts: &NormalizeOptions, now: &DateTime<Tz>) -> Normalized {
    let now_utc = timestamp::iso(now.with_timezone(&Utc));
    let mut out = Normalized::default();

    let items = match ret {
        ExecutionReturn::Failures(errors) => {
            tracing::debug!(count = errors.len(), "state run returned a failure list");
            out.messages = errors
                .into_iter()
                .map(|text| Message::error(text, Some(now_utc.clone())))
                .collect();
            return out;
        }
        ExecutionReturn::Items(items) => items,
    };

    let today = now.date_naive();
    let tz = now.timezone();
    for (key, item) in items {
        match normalize_item(&key, item, opts, today, &tz) {
            Ok(None) => tracing::debug!(%key, "skipping state that did not run"),
            Ok(Some((id, managed))) => {
                if managed.status == Status::Error {
                    let comment = managed.data.get("comment").map(text_of).unwrap_or_default();
                    out.messages
                        .push(Message::error(comment, Some(managed.date_managed.clone())));
                }
                out.managed_items.insert(id, managed);
            }
            Err(err) => {
                tracing::warn!(error = %err, "normalization stopped");
                out.messages.push(Message::error(
                    format!("Salt results normalization failed: {err}"),
                    Some(now_utc),
                ));
                break;
            }
        }
    }
    out
}

fn normalize_item<Tz: TimeZone>(
    key: &str,
    item: Value,
    opts: &NormalizeOptions,
    today: NaiveDate,
    tz: &Tz,
) -> Result<Option<(String, ManagedItem)>, NormalizeError> {
    let Value::Object(mut data) = item else {
        return Err(NormalizeError::NotAnObject { key: key.to_string() });
    };
    // Not run because of a failed requisite.
    if !data.contains_key(ID_KEY) {
        return Ok(None);
    }

    let succeeded = match data.get("result") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Null) => false,
        Some(_) => return Err(wrong_type(key, "result", "boolean")),
        None => return Err(NormalizeError::MissingField { key: key.to_string(), field: "result" }),
    };
    let status = status(key, succeeded, opts.unknown_action);

    let date_managed = match data.remove(START_TIME_KEY) {
        Some(Value::String(raw)) => timestamp::start_time(&raw, today, tz)
            .map_err(|source| NormalizeError::StartTime { key: key.to_string(), source })?,
        Some(_) => return Err(wrong_type(key, START_TIME_KEY, "string")),
        None => return Err(NormalizeError::MissingField { key: key.to_string(), field: START_TIME_KEY }),
    };

    data.insert("args".to_string(), Value::String(key.to_string()));
    for field in SERIALIZED_KEYS {
        serialize_nested(&mut data, field);
    }

    let id = match data.remove(ID_KEY) {
        Some(Value::String(id)) => id,
        _ => return Err(wrong_type(key, ID_KEY, "string")),
    };

    Ok(Some((id, ManagedItem { status, date_managed, data })))
}

/// Map a state result to a Sal status.
///
/// A failed result is always `ERROR`. Otherwise the state function, the
/// last `|`-separated token of the key minus its leading `-`, is looked up
/// in the action tables, e.g. `pkg_|-vim_|-vim_|-installed` is `PRESENT`.
pub fn status(key: &str, succeeded: bool, unknown: UnknownAction) -> Status {
    if !succeeded {
        return Status::Error;
    }
    let func = action_token(key);
    if PRESENT_FUNCS.contains(&func) {
        Status::Present
    } else if ABSENT_FUNCS.contains(&func) {
        Status::Absent
    } else {
        match unknown {
            UnknownAction::Present => Status::Present,
            UnknownAction::Unknown => Status::Unknown,
        }
    }
}

fn action_token(key: &str) -> &str {
    let last = key.rsplit('|').next().unwrap_or(key);
    let mut chars = last.chars();
    chars.next();
    chars.as_str()
}

fn wrong_type(key: &str, field: &'static str, expected: &'static str) -> NormalizeError {
    NormalizeError::WrongType { key: key.to_string(), field, expected }
}

fn serialize_nested(data: &mut Map<String, Value>, field: &str) {
    let nonempty = match data.get(field) {
        Some(Value::Object(m)) => !m.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        _ => false,
    };
    if nonempty {
        if let Some(value) = data.remove(field) {
            data.insert(field.to_string(), Value::String(spaced_json(&value)));
        }
    }
}

/// JSON with `", "` and `": "` separators, the text Sal has always been sent
/// for nested changes.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => value.to_string(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
