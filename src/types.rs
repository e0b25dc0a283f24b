use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Sal ManagedItem status derived from a state result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Error,
    Present,
    Absent,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Warning,
    Error,
}

impl MessageType {
    pub fn from_level(level: &str) -> Option<Self> {
        match level.trim() {
            "WARNING" => Some(MessageType::Warning),
            "ERROR" => Some(MessageType::Error),
            _ => None,
        }
    }
}

/// A log or failure notification as submitted to Sal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub message_type: MessageType,
    /// ISO-8601 UTC.
    #[serde(default)]
    pub date: Option<String>,
}

impl Message {
    pub fn error(text: impl Into<String>, date: Option<String>) -> Self {
        Self {
            text: text.into(),
            message_type: MessageType::Error,
            date,
        }
    }
}

/// One normalized state result, keyed by its `__id__` in [`CheckinReport::managed_items`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedItem {
    pub status: Status,
    pub date_managed: String,
    pub data: Map<String, Value>,
}

/// The `return` value of a state run.
///
/// Salt hands back a mapping of state keys to results when the run got that
/// far, and a flat list of error strings when rendering or compiling the
/// highstate failed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExecutionReturn {
    Failures(Vec<String>),
    Items(Map<String, Value>),
}

impl Default for ExecutionReturn {
    fn default() -> Self {
        ExecutionReturn::Items(Map::new())
    }
}

/// Raw job return as written by the minion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaltReturn {
    #[serde(default)]
    pub jid: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub retcode: Option<i64>,
    #[serde(default, rename = "return")]
    pub ret: ExecutionReturn,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retcode: Option<i64>,
}

/// The `Salt` section of the checkin results document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckinReport {
    #[serde(default)]
    pub managed_items: BTreeMap<String, ManagedItem>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
    #[serde(default)]
    pub facts: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_return_is_failures() {
        let ret: ExecutionReturn =
            serde_json::from_str(r#"["Rendering SLS 'base:top' failed"]"#).unwrap();
        assert_eq!(
            ret,
            ExecutionReturn::Failures(vec!["Rendering SLS 'base:top' failed".to_string()])
        );
    }

    #[test]
    fn message_serializes_upper_case_type() {
        let msg = Message::error("boom", None);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["message_type"], "ERROR");
        assert_eq!(json["date"], Value::Null);
    }

    #[test]
    fn salt_return_without_return_key_is_empty() {
        let ret: SaltReturn = serde_json::from_str(r#"{"jid": "20190306100123094000"}"#).unwrap();
        assert_eq!(ret.jid.as_deref(), Some("20190306100123094000"));
        assert_eq!(ret.ret, ExecutionReturn::Items(Map::new()));
    }
}
