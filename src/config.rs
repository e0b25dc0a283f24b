//! Configuration for saltnorm.
//!
//! [`Config::load`] layers, lowest to highest: the embedded defaults, an
//! optional TOML file, and `SALTNORM_*` environment variables (`__` separates
//! sections, e.g. `SALTNORM_LOG__FILE`). `SALTNORM_LOG__EXTRA_BLACKLIST`
//! takes a comma-separated list. [`Config::defaults`] returns the embedded
//! defaults only.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = r#"
[log]
file             = "/var/log/salt/minion"
dedup            = "full"
filter_blacklist = true
extra_blacklist  = []

[status]
unknown_action = "present"

[paths]
results_file = "/usr/local/sal/salt_returner_results.json"
checkin_file = "/usr/local/sal/checkin_results.json"
"#;

/// Picked up when `--config` is not given.
pub const SYSTEM_CONFIG_PATH: &str = "/usr/local/sal/saltnorm.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log: LogConfig,
    pub status: StatusConfig,
    pub paths: PathsConfig,
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub file: PathBuf,
    pub dedup: DedupPolicy,
    pub filter_blacklist: bool,
    /// Regular expressions searched in each message text, on top of the
    /// built-in ones.
    #[serde(default)]
    pub extra_blacklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    pub unknown_action: UnknownAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub results_file: PathBuf,
    pub checkin_file: PathBuf,
}

/// Which extracted log entries count as repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// Same date, type and text.
    #[default]
    Full,
    /// Same type and text, whenever it was logged.
    Text,
    Off,
}

/// Status for a successful state whose function is in neither action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownAction {
    #[default]
    Present,
    Unknown,
}

impl Config {
    /// Load the embedded defaults, then `path` (or [`SYSTEM_CONFIG_PATH`] if
    /// it exists), then the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_env(path, None)
    }

    /// [`Config::load`] with the variables in `env` standing in for the
    /// process environment when given.
    fn load_with_env(path: Option<&Path>, env: Option<config::Map<String, String>>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::from(Path::new(SYSTEM_CONFIG_PATH)).required(false),
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SALTNORM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("log.extra_blacklist")
                    .source(env),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.log.file, PathBuf::from("/var/log/salt/minion"));
        assert_eq!(cfg.log.dedup, DedupPolicy::Full);
        assert!(cfg.log.filter_blacklist);
        assert!(cfg.log.extra_blacklist.is_empty());
        assert_eq!(cfg.status.unknown_action, UnknownAction::Present);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[log]\ndedup = \"off\"\nextra_blacklist = [\"^Ignored\"]\n\n[status]\nunknown_action = \"unknown\""
        )
        .unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.log.dedup, DedupPolicy::Off);
        assert_eq!(cfg.log.extra_blacklist, vec!["^Ignored".to_string()]);
        assert_eq!(cfg.status.unknown_action, UnknownAction::Unknown);
        // untouched keys keep their defaults
        assert!(cfg.log.filter_blacklist);
        assert_eq!(cfg.log.file, PathBuf::from("/var/log/salt/minion"));
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[log]\ndedup = \"off\"").unwrap();

        let env: config::Map<String, String> = [
            ("SALTNORM_LOG__DEDUP", "text"),
            ("SALTNORM_LOG__FILTER_BLACKLIST", "false"),
            ("SALTNORM_LOG__EXTRA_BLACKLIST", "^Rendering,noise"),
            ("SALTNORM_STATUS__UNKNOWN_ACTION", "unknown"),
            ("SALTNORM_PATHS__CHECKIN_FILE", "/tmp/checkin.json"),
            ("OTHER_LOG__DEDUP", "full"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg = Config::load_with_env(Some(file.path()), Some(env)).unwrap();
        assert_eq!(cfg.log.dedup, DedupPolicy::Text);
        assert!(!cfg.log.filter_blacklist);
        assert_eq!(cfg.log.extra_blacklist, vec!["^Rendering".to_string(), "noise".to_string()]);
        assert_eq!(cfg.status.unknown_action, UnknownAction::Unknown);
        assert_eq!(cfg.paths.checkin_file, PathBuf::from("/tmp/checkin.json"));
        assert_eq!(cfg.log.file, PathBuf::from("/var/log/salt/minion"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/saltnorm.toml"))).is_err());
    }
}
