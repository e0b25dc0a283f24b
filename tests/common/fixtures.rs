//! Static job returns, grains and minion logs used across harnesses.

use chrono::{DateTime, TimeZone, Utc};
use saltnorm::types::{ExecutionReturn, SaltReturn};
use serde_json::{Map, Value, json};

pub const PID: &str = "6972";

/// The moment every harness pretends it is.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 6, 18, 0, 0).unwrap()
}

/// One state per classification: PRESENT, ABSENT, ERROR, plus one that was
/// skipped by the requisite system.
pub fn mixed_return() -> Value {
    json!({
        "pkg_|-vim_|-vim_|-installed": {
            "__id__": "vim",
            "__run_num__": 0,
            "result": true,
            "comment": "All specified packages are already installed",
            "start_time": "10:01:20.000100",
            "duration": 401.2,
            "changes": {}
        },
        "file_|-old motd_|-/etc/motd.old_|-absent": {
            "__id__": "old motd",
            "__run_num__": 1,
            "result": true,
            "comment": "Removed file /etc/motd.old",
            "start_time": "10:01:21.500000",
            "changes": {"removed": "/etc/motd.old"}
        },
        "service_|-salt-minion_|-salt-minion_|-running": {
            "__id__": "salt-minion",
            "__run_num__": 2,
            "result": false,
            "comment": "Service salt-minion failed to start",
            "start_time": "10:01:23.094000"
        },
        "cmd_|-restart_|-launchctl kickstart_|-run": {
            "__run_num__": 3,
            "result": false,
            "comment": "One or more requisite failed: salt-minion"
        }
    })
}

pub fn execution_return(value: Value) -> ExecutionReturn {
    serde_json::from_value(value).expect("fixture must deserialize")
}

pub fn salt_return(ret: Value) -> SaltReturn {
    serde_json::from_value(json!({
        "jid": "20190306100119871234",
        "success": true,
        "retcode": 2,
        "fun": "state.highstate",
        "return": ret
    }))
    .expect("fixture must deserialize")
}

pub fn grains() -> Map<String, Value> {
    match json!({
        "pid": 6972,
        "os": "MacOS",
        "productname": "MacBookPro11,5\u{0000}",
        "ipv4": ["127.0.0.1", "10.0.0.5"],
        "locale_info": {"defaultlanguage": "en_US", "timezone": "MST"}
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// A minion log covering one run of process 6972 interleaved with another
/// process and INFO chatter.
pub const MINION_LOG: &str = "\
2019-03-06 10:01:19,871 [salt.minion      :1460][INFO    ][6972] Starting a new job 20190306100119871234 with PID 6972
2019-03-06 10:01:20,410 [salt.state       :300 ][INFO    ][6972] Package vim is already installed
2019-03-06 10:01:23,094 [salt.state       :1905][ERROR   ][6972] Service salt-minion failed to start
2019-03-06 10:01:23,101 [salt.loaded.int.module.cmdmod:730 ][ERROR   ][6972] Command '['launchctl', 'kickstart', 'system/com.saltstack.salt.minion']' failed with return code: 113
2019-03-06 10:01:23,101 [salt.loaded.int.module.cmdmod:736 ][ERROR   ][6972] stderr: Could not find service
  \"com.saltstack.salt.minion\" in domain for system
2019-03-06 10:01:24,000 [salt.minion      :2011][WARNING ][5151] The minion failed to return the job information for job req. This is often due to the master being shut down or overloaded. If the master is running, consider increasing the worker_threads value.
2019-03-06 10:01:25,000 [salt.minion      :2011][WARNING ][6972] The minion failed to return the job information for job req. This is often due to the master being shut down or overloaded. If the master is running, consider increasing the worker_threads value.
2019-03-06 10:01:26,250 [salt.state       :1905][ERROR   ][6972] Service salt-minion failed to start
";
