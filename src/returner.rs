//! First stage: turn a raw state run return into the results file the
//! checkin stage picks up later.

use crate::facts;
use crate::normalizer::{self, NormalizeOptions};
use crate::timestamp;
use crate::types::{CheckinReport, ExtraData, SaltReturn};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub const LAST_HIGHSTATE_FACT: &str = "Last Highstate";

/// Build the full results document from a job return and the minion's grains.
pub fn build_results<Tz: TimeZone>(
    ret: SaltReturn,
    grains: Map<String, Value>,
    opts: &NormalizeOptions,
    now: &DateTime<Tz>,
) -> CheckinReport {
    let extra_data = ExtraData {
        jid: ret.jid,
        success: ret.success,
        retcode: ret.retcode,
    };
    let normalized = normalizer::normalize(ret.ret, opts, now);

    let mut facts = facts::flatten(&facts::clean(grains));
    facts.insert(
        LAST_HIGHSTATE_FACT.to_string(),
        Value::String(timestamp::iso(now.with_timezone(&Utc))),
    );

    tracing::info!(
        managed_items = normalized.managed_items.len(),
        messages = normalized.messages.len(),
        facts = facts.len(),
        "built salt results"
    );

    CheckinReport {
        managed_items: normalized.managed_items,
        messages: normalized.messages,
        extra_data: Some(extra_data),
        facts,
    }
}
