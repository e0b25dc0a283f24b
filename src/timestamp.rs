//! Local wall-clock readings to ISO-8601 UTC.
//!
//! Salt writes both `start_time` and its log timestamps in the minion's local
//! time without an offset. Every function here takes the zone explicitly so
//! callers pass `chrono::Local` and tests pass a fixed offset.
//!
//! Output matches Python's `isoformat()`: microseconds are written only when
//! they are not zero.

use crate::error::TimeError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Timelike, Utc};

const START_TIME_FORMAT: &str = "%H:%M:%S%.f";
const LOG_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn iso(dt: DateTime<Utc>) -> String {
    let precision = if dt.nanosecond() / 1_000 == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(precision, false)
}

pub fn local_to_utc<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>, TimeError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeError::Nonexistent(naive.to_string()))
}

/// `start_time` of a state result (`HH:MM:SS.ffffff`) on `today`.
///
/// The date is made up, so a time of day that falls into a DST gap on
/// `today` is moved forward one hour, past the gap, instead of failing.
pub fn start_time<Tz: TimeZone>(raw: &str, today: NaiveDate, tz: &Tz) -> Result<String, TimeError> {
    let time = NaiveTime::parse_from_str(raw.trim(), START_TIME_FORMAT).map_err(|_| TimeError::Parse {
        value: raw.to_string(),
        format: START_TIME_FORMAT,
    })?;
    let naive = today.and_time(time);
    local_to_utc(naive, tz)
        .or_else(|err| {
            tracing::debug!(error = %err, "start_time in a DST gap, moving past it");
            local_to_utc(naive + Duration::hours(1), tz)
        })
        .map(iso)
}

/// Log line prefix, `YYYY-MM-DD HH:MM:SS,mmm`.
pub fn log_stamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<String, TimeError> {
    // Python logging separates milliseconds with a comma
    let dotted = raw.trim().replacen(',', ".", 1);
    let naive = NaiveDateTime::parse_from_str(&dotted, LOG_STAMP_FORMAT).map_err(|_| TimeError::Parse {
        value: raw.to_string(),
        format: LOG_STAMP_FORMAT,
    })?;
    local_to_utc(naive, tz).map(iso)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::America::Denver;

    fn mst() -> FixedOffset {
        FixedOffset::west_opt(7 * 3600).unwrap()
    }

    #[test]
    fn start_time_shifts_to_utc() {
        let today = NaiveDate::from_ymd_opt(2019, 3, 6).unwrap();
        let got = start_time("10:01:23.094000", today, &mst()).unwrap();
        assert_eq!(got, "2019-03-06T17:01:23.094000+00:00");
    }

    #[test]
    fn start_time_rolls_over_midnight() {
        let today = NaiveDate::from_ymd_opt(2019, 3, 6).unwrap();
        let got = start_time("20:00:00.000001", today, &mst()).unwrap();
        assert_eq!(got, "2019-03-07T03:00:00.000001+00:00");
    }

    #[test]
    fn whole_seconds_omit_the_fraction() {
        let dt = Utc.with_ymd_and_hms(2019, 3, 6, 18, 0, 0).unwrap();
        assert_eq!(iso(dt), "2019-03-06T18:00:00+00:00");
        let today = NaiveDate::from_ymd_opt(2019, 3, 6).unwrap();
        assert_eq!(start_time("10:00:00.000000", today, &mst()).unwrap(), "2019-03-06T17:00:00+00:00");
    }

    #[test]
    fn start_time_in_dst_gap_moves_forward() {
        // 2019-03-10 02:00-03:00 does not exist in Denver
        let today = NaiveDate::from_ymd_opt(2019, 3, 10).unwrap();
        assert_eq!(start_time("02:30:00", today, &Denver).unwrap(), "2019-03-10T09:30:00+00:00");
        assert_eq!(start_time("03:30:00", today, &Denver).unwrap(), "2019-03-10T09:30:00+00:00");
        assert_eq!(start_time("01:30:00", today, &Denver).unwrap(), "2019-03-10T08:30:00+00:00");
    }

    #[test]
    fn log_stamp_in_dst_gap_is_an_error() {
        assert_eq!(
            log_stamp("2019-03-10 02:30:00,000", &Denver),
            Err(TimeError::Nonexistent("2019-03-10 02:30:00".to_string()))
        );
    }

    #[test]
    fn log_stamp_accepts_comma_millis() {
        let got = log_stamp("2019-03-06 10:01:23,094", &Utc).unwrap();
        assert_eq!(got, "2019-03-06T10:01:23.094000+00:00");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let today = NaiveDate::from_ymd_opt(2019, 3, 6).unwrap();
        assert!(matches!(
            start_time("yesterday", today, &Utc),
            Err(TimeError::Parse { .. })
        ));
    }
}
