//! Timezone policy and timezone source used by the wire codec.
//!
//! The codec never looks up the host timezone on its own. A [`TimezoneSource`] is chosen once
//! (usually at startup, see [`crate::config`]) and passed into the codec, which keeps conversions
//! deterministic under test.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// How a wire value without explicit zone information is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimezonePolicy {
    /// Zone-less values are wall-clock times in the configured local zone.
    #[default]
    #[serde(rename = "local")]
    TreatMissingAsLocal,
    /// Zone-less values are UTC.
    #[serde(rename = "utc")]
    TreatMissingAsUtc,
}

impl fmt::Display for TimezonePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimezonePolicy::TreatMissingAsLocal => f.write_str("local"),
            TimezonePolicy::TreatMissingAsUtc => f.write_str("utc"),
        }
    }
}

impl FromStr for TimezonePolicy {
    type Err = CoreError;

    fn from_str(input: &str) -> CoreResult<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TimezonePolicy::TreatMissingAsLocal),
            "utc" => Ok(TimezonePolicy::TreatMissingAsUtc),
            other => Err(CoreError::InvalidInput(format!(
                "timezone policy must be 'local' or 'utc', got: '{other}'"
            ))),
        }
    }
}

/// Where the local UTC offset comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimezoneSource {
    /// The host's local zone, including daylight saving transitions.
    #[default]
    System,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl TimezoneSource {
    /// UTC itself, as a fixed source.
    pub fn utc() -> Self {
        TimezoneSource::Fixed(Utc.fix())
    }

    /// Interprets `naive` as wall-clock time in this zone and returns the instant.
    ///
    /// Ambiguous wall-clock times (autumn fold) resolve to the earlier instant. Times inside a
    /// spring-forward gap are shifted by the offset in force just before the gap, so they read
    /// back one gap length later (02:30 becomes 03:30 across a one-hour gap).
    pub fn local_to_utc(&self, naive: &NaiveDateTime) -> DateTime<Utc> {
        match self {
            TimezoneSource::System => resolve_local(&Local, naive),
            TimezoneSource::Fixed(offset) => resolve_local(offset, naive),
        }
    }

    /// Returns the wall-clock time of `instant` in this zone.
    pub fn utc_to_local(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimezoneSource::System => instant.with_timezone(&Local).naive_local(),
            TimezoneSource::Fixed(offset) => instant.with_timezone(offset).naive_local(),
        }
    }
}

impl fmt::Display for TimezoneSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimezoneSource::System => f.write_str("system"),
            TimezoneSource::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for TimezoneSource {
    type Err = CoreError;

    /// Accepts `system`, `utc`/`Z`, or an offset of the form `±HH:MM`.
    fn from_str(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("system") {
            return Ok(TimezoneSource::System);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(TimezoneSource::utc());
        }
        parse_offset(trimmed).map(TimezoneSource::Fixed)
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Utc> {
    if let Some(resolved) = tz.from_local_datetime(naive).earliest() {
        return resolved.with_timezone(&Utc);
    }

    // Gap: apply the offset of the wall-clock time an hour earlier.
    let before = *naive - Duration::hours(1);
    let offset = match tz.offset_from_local_datetime(&before).earliest() {
        Some(offset) => offset.fix(),
        None => tz.offset_from_utc_datetime(naive).fix(),
    };
    Utc.from_utc_datetime(&(*naive - Duration::seconds(i64::from(offset.local_minus_utc()))))
}

fn parse_offset(input: &str) -> CoreResult<FixedOffset> {
    let invalid = || {
        CoreError::InvalidInput(format!(
            "timezone offset must be 'system' or of the form +HH:MM, got: '{input}'"
        ))
    };

    let (sign, rest) = match input.as_bytes().first() {
        Some(b'+') => (1, &input[1..]),
        Some(b'-') => (-1, &input[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{LocalResult, NaiveDate};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(
            " UTC ".parse::<TimezonePolicy>().unwrap(),
            TimezonePolicy::TreatMissingAsUtc
        );
        assert_eq!(
            "local".parse::<TimezonePolicy>().unwrap(),
            TimezonePolicy::TreatMissingAsLocal
        );
        assert!("zulu".parse::<TimezonePolicy>().is_err());
        assert_eq!(TimezonePolicy::default(), TimezonePolicy::TreatMissingAsLocal);
    }

    #[test]
    fn source_parses_offsets() {
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            "+01:00".parse::<TimezoneSource>().unwrap(),
            TimezoneSource::Fixed(plus_one)
        );
        let minus = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(
            "-05:30".parse::<TimezoneSource>().unwrap(),
            TimezoneSource::Fixed(minus)
        );
        assert_eq!(
            "system".parse::<TimezoneSource>().unwrap(),
            TimezoneSource::System
        );
        assert_eq!("Z".parse::<TimezoneSource>().unwrap(), TimezoneSource::utc());
    }

    #[test]
    fn source_rejects_malformed_offsets() {
        for bad in [
            "01:00", "+1:00", "+01:60", "+0100", "+ab:00", "", "+-1:00", "+01:-1", "-+1:00",
        ] {
            assert!(bad.parse::<TimezoneSource>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn fixed_source_shifts_by_offset() {
        let source = TimezoneSource::Fixed(FixedOffset::east_opt(3600).unwrap());
        let local = naive(2020, 12, 17, 0, 0);
        let instant = source.local_to_utc(&local);
        assert_eq!(instant.naive_utc(), naive(2020, 12, 16, 23, 0));
        assert_eq!(source.utc_to_local(&instant), local);
    }

    #[test]
    fn system_source_round_trips_wall_clock() {
        let local = naive(2021, 6, 1, 12, 30);
        let source = TimezoneSource::System;
        assert_eq!(source.utc_to_local(&source.local_to_utc(&local)), local);
    }

    /// Central European zone around the 2021 spring-forward: +01:00 until 01:00 UTC on
    /// 2021-03-28, +02:00 afterwards. Local 02:00..03:00 on that day does not exist.
    #[derive(Clone, Copy, Debug)]
    struct SpringForward2021;

    fn cet() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn cest() -> FixedOffset {
        FixedOffset::east_opt(7200).unwrap()
    }

    impl TimeZone for SpringForward2021 {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward2021
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            if *local < naive(2021, 3, 28, 2, 0) {
                LocalResult::Single(cet())
            } else if *local < naive(2021, 3, 28, 3, 0) {
                LocalResult::None
            } else {
                LocalResult::Single(cest())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < naive(2021, 3, 28, 1, 0) {
                cet()
            } else {
                cest()
            }
        }
    }

    #[test]
    fn gap_times_move_forward_by_the_gap() {
        let instant = resolve_local(&SpringForward2021, &naive(2021, 3, 28, 2, 30));
        assert_eq!(instant.naive_utc(), naive(2021, 3, 28, 1, 30));
        assert_eq!(
            instant.with_timezone(&SpringForward2021).naive_local(),
            naive(2021, 3, 28, 3, 30)
        );
    }

    #[test]
    fn times_around_the_gap_keep_their_wall_clock() {
        for local in [naive(2021, 3, 28, 1, 30), naive(2021, 3, 28, 3, 30)] {
            let instant = resolve_local(&SpringForward2021, &local);
            assert_eq!(instant.with_timezone(&SpringForward2021).naive_local(), local);
        }
        assert_eq!(
            resolve_local(&SpringForward2021, &naive(2021, 3, 28, 1, 30)).naive_utc(),
            naive(2021, 3, 28, 0, 30)
        );
    }
}
