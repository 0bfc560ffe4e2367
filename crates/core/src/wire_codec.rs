//! Date/time materialisation for JSON payloads crossing the network boundary.
//!
//! Wire payloads carry dates as strings. Application code wants real instants. This module
//! converts between the two for every object field whose key looks like a date field (see
//! [`DateFieldHeuristic`]), leaving every other value untouched.
//!
//! Wire formats:
//! - outbound: `YYYY-MM-DDTHH:mm:ss.SSS` (no zone designator)
//! - inbound: the outbound format, the same without millis, the same with a zone (`Z`, `+01:00`,
//!   `+0100`), or a bare `YYYY-MM-DD`
//!
//! Zone-less values are interpreted according to the codec's [`TimezonePolicy`]. For a fixed
//! policy `to_wire(to_application(x))` reproduces every `YYYY-MM-DDTHH:mm:ss.SSS` string in `x`;
//! a date-only string comes back as midnight of the same day.
//!
//! Neither direction mutates its input: both take a shared reference and build a new tree.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};

use crate::constants::{
    DATE_FORMAT, DATE_KEY_SUFFIXES, LOCAL_DATE_TIME_FORMAT, OFFSET_DATE_TIME_FORMAT,
    WIRE_CODEC_LOG_TARGET, WIRE_DATE_TIME_FORMAT,
};
use crate::timezone::{TimezonePolicy, TimezoneSource};

// ============================================================================
// Application-side value tree
// ============================================================================

/// Application-side JSON tree.
///
/// Identical to [`serde_json::Value`] except for the extra [`AppValue::Date`] variant, which holds
/// a materialised instant. Objects keep their key order.
#[derive(Clone, Debug, PartialEq)]
pub enum AppValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<AppValue>),
    Object(Vec<(String, AppValue)>),
}

impl AppValue {
    /// Looks up `key` when this value is an object.
    pub fn get(&self, key: &str) -> Option<&AppValue> {
        match self {
            AppValue::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Mutable variant of [`AppValue::get`].
    pub fn get_mut(&mut self, key: &str) -> Option<&mut AppValue> {
        match self {
            AppValue::Object(entries) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            AppValue::Date(instant) => Some(instant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AppValue::String(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Field-name heuristic
// ============================================================================

/// Decides whether an object key names a date or date-time field.
///
/// A key matches when it ends with any configured suffix. The default suffix list is
/// [`DATE_KEY_SUFFIXES`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFieldHeuristic {
    suffixes: Vec<String>,
}

impl Default for DateFieldHeuristic {
    fn default() -> Self {
        Self::with_suffixes(DATE_KEY_SUFFIXES)
    }
}

impl DateFieldHeuristic {
    pub fn with_suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        self.suffixes.iter().any(|suffix| key.ends_with(suffix.as_str()))
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Bidirectional converter between wire JSON and [`AppValue`] trees.
///
/// Policy, timezone source and heuristic are fixed at construction; the codec holds no other
/// state and is safe to share across threads.
#[derive(Clone, Debug, Default)]
pub struct DateTimeWireCodec {
    policy: TimezonePolicy,
    timezone: TimezoneSource,
    heuristic: DateFieldHeuristic,
}

impl DateTimeWireCodec {
    pub fn new(policy: TimezonePolicy, timezone: TimezoneSource) -> Self {
        Self {
            policy,
            timezone,
            heuristic: DateFieldHeuristic::default(),
        }
    }

    /// Replaces the field-name heuristic.
    pub fn with_heuristic(mut self, heuristic: DateFieldHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn policy(&self) -> TimezonePolicy {
        self.policy
    }

    /// Converts a wire payload into its application representation.
    ///
    /// String values under date-like keys become [`AppValue::Date`]. Returns `None` when the root
    /// is neither an object nor an array.
    pub fn to_application(&self, payload: &Value) -> Option<AppValue> {
        match payload {
            Value::Object(_) | Value::Array(_) => Some(self.materialise(None, payload)),
            _ => None,
        }
    }

    /// Converts an application payload back to wire JSON.
    ///
    /// [`AppValue::Date`] values under date-like keys are printed as `YYYY-MM-DDTHH:mm:ss.SSS`.
    /// Returns `None` when the root is neither an object nor an array.
    pub fn to_wire(&self, payload: &AppValue) -> Option<Value> {
        match payload {
            AppValue::Object(_) | AppValue::Array(_) => Some(self.dematerialise(None, payload)),
            _ => None,
        }
    }

    /// Rewrites every date-like field of a wire payload into the canonical outbound format.
    pub fn normalise(&self, payload: &Value) -> Option<Value> {
        self.to_application(payload).and_then(|app| self.to_wire(&app))
    }

    /// Parses a single wire string as the codec would under a date-like key.
    ///
    /// Returns `None` when none of the known patterns nor the lenient fallback match.
    pub fn parse_wire_date(&self, raw: &str) -> Option<DateTime<Utc>> {
        self.parse_known_pattern(raw).or_else(|| parse_fallback(raw))
    }

    /// Formats an instant in the outbound wire format.
    pub fn format_wire_date(&self, instant: &DateTime<Utc>) -> String {
        let wall_clock = match self.policy {
            TimezonePolicy::TreatMissingAsLocal => self.timezone.utc_to_local(instant),
            TimezonePolicy::TreatMissingAsUtc => instant.naive_utc(),
        };
        wall_clock.format(WIRE_DATE_TIME_FORMAT).to_string()
    }

    fn materialise(&self, key: Option<&str>, value: &Value) -> AppValue {
        match value {
            Value::Null => AppValue::Null,
            Value::Bool(b) => AppValue::Bool(*b),
            Value::Number(n) => AppValue::Number(n.clone()),
            Value::String(s) => match key {
                Some(key) if self.heuristic.matches(key) => self.materialise_date(key, s),
                _ => AppValue::String(s.clone()),
            },
            Value::Array(items) => {
                AppValue::Array(items.iter().map(|v| self.materialise(None, v)).collect())
            }
            Value::Object(entries) => AppValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.materialise(Some(k.as_str()), v)))
                    .collect(),
            ),
        }
    }

    fn materialise_date(&self, key: &str, raw: &str) -> AppValue {
        if let Some(instant) = self.parse_known_pattern(raw) {
            return AppValue::Date(instant);
        }

        tracing::warn!(
            target: WIRE_CODEC_LOG_TARGET,
            key = %key,
            value = %raw,
            "date field does not match a known wire pattern, falling back to lenient parsing"
        );

        match parse_fallback(raw) {
            Some(instant) => AppValue::Date(instant),
            None => {
                tracing::warn!(
                    target: WIRE_CODEC_LOG_TARGET,
                    key = %key,
                    value = %raw,
                    "date field could not be parsed, keeping original string"
                );
                AppValue::String(raw.to_owned())
            }
        }
    }

    fn dematerialise(&self, key: Option<&str>, value: &AppValue) -> Value {
        match value {
            AppValue::Null => Value::Null,
            AppValue::Bool(b) => Value::Bool(*b),
            AppValue::Number(n) => Value::Number(n.clone()),
            AppValue::String(s) => Value::String(s.clone()),
            AppValue::Date(instant) => match key {
                Some(key) if self.heuristic.matches(key) => {
                    Value::String(self.format_wire_date(instant))
                }
                // Dates outside date-like keys have no agreed wire format; keep full RFC 3339.
                _ => Value::String(instant.to_rfc3339()),
            },
            AppValue::Array(items) => {
                Value::Array(items.iter().map(|v| self.dematerialise(None, v)).collect())
            }
            AppValue::Object(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    map.insert(k.clone(), self.dematerialise(Some(k.as_str()), v));
                }
                Value::Object(map)
            }
        }
    }

    fn parse_known_pattern(&self, raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
            return Some(zoned.with_timezone(&Utc));
        }
        if let Ok(zoned) = DateTime::parse_from_str(raw, OFFSET_DATE_TIME_FORMAT) {
            return Some(zoned.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, LOCAL_DATE_TIME_FORMAT) {
            return Some(self.resolve_wall_clock(&naive));
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| self.resolve_wall_clock(&midnight))
    }

    fn resolve_wall_clock(&self, naive: &NaiveDateTime) -> DateTime<Utc> {
        match self.policy {
            TimezonePolicy::TreatMissingAsLocal => self.timezone.local_to_utc(naive),
            TimezonePolicy::TreatMissingAsUtc => Utc.from_utc_datetime(naive),
        }
    }
}

/// Lenient parsing for strings outside the known wire patterns.
fn parse_fallback(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc2822(trimmed)
        .or_else(|_| trimmed.parse::<DateTime<chrono::FixedOffset>>())
        .map(|zoned| zoned.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    fn plus_one() -> TimezoneSource {
        TimezoneSource::Fixed(FixedOffset::east_opt(3600).unwrap())
    }

    fn local_codec() -> DateTimeWireCodec {
        DateTimeWireCodec::new(TimezonePolicy::TreatMissingAsLocal, plus_one())
    }

    fn utc_codec() -> DateTimeWireCodec {
        DateTimeWireCodec::new(TimezonePolicy::TreatMissingAsUtc, plus_one())
    }

    #[test]
    fn heuristic_matches_any_suffix() {
        let heuristic = DateFieldHeuristic::default();
        for key in [
            "geburtsdatum",
            "impfungDatum",
            "termin1Date",
            "createdDateTime",
            "startTime",
            "von",
            "bis",
            "birthday",
            "date",
        ] {
            assert!(heuristic.matches(key), "expected {key} to match");
        }
        for key in ["name", "dateOfBirth", "status", "bisher", "gueltigVon", ""] {
            assert!(!heuristic.matches(key), "expected {key} not to match");
        }
    }

    #[test]
    fn utc_policy_materialises_utc_midnight() {
        let codec = utc_codec();
        let app = codec
            .to_application(&json!({ "myDate": "2020-12-17" }))
            .expect("object root");
        let expected = Utc.with_ymd_and_hms(2020, 12, 17, 0, 0, 0).unwrap();
        assert_eq!(app.get("myDate").and_then(AppValue::as_date), Some(&expected));

        let wire = codec.to_wire(&app).expect("object root");
        assert_eq!(wire, json!({ "myDate": "2020-12-17T00:00:00.000" }));
    }

    #[test]
    fn local_policy_materialises_local_midnight() {
        let codec = local_codec();
        let app = codec
            .to_application(&json!({ "myDate": "2020-12-17" }))
            .expect("object root");
        // Local midnight at +01:00 is 23:00 UTC on the previous day.
        let expected = Utc.with_ymd_and_hms(2020, 12, 16, 23, 0, 0).unwrap();
        assert_eq!(app.get("myDate").and_then(AppValue::as_date), Some(&expected));

        let wire = codec.to_wire(&app).expect("object root");
        assert_eq!(wire, json!({ "myDate": "2020-12-17T00:00:00.000" }));
    }

    #[test]
    fn date_time_strings_round_trip_exactly_under_both_policies() {
        let input = json!({
            "terminDateTime": "2021-03-12T02:15:30.125",
            "impfungen": [
                { "datum": "2021-01-05T08:00:00.000", "ort": "Bern" },
                { "datum": "2021-02-02T17:45:59.999", "ort": "Zürich" }
            ],
            "von": "2020-10-25T02:30:00.000"
        });

        for codec in [local_codec(), utc_codec(), DateTimeWireCodec::default()] {
            let app = codec.to_application(&input).expect("object root");
            let wire = codec.to_wire(&app).expect("object root");
            assert_eq!(wire, input, "policy {}", codec.policy());
        }
    }

    #[test]
    fn accepts_legacy_and_zoned_inbound_formats() {
        let codec = utc_codec();
        let expected = Utc.with_ymd_and_hms(2021, 5, 1, 10, 0, 0).unwrap();
        for raw in [
            "2021-05-01T10:00:00",
            "2021-05-01T10:00:00.000",
            "2021-05-01T10:00:00.000Z",
            "2021-05-01T12:00:00.000+02:00",
            "2021-05-01T12:00:00+0200",
        ] {
            assert_eq!(codec.parse_wire_date(raw), Some(expected), "parsing {raw}");
        }
    }

    #[test]
    fn zoned_inbound_values_ignore_the_policy() {
        let raw = json!({ "createdTime": "2021-05-01T10:00:00.000Z" });
        let local = local_codec().to_application(&raw).unwrap();
        let utc = utc_codec().to_application(&raw).unwrap();
        assert_eq!(local.get("createdTime"), utc.get("createdTime"));
    }

    #[test]
    fn non_date_fields_pass_through_at_any_depth() {
        let input = json!({
            "name": "2020-12-17",
            "nested": { "deeper": [ { "code": "2020-12-17T00:00:00.000", "n": 1.5 } ] },
            "flags": [true, false, null],
            "count": 42
        });
        for codec in [local_codec(), utc_codec()] {
            let app = codec.to_application(&input).unwrap();
            assert_eq!(
                app.get("name"),
                Some(&AppValue::String("2020-12-17".into()))
            );
            assert_eq!(codec.to_wire(&app).unwrap(), input);
        }
    }

    #[test]
    fn non_string_values_under_date_keys_are_untouched() {
        let input = json!({ "impfDatum": null, "termin1Date": 1608163200000u64, "bis": ["x"] });
        let codec = utc_codec();
        let app = codec.to_application(&input).unwrap();
        assert_eq!(app.get("impfDatum"), Some(&AppValue::Null));
        assert!(matches!(app.get("termin1Date"), Some(AppValue::Number(_))));
        assert_eq!(codec.to_wire(&app).unwrap(), input);
    }

    #[test]
    fn scalar_roots_yield_none() {
        let codec = local_codec();
        for root in [json!(null), json!("2020-12-17"), json!(3), json!(true)] {
            assert!(codec.to_application(&root).is_none());
            assert!(codec.normalise(&root).is_none());
        }
        assert!(codec.to_wire(&AppValue::Date(Utc::now())).is_none());
    }

    #[test]
    fn array_roots_are_converted() {
        let codec = utc_codec();
        let input = json!([{ "vonDate": "2021-01-01" }, { "vonDate": null }]);
        let wire = codec.normalise(&input).unwrap();
        assert_eq!(
            wire,
            json!([{ "vonDate": "2021-01-01T00:00:00.000" }, { "vonDate": null }])
        );
    }

    #[test]
    fn output_is_isolated_from_input() {
        let codec = utc_codec();
        let input = json!({ "myDate": "2020-12-17", "tags": ["a"] });
        let snapshot = input.clone();

        let mut app = codec.to_application(&input).unwrap();
        if let Some(AppValue::Array(tags)) = app.get_mut("tags") {
            tags.push(AppValue::String("b".into()));
        }
        *app.get_mut("myDate").unwrap() = AppValue::Null;
        assert_eq!(input, snapshot);

        let original_app = codec.to_application(&input).unwrap();
        let mut wire = codec.to_wire(&original_app).unwrap();
        wire["myDate"] = json!("changed");
        assert_eq!(
            original_app.get("myDate").and_then(AppValue::as_date),
            Some(&Utc.with_ymd_and_hms(2020, 12, 17, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn fallback_parses_rfc2822_and_space_separated_values() {
        let codec = utc_codec();
        let app = codec
            .to_application(&json!({
                "sentDate": "Thu, 17 Dec 2020 10:00:00 +0000",
                "receivedTime": "2020-12-17 10:00:00Z"
            }))
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 12, 17, 10, 0, 0).unwrap();
        assert_eq!(app.get("sentDate").and_then(AppValue::as_date), Some(&expected));
        assert_eq!(
            app.get("receivedTime").and_then(AppValue::as_date),
            Some(&expected)
        );
    }

    #[test]
    fn unparseable_date_strings_are_kept() {
        let codec = local_codec();
        let input = json!({ "impfDatum": "morgen", "bis": "2021-13-40" });
        let app = codec.to_application(&input).unwrap();
        assert_eq!(app.get("impfDatum").and_then(AppValue::as_str), Some("morgen"));
        assert_eq!(codec.to_wire(&app).unwrap(), input);
    }

    #[test]
    fn key_order_is_preserved() {
        let codec = utc_codec();
        let app = AppValue::Object(vec![
            ("zeta".into(), AppValue::Bool(true)),
            (
                "alphaDate".into(),
                AppValue::Date(Utc.with_ymd_and_hms(2022, 2, 3, 4, 5, 6).unwrap()),
            ),
        ]);
        let AppValue::Object(entries) = codec
            .to_application(&codec.to_wire(&app).unwrap())
            .unwrap()
        else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alphaDate"]);
    }

    #[test]
    fn custom_heuristic_limits_conversion() {
        let codec = utc_codec().with_heuristic(DateFieldHeuristic::with_suffixes(["At"]));
        let wire = codec
            .normalise(&json!({ "createdAt": "2021-01-01", "myDate": "2021-01-01" }))
            .unwrap();
        assert_eq!(
            wire,
            json!({ "createdAt": "2021-01-01T00:00:00.000", "myDate": "2021-01-01" })
        );
    }
}
