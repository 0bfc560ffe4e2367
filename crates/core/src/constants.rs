//! Constants used throughout the impf core crate.

/// Field-name suffixes that mark a JSON key as carrying a date or date-time.
pub const DATE_KEY_SUFFIXES: [&str; 9] = [
    "DateTime", "Date", "date", "Datum", "datum", "Time", "von", "bis", "day",
];

/// Wire format for outbound date-times: millisecond precision, no zone designator.
pub const WIRE_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Inbound local date-time pattern. The fractional part is optional.
pub const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Inbound date-time pattern carrying a numeric offset without colon (e.g. `+0100`).
pub const OFFSET_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Inbound date-only pattern.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default bind address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default upper bound for JSON bodies passed through the date normalisation layer.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Tracing target used for codec diagnostics.
pub const WIRE_CODEC_LOG_TARGET: &str = "impf_core::wire_codec";
