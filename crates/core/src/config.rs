//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads environment variables; the binaries
//! call the `*_from_env_value` parsers below with whatever `std::env::var` returned and build a
//! [`CoreConfig`] from the results.

use crate::constants::DATE_KEY_SUFFIXES;
use crate::timezone::{TimezonePolicy, TimezoneSource};
use crate::wire_codec::{DateFieldHeuristic, DateTimeWireCodec};
use crate::{CoreError, CoreResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    timezone_policy: TimezonePolicy,
    timezone_source: TimezoneSource,
    date_key_suffixes: Vec<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timezone_policy: TimezonePolicy::default(),
            timezone_source: TimezoneSource::default(),
            date_key_suffixes: DATE_KEY_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        timezone_policy: TimezonePolicy,
        timezone_source: TimezoneSource,
        date_key_suffixes: Vec<String>,
    ) -> CoreResult<Self> {
        if date_key_suffixes.iter().any(|s| s.trim().is_empty()) {
            return Err(CoreError::InvalidInput(
                "date key suffixes cannot be empty".into(),
            ));
        }
        if date_key_suffixes.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one date key suffix is required".into(),
            ));
        }

        Ok(Self {
            timezone_policy,
            timezone_source,
            date_key_suffixes,
        })
    }

    pub fn timezone_policy(&self) -> TimezonePolicy {
        self.timezone_policy
    }

    pub fn timezone_source(&self) -> TimezoneSource {
        self.timezone_source
    }

    pub fn date_key_suffixes(&self) -> &[String] {
        &self.date_key_suffixes
    }

    /// Builds the codec described by this configuration.
    pub fn codec(&self) -> DateTimeWireCodec {
        DateTimeWireCodec::new(self.timezone_policy, self.timezone_source).with_heuristic(
            DateFieldHeuristic::with_suffixes(self.date_key_suffixes.iter().cloned()),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the timezone policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`TimezonePolicy::TreatMissingAsLocal`].
pub fn timezone_policy_from_env_value(value: Option<String>) -> CoreResult<TimezonePolicy> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<TimezonePolicy>())
        .transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse the timezone source from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`TimezoneSource::System`].
pub fn timezone_source_from_env_value(value: Option<String>) -> CoreResult<TimezoneSource> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<TimezoneSource>())
        .transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse a comma-separated list of date key suffixes.
///
/// If `value` is `None` or empty/whitespace, returns the built-in suffix list.
pub fn date_key_suffixes_from_env_value(value: Option<String>) -> CoreResult<Vec<String>> {
    let Some(value) = non_blank(value) else {
        return Ok(DATE_KEY_SUFFIXES.iter().map(|s| s.to_string()).collect());
    };

    let suffixes: Vec<String> = value.split(',').map(|s| s.trim().to_string()).collect();
    if suffixes.iter().any(String::is_empty) {
        return Err(CoreError::InvalidInput(format!(
            "date key suffix list contains an empty entry: '{value}'"
        )));
    }
    Ok(suffixes)
}

/// Parse a positive byte limit from an optional string value, falling back to `default`.
pub fn byte_limit_from_env_value(value: Option<String>, default: usize) -> CoreResult<usize> {
    match non_blank(value) {
        None => Ok(default),
        Some(v) => match v.parse::<usize>() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(CoreError::InvalidInput(format!(
                "byte limit must be a positive integer, got: '{v}'"
            ))),
        },
    }
}
