//! YAML parsing helpers for the configuration file.
//!
//! Parse failures are reported as [`SrcdepsError::ConfigurationUnavailable`]
//! carrying the file they came from, so a broken `srcdeps.yaml` is a startup
//! error rather than something discovered mid-build.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::SrcdepsError;

/// Parse YAML `content` read from `origin` into `T`.
pub fn parse_config<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T, SrcdepsError> {
    // An empty file is an empty mapping, not an error.
    let content = if content.trim().is_empty() {
        "{}"
    } else {
        content
    };

    serde_yaml::from_str(content).map_err(|e| SrcdepsError::ConfigurationUnavailable {
        path: origin.display().to_string(),
        reason: e.to_string(),
    })
}

/// Parse a duration such as `90`, `30s`, `45m`, `2h` or `1d`.
///
/// A bare number is read as seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{value}': expected a number followed by s, m, h or d"))?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => return Err(format!("invalid duration unit '{other}' in '{value}'")),
    };

    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{value}' is too large"))
}

/// Deserialize an optional duration written either as a string or as plain seconds.
pub(crate) fn deserialize_optional_duration<'de, D>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Seconds(u64),
        Text(String),
    }

    match Option::<RawDuration>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawDuration::Seconds(secs)) => Ok(Some(Duration::from_secs(secs))),
        Some(RawDuration::Text(text)) => parse_duration(&text).map(Some).map_err(de::Error::custom),
    }
}
