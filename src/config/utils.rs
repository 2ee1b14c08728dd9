//! Helpers for reading typed values out of environment variables

use std::env;
use std::str::FromStr;

/// Read a variable, treating unset and empty values alike
pub(super) fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Read and parse a variable, returning `None` when it is unset
pub(super) fn env_parse<T>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: {e}").into()),
        None => Ok(None),
    }
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`)
pub(super) fn parse_bool(name: &str, raw: &str) -> Result<bool, Box<dyn std::error::Error>> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid value for {name}: expected a boolean, got '{other}'").into()),
    }
}

pub(super) fn env_bool(name: &str) -> Result<Option<bool>, Box<dyn std::error::Error>> {
    env_string(name)
        .map(|raw| parse_bool(name, &raw))
        .transpose()
}

/// Drop empty strings coming from YAML
pub(super) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
