//! Helpers for environment-driven configuration structs.
//!
//! Every `from_env` constructor in the workspace has a `from_lookup`
//! twin taking the variable source as a closure, so tests never touch
//! the process environment.

use std::str::FromStr;

/// Failure to build a configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Source of configuration values, usually `std::env::var(..).ok()`.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read the process environment.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// A variable that must be present and non-empty.
pub fn required(lookup: Lookup<'_>, name: &'static str) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// A variable that may be absent; empty counts as absent.
pub fn optional(lookup: Lookup<'_>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

/// Parse `name`, falling back to `default` when it is unset.
pub fn parse_or<T: FromStr>(
    lookup: Lookup<'_>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match optional(lookup, name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
