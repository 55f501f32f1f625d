//! Proptest configuration shared by every property suite.
//!
//! CI scales all suites at once through [`CASES_ENV`] and [`FORK_ENV`];
//! malformed overrides are logged and ignored.

use std::env;

use proptest::test_runner::Config;

/// Overrides the case count of every suite.
pub const CASES_ENV: &str = "PROPTEST_CASES";
/// Runs cases in forked subprocesses when truthy.
pub const FORK_ENV: &str = "EEGRAPH_PBT_FORK";

/// Proptest configuration for a suite running `default_cases` cases unless
/// the environment overrides it.
///
/// # Examples
/// ```
/// use eegraph_test_support::ci::property_suite::suite_config;
///
/// let config = suite_config(64);
/// assert!(config.cases > 0);
/// ```
#[must_use]
pub fn suite_config(default_cases: u32) -> Config {
    config_from(default_cases, |key| env::var(key).ok())
}

fn config_from(default_cases: u32, lookup: impl Fn(&str) -> Option<String>) -> Config {
    Config {
        cases: override_or(&lookup, CASES_ENV, default_cases, parse_cases),
        fork: override_or(&lookup, FORK_ENV, false, parse_switch),
        ..Config::default()
    }
}

fn override_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    parse: fn(&str) -> Option<T>,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    parse(raw.trim()).unwrap_or_else(|| {
        tracing::warn!(env = key, raw = %raw, "ignoring malformed property-suite override");
        default
    })
}

fn parse_cases(raw: &str) -> Option<u32> {
    raw.parse().ok().filter(|&cases| cases > 0)
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
