//! Utility functions for domain normalization and date handling.
//!
//! Registries and WHOIS proxies disagree on nearly every date format, so the
//! parsing helpers here are deliberately permissive.

use crate::error::DomainHunterError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::collections::HashSet;

const MILLIS_PER_DAY: i64 = 86_400_000;
const NANOS_PER_DAY: i64 = MILLIS_PER_DAY * 1_000_000;

lazy_static::lazy_static! {
    static ref THREE_LETTER_CLASSIC: Regex = Regex::new(r"^[a-z]{3}\.(com|net|org)$").unwrap();
    static ref PREMIUM_TLD: Regex = Regex::new(r"\.(io|ai|app|tech|dev)$").unwrap();
}

/// Normalize a domain string into its cache key form.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_domain(domain: &str) -> Option<String> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Validate and normalize a single domain for the single-lookup entry point.
///
/// Only emptiness is checked; malformed names simply fail their lookups.
pub fn validate_domain(domain: &str) -> Result<String, DomainHunterError> {
    normalize_domain(domain)
        .ok_or_else(|| DomainHunterError::invalid_domain(domain, "Domain name cannot be empty"))
}

/// Normalize a list of domains, dropping blanks and later duplicates.
///
/// The first occurrence keeps its position.
pub fn unique_domains<S: AsRef<str>>(domains: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    domains
        .iter()
        .filter_map(|d| normalize_domain(d.as_ref()))
        .filter(|d| seen.insert(d.clone()))
        .collect()
}

/// Whole days from `now` until `expiration`, rounded up.
///
/// Negative once the expiration has passed.
pub fn days_left(expiration: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let span = expiration.signed_duration_since(now);
    // Nanoseconds overflow past roughly 292 years.
    match span.num_nanoseconds() {
        Some(nanos) => div_ceil(nanos, NANOS_PER_DAY),
        None => div_ceil(span.num_milliseconds(), MILLIS_PER_DAY),
    }
}

fn div_ceil(value: i64, unit: i64) -> i64 {
    let whole = value.div_euclid(unit);
    if value.rem_euclid(unit) == 0 {
        whole
    } else {
        whole + 1
    }
}

/// Heuristic for names worth watching closely: very short names, three-letter
/// `.com`/`.net`/`.org` names, and names under a few startup-favoured TLDs.
///
/// Expects a normalized domain.
pub fn is_premium_domain(domain: &str) -> bool {
    domain.len() <= 4 || THREE_LETTER_CLASSIC.is_match(domain) || PREMIUM_TLD.is_match(domain)
}

/// Parse the date formats seen in RDAP and WHOIS proxy responses.
///
/// Timestamps without an offset are taken as UTC. Returns `None` for
/// anything unrecognized.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S %z"] {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let without_zone = raw
        .strip_suffix(" UTC")
        .or_else(|| raw.strip_suffix(" GMT"))
        .or_else(|| raw.strip_suffix('Z'))
        .unwrap_or(raw)
        .trim();

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y.%m.%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    for format in ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(without_zone, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }

    None
}

/// Parse a JSON date value: a date string or a Unix timestamp.
///
/// Numbers above 10^11 are read as milliseconds.
pub fn parse_timestamp_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => parse_timestamp(text),
        serde_json::Value::Number(number) => {
            let raw = number.as_i64()?;
            if raw.abs() > 100_000_000_000 {
                Utc.timestamp_millis_opt(raw).single()
            } else {
                Utc.timestamp_opt(raw, 0).single()
            }
        }
        _ => None,
    }
}
