// crates/harbormaster-core/src/core/window.rs
// ============================================================================
// Module: Evidence Windows
// Description: Canonical time buckets for evidence collection periods.
// Purpose: Provide deterministic window derivation and round-trippable forms.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! A window is the time bucket a piece of evidence covers, derived from a
//! task's collection interval. Canonical string forms are `YYYY` (annual),
//! `YYYY-Qn` (quarterly), `YYYY-MM` (monthly), and `YYYY-Hn` (semi-annual).
//! Parsing and display round-trip exactly; the scanner relies on this to
//! recognize window directories on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use thiserror::Error;
use time::Date;

// ============================================================================
// SECTION: Collection Intervals
// ============================================================================

/// Evidence collection cadence declared on a task.
///
/// # Invariants
/// - Variants are stable for serialization and window derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionInterval {
    /// One window per calendar year.
    Annual,
    /// One window per calendar quarter.
    #[default]
    Quarterly,
    /// One window per calendar month.
    Monthly,
    /// One window per half year.
    #[serde(alias = "semi-annual", alias = "semiannual")]
    SemiAnnual,
}

// ============================================================================
// SECTION: Window
// ============================================================================

/// Canonical evidence window.
///
/// # Invariants
/// - `Quarterly` quarter is in 1..=4, `Monthly` month in 1..=12,
///   `SemiAnnual` half in 1..=2.
/// - `Display` and `FromStr` round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Window {
    /// Annual window (`YYYY`).
    Annual(i32),
    /// Quarterly window (`YYYY-Qn`).
    Quarterly(i32, u8),
    /// Monthly window (`YYYY-MM`).
    Monthly(i32, u8),
    /// Semi-annual window (`YYYY-Hn`).
    SemiAnnual(i32, u8),
}

impl Window {
    /// Derives the window covering `date` for a collection interval.
    #[must_use]
    pub fn for_date(interval: CollectionInterval, date: Date) -> Self {
        let year = date.year();
        let month = u8::from(date.month());
        match interval {
            CollectionInterval::Annual => Self::Annual(year),
            CollectionInterval::Quarterly => Self::Quarterly(year, month.div_ceil(3)),
            CollectionInterval::Monthly => Self::Monthly(year, month),
            CollectionInterval::SemiAnnual => {
                Self::SemiAnnual(year, if month <= 6 { 1 } else { 2 })
            }
        }
    }

    /// Returns the window's calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        match self {
            Self::Annual(year)
            | Self::Quarterly(year, _)
            | Self::Monthly(year, _)
            | Self::SemiAnnual(year, _) => *year,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual(year) => write!(f, "{year:04}"),
            Self::Quarterly(year, quarter) => write!(f, "{year:04}-Q{quarter}"),
            Self::Monthly(year, month) => write!(f, "{year:04}-{month:02}"),
            Self::SemiAnnual(year, half) => write!(f, "{year:04}-H{half}"),
        }
    }
}

/// Errors produced when parsing a window string.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowParseError {
    /// The input does not match any canonical window form.
    #[error("invalid window: {0}")]
    Invalid(String),
}

impl FromStr for Window {
    type Err = WindowParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_window(input).ok_or_else(|| WindowParseError::Invalid(input.to_string()))
    }
}

/// Parses a canonical window string, returning `None` on mismatch.
fn parse_window(input: &str) -> Option<Window> {
    let (year_part, rest) = match input.split_once('-') {
        Some((year, rest)) => (year, Some(rest)),
        None => (input, None),
    };
    if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = year_part.parse::<i32>().ok()?;
    let Some(rest) = rest else {
        return Some(Window::Annual(year));
    };
    if let Some(quarter) = rest.strip_prefix('Q') {
        let quarter = parse_bucket_digit(quarter, 4)?;
        return Some(Window::Quarterly(year, quarter));
    }
    if let Some(half) = rest.strip_prefix('H') {
        let half = parse_bucket_digit(half, 2)?;
        return Some(Window::SemiAnnual(year, half));
    }
    if rest.len() == 2 && rest.bytes().all(|b| b.is_ascii_digit()) {
        let month = rest.parse::<u8>().ok()?;
        if (1..=12).contains(&month) {
            return Some(Window::Monthly(year, month));
        }
    }
    None
}

/// Parses a single-digit bucket index bounded by `max`.
fn parse_bucket_digit(input: &str, max: u8) -> Option<u8> {
    if input.len() != 1 {
        return None;
    }
    let value = input.parse::<u8>().ok()?;
    (1..=max).contains(&value).then_some(value)
}

impl Serialize for Window {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Window {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests;
