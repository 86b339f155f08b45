// crates/harbormaster-core/src/core/window/tests.rs
// ============================================================================
// Module: Evidence Window Tests
// Description: Unit tests for window parsing, display, and date derivation.
// Purpose: Pin the canonical window grammar and quarter bucketing.
// Dependencies: harbormaster-core, time
// ============================================================================

//! ## Overview
//! Covers round-tripping of all four window forms, rejection of malformed
//! strings, and derivation of windows from collection dates.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use time::Date;
use time::Month;

use super::CollectionInterval;
use super::Window;

fn date(year: i32, month: u8, day: u8) -> Date {
    Date::from_calendar_date(year, Month::try_from(month).unwrap(), day).unwrap()
}

#[test]
fn quarterly_windows_follow_ceiling_of_month_over_three() {
    let cases = [
        (date(2025, 10, 27), "2025-Q4"),
        (date(2025, 1, 1), "2025-Q1"),
        (date(2025, 4, 1), "2025-Q2"),
        (date(2025, 12, 31), "2025-Q4"),
    ];
    for (input, expected) in cases {
        let window = Window::for_date(CollectionInterval::Quarterly, input);
        assert_eq!(window.to_string(), expected, "input {input}");
    }
}

#[test]
fn derivation_covers_every_interval() {
    let d = date(2025, 7, 15);
    assert_eq!(Window::for_date(CollectionInterval::Annual, d).to_string(), "2025");
    assert_eq!(Window::for_date(CollectionInterval::Quarterly, d).to_string(), "2025-Q3");
    assert_eq!(Window::for_date(CollectionInterval::Monthly, d).to_string(), "2025-07");
    assert_eq!(Window::for_date(CollectionInterval::SemiAnnual, d).to_string(), "2025-H2");
    assert_eq!(
        Window::for_date(CollectionInterval::SemiAnnual, date(2025, 6, 30)).to_string(),
        "2025-H1"
    );
}

#[test]
fn parsing_round_trips_every_form() {
    for raw in ["2025", "2025-Q1", "2025-Q4", "2025-01", "2025-12", "2025-H1", "2025-H2"] {
        let window: Window = raw.parse().unwrap();
        assert_eq!(window.to_string(), raw);
    }
}

#[test]
fn parsing_rejects_malformed_windows() {
    for raw in [
        "25", "2025-Q5", "2025-Q0", "2025-13", "2025-00", "2025-H3", "2025-1", "2025-Q12",
        "abcd", "2025-", ".hidden", "archive",
    ] {
        assert!(raw.parse::<Window>().is_err(), "input {raw}");
    }
}

#[test]
fn windows_serialize_as_canonical_strings() {
    let window = Window::Quarterly(2025, 4);
    let json = serde_json::to_string(&window).unwrap();
    assert_eq!(json, "\"2025-Q4\"");
    let back: Window = serde_json::from_str(&json).unwrap();
    assert_eq!(back, window);
}
