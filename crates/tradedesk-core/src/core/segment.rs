// crates/tradedesk-core/src/core/segment.rs
// ============================================================================
// Module: Date-Range Segmenter
// Description: Splits inclusive date windows into period-aligned segments.
// Purpose: Chunk large remote queries into contiguous sub-windows.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! [`segment`] splits the inclusive window `[start, end]` at period
//! boundaries (year-end, quarter-end, month-end, week-end Sunday, or day).
//! Boundaries are anchored at the first boundary on or after `start` and then
//! step every `N` units. `start` and `end` are inserted into the boundary set;
//! each adjacent boundary pair becomes one segment whose end is pulled back by
//! one day, except the final segment which ends exactly at `end`.
//!
//! # Invariants
//! - Segments are ordered, contiguous, and non-overlapping.
//! - The union of the segments equals `[start, end]` exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::Date;
use time::Duration;
use time::Month;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest accepted period multiplier.
pub const MAX_PERIOD_COUNT: u32 = 10_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Date segmentation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// The window start falls after its end.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Window start.
        start: String,
        /// Window end.
        end: String,
    },
    /// The period string could not be parsed.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    /// The date could not be parsed.
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

// ============================================================================
// SECTION: Periods
// ============================================================================

/// Boundary granularity of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    /// Year-end, 31 December.
    Year,
    /// Quarter-end: 31 Mar, 30 Jun, 30 Sep, 31 Dec.
    Quarter,
    /// Last day of each month.
    Month,
    /// Week ending Sunday.
    Week,
    /// Every calendar day.
    Day,
}

impl PeriodUnit {
    /// Returns the canonical single-letter code.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Year => 'A',
            Self::Quarter => 'Q',
            Self::Month => 'M',
            Self::Week => 'W',
            Self::Day => 'D',
        }
    }
}

/// Segmentation period such as `A`, `2A`, `Q`, or `6M`.
///
/// # Invariants
/// - `count` is in `1..=MAX_PERIOD_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    /// Number of units between boundaries.
    count: u32,
    /// Boundary granularity.
    unit: PeriodUnit,
}

impl Period {
    /// Creates a period from a count and unit.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidPeriod`] when `count` is zero or too large.
    pub fn new(count: u32, unit: PeriodUnit) -> Result<Self, SegmentError> {
        if count == 0 || count > MAX_PERIOD_COUNT {
            return Err(SegmentError::InvalidPeriod(format!(
                "multiplier must be between 1 and {MAX_PERIOD_COUNT}"
            )));
        }
        Ok(Self {
            count,
            unit,
        })
    }

    /// Returns the period multiplier.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.count
    }

    /// Returns the period unit.
    #[must_use]
    pub const fn unit(self) -> PeriodUnit {
        self.unit
    }

    /// Returns the first boundary on or after `date`.
    fn first_anchor(self, date: Date) -> Option<Date> {
        match self.unit {
            PeriodUnit::Year => Date::from_calendar_date(date.year(), Month::December, 31).ok(),
            PeriodUnit::Quarter => {
                let quarter_end = (u8::from(date.month()) - 1) / 3 * 3 + 3;
                month_end(date.year(), Month::try_from(quarter_end).ok()?)
            }
            PeriodUnit::Month => month_end(date.year(), date.month()),
            PeriodUnit::Week => {
                let ahead = 6 - i64::from(date.weekday().number_days_from_monday());
                date.checked_add(Duration::days(ahead))
            }
            PeriodUnit::Day => Some(date),
        }
    }

    /// Returns the boundary `count` units after `anchor`.
    fn step(self, anchor: Date) -> Option<Date> {
        let count = i64::from(self.count);
        match self.unit {
            PeriodUnit::Year => {
                let year = i32::try_from(i64::from(anchor.year()) + count).ok()?;
                Date::from_calendar_date(year, Month::December, 31).ok()
            }
            PeriodUnit::Quarter => add_months_to_month_end(anchor, count * 3),
            PeriodUnit::Month => add_months_to_month_end(anchor, count),
            PeriodUnit::Week => anchor.checked_add(Duration::weeks(count)),
            PeriodUnit::Day => anchor.checked_add(Duration::days(count)),
        }
    }
}

impl FromStr for Period {
    type Err = SegmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let Some(code) = trimmed.chars().last() else {
            return Err(SegmentError::InvalidPeriod("period must be non-empty".to_string()));
        };
        let unit = match code.to_ascii_uppercase() {
            'A' | 'Y' => PeriodUnit::Year,
            'Q' => PeriodUnit::Quarter,
            'M' => PeriodUnit::Month,
            'W' => PeriodUnit::Week,
            'D' => PeriodUnit::Day,
            _ => {
                return Err(SegmentError::InvalidPeriod(format!(
                    "unknown period unit '{code}' in '{trimmed}' (expected A, Y, Q, M, W, or D)"
                )));
            }
        };
        let digits = &trimmed[.. trimmed.len() - code.len_utf8()];
        let count = if digits.is_empty() {
            1
        } else {
            if !digits.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(SegmentError::InvalidPeriod(format!(
                    "invalid multiplier in '{trimmed}'"
                )));
            }
            digits.parse::<u32>().map_err(|_| {
                SegmentError::InvalidPeriod(format!("invalid multiplier in '{trimmed}'"))
            })?
        };
        Self::new(count, unit)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.unit.code())
        } else {
            write!(f, "{}{}", self.count, self.unit.code())
        }
    }
}

// ============================================================================
// SECTION: Segments
// ============================================================================

/// Inclusive calendar-date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateSegment {
    /// First day of the segment.
    pub start: Date,
    /// Last day of the segment.
    pub end: Date,
}

impl DateSegment {
    /// Returns the segment bounds formatted as `YYYY-MM-DD` strings.
    #[must_use]
    pub fn to_strings(self) -> (String, String) {
        (format_date(self.start), format_date(self.end))
    }
}

impl Serialize for DateSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_strings().serialize(serializer)
    }
}

/// Splits `[start, end]` into period-aligned inclusive segments.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidDateRange`] when `start > end`.
pub fn segment(start: Date, end: Date, period: Period) -> Result<Vec<DateSegment>, SegmentError> {
    if start > end {
        return Err(SegmentError::InvalidDateRange {
            start: format_date(start),
            end: format_date(end),
        });
    }
    let mut boundaries = vec![start];
    let mut anchor = period.first_anchor(start);
    while let Some(date) = anchor {
        if date > end {
            break;
        }
        boundaries.push(date);
        anchor = period.step(date);
    }
    boundaries.push(end);
    boundaries.sort_unstable();
    boundaries.dedup();

    if boundaries.len() == 1 {
        return Ok(vec![DateSegment {
            start,
            end,
        }]);
    }
    let segments = boundaries
        .windows(2)
        .map(|pair| {
            let (lower, upper) = (pair[0], pair[1]);
            let segment_end =
                if upper == end { upper } else { upper.previous_day().unwrap_or(upper) };
            DateSegment {
                start: lower,
                end: segment_end,
            }
        })
        .collect();
    Ok(segments)
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidDate`] when the text is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, SegmentError> {
    parse_iso_date(value.trim())
        .ok_or_else(|| SegmentError::InvalidDate(format!("'{value}' is not a YYYY-MM-DD date")))
}

/// Formats a calendar date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the last day of the given month.
fn month_end(year: i32, month: Month) -> Option<Date> {
    let (next_year, next_month) = if month == Month::December {
        (year.checked_add(1)?, Month::January)
    } else {
        (year, month.next())
    };
    Date::from_calendar_date(next_year, next_month, 1).ok()?.previous_day()
}

/// Moves a month-end date forward by `months` and returns that month's end.
fn add_months_to_month_end(anchor: Date, months: i64) -> Option<Date> {
    let index = i64::from(anchor.year()) * 12 + i64::from(u8::from(anchor.month())) - 1 + months;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u8::try_from(index.rem_euclid(12) + 1).ok()?;
    month_end(year, Month::try_from(month).ok()?)
}

/// Parses a strict `YYYY-MM-DD` date.
fn parse_iso_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year_text = parts.next()?;
    let month_text = parts.next()?;
    let day_text = parts.next()?;
    if parts.next().is_some()
        || year_text.len() != 4
        || month_text.len() != 2
        || day_text.len() != 2
        || ![year_text, month_text, day_text]
            .iter()
            .all(|part| part.chars().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }
    let year: i32 = year_text.parse().ok()?;
    let month: u8 = month_text.parse().ok()?;
    let day: u8 = day_text.parse().ok()?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}
