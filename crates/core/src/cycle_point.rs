// SPDX-License-Identifier: MIT

//! `CyclePoint` algebra: an opaque, totally ordered date-time value with a
//! pluggable calendar, plus ISO-8601-ish duration offsets.
//!
//! Graph compilation and user-facing calendar parsing are out of scope
//! (spec.md §1); this module only needs to support `equals`, `less`,
//! `parse`, `format`, and `addOffset` for the engine's own bookkeeping
//! (runahead bounds, sequence stepping, clock/expire offsets).

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BadPoint {
    #[error("malformed cycle point: {0}")]
    Malformed(String),
    #[error("cycle point out of range: {0}")]
    OutOfRange(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BadSequence {
    #[error("malformed offset/duration: {0}")]
    Malformed(String),
    #[error("sequence step must be non-zero and positive")]
    NonAdvancingStep,
}

/// The calendar a workflow's points are interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calendar {
    /// Standard proleptic Gregorian calendar.
    Gregorian,
    /// 360-day calendar: 12 months of 30 days each (common in climate modelling).
    Days360,
}

impl Calendar {
    fn days_in_month(self, year: i32, month: u32) -> u32 {
        match self {
            Calendar::Days360 => 30,
            Calendar::Gregorian => gregorian_days_in_month(year, month),
        }
    }

    fn to_linear_days(self, year: i32, month: u32, day: u32) -> i64 {
        match self {
            Calendar::Days360 => {
                i64::from(year) * 360 + i64::from(month - 1) * 30 + i64::from(day - 1)
            }
            Calendar::Gregorian => chrono::NaiveDate::from_ymd_opt(year, month, day)
                .map(|d| i64::from(d.num_days_from_ce()))
                .unwrap_or(0),
        }
    }

    fn from_linear_days(self, days: i64) -> (i32, u32, u32) {
        match self {
            Calendar::Days360 => {
                let year = days.div_euclid(360) as i32;
                let rem = days.rem_euclid(360);
                let month = (rem / 30) as u32 + 1;
                let day = (rem % 30) as u32 + 1;
                (year, month, day)
            }
            Calendar::Gregorian => {
                let date = chrono::NaiveDate::from_num_days_from_ce_opt(days as i32)
                    .unwrap_or_else(|| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
                (date.year(), date.month(), date.day())
            }
        }
    }
}

fn gregorian_days_in_month(year: i32, month: u32) -> u32 {
    use chrono::Datelike;
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next = chrono::NaiveDate::from_ymd_opt(ny, nm, 1).expect("valid next-month anchor");
    let this = chrono::NaiveDate::from_ymd_opt(year, month, 1).expect("valid this-month anchor");
    (next - this).num_days() as u32
}

/// An opaque, totally ordered cycle point: a date-time on some [`Calendar`].
///
/// Comparison (`PartialOrd`/`Ord`) and equality intentionally ignore the
/// `calendar` tag: a workflow's points all share one calendar by
/// construction, so two points with the same field values are the same
/// point regardless of which calendar produced them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CyclePoint {
    pub calendar: Calendar,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CyclePoint {
    pub fn new(calendar: Calendar, year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self { calendar, year, month, day, hour, minute, second }
    }

    fn key(&self) -> (i32, u32, u32, u32, u32, u32) {
        (self.year, self.month, self.day, self.hour, self.minute, self.second)
    }

    /// Parse `YYYY-MM-DDTHH:MM:SSZ` (gregorian by default).
    pub fn parse(s: &str, calendar: Calendar) -> Result<Self, BadPoint> {
        let s = s.trim().trim_end_matches('Z');
        let (date_part, time_part) = s.split_once('T').ok_or_else(|| BadPoint::Malformed(s.to_string()))?;
        let mut date_fields = date_part.split('-');
        let year: i32 = date_fields
            .next()
            .ok_or_else(|| BadPoint::Malformed(s.to_string()))?
            .parse()
            .map_err(|_| BadPoint::Malformed(s.to_string()))?;
        let month: u32 = date_fields
            .next()
            .ok_or_else(|| BadPoint::Malformed(s.to_string()))?
            .parse()
            .map_err(|_| BadPoint::Malformed(s.to_string()))?;
        let day: u32 = date_fields
            .next()
            .ok_or_else(|| BadPoint::Malformed(s.to_string()))?
            .parse()
            .map_err(|_| BadPoint::Malformed(s.to_string()))?;
        let mut time_fields = time_part.split(':');
        let hour: u32 = time_fields
            .next()
            .ok_or_else(|| BadPoint::Malformed(s.to_string()))?
            .parse()
            .map_err(|_| BadPoint::Malformed(s.to_string()))?;
        let minute: u32 = time_fields.next().unwrap_or("00").parse().map_err(|_| BadPoint::Malformed(s.to_string()))?;
        let second: u32 = time_fields.next().unwrap_or("00").parse().map_err(|_| BadPoint::Malformed(s.to_string()))?;
        if month == 0 || month > 12 || day == 0 || day > calendar.days_in_month(year, month) || hour > 23 || minute > 59 || second > 59 {
            return Err(BadPoint::OutOfRange(s.to_string()));
        }
        Ok(Self { calendar, year, month, day, hour, minute, second })
    }

    pub fn format(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Add a [`CycleOffset`] to this point, carrying across unit boundaries.
    pub fn add_offset(&self, offset: &CycleOffset) -> Self {
        // Years/months first, clamping the day to the target month's length.
        let mut year = self.year;
        let mut month = self.month as i64 + i64::from(offset.months) + i64::from(offset.years) * 12;
        year += ((month - 1).div_euclid(12)) as i32;
        month = (month - 1).rem_euclid(12) + 1;
        let month = month as u32;
        let max_day = self.calendar.days_in_month(year, month);
        let day = self.day.min(max_day);

        // Days/hours/minutes/seconds via a linear timestamp so carries are exact.
        let linear_days = self.calendar.to_linear_days(year, month, day);
        let total_seconds = i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second)
            + i64::from(offset.hours) * 3600
            + i64::from(offset.minutes) * 60
            + i64::from(offset.seconds)
            + i64::from(offset.days) * 86400;

        let day_carry = total_seconds.div_euclid(86400);
        let secs_of_day = total_seconds.rem_euclid(86400);
        let (year, month, day) = self.calendar.from_linear_days(linear_days + day_carry);

        Self {
            calendar: self.calendar,
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u32,
            minute: ((secs_of_day % 3600) / 60) as u32,
            second: (secs_of_day % 60) as u32,
        }
    }
}

impl PartialEq for CyclePoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for CyclePoint {}

impl PartialOrd for CyclePoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for CyclePoint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::hash::Hash for CyclePoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for CyclePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// An ISO-8601-ish duration offset: `[-]P[nY][nM][nD][T[nH][nM][nS]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleOffset {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
}

impl CycleOffset {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn hours(h: i32) -> Self {
        Self { hours: h, ..Self::default() }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// True if this offset is non-negative in every component and advances time.
    pub fn is_positive(&self) -> bool {
        let secs = self.total_seconds_approx();
        secs > 0
    }

    /// Rough total seconds, treating a month as 30 days and a year as 365 — used
    /// only for ordering/comparison heuristics (e.g. "is this the larger of two
    /// poll intervals"), never for exact point arithmetic.
    pub fn total_seconds_approx(&self) -> i64 {
        i64::from(self.years) * 365 * 86400
            + i64::from(self.months) * 30 * 86400
            + i64::from(self.days) * 86400
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds)
    }

    pub fn parse(s: &str) -> Result<Self, BadSequence> {
        let (sign, rest) = if let Some(r) = s.strip_prefix('-') { (-1, r) } else { (1, s) };
        let rest = rest.strip_prefix('P').ok_or_else(|| BadSequence::Malformed(s.to_string()))?;
        let (date_part, time_part) = match rest.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (rest, None),
        };
        let mut offset = CycleOffset::default();
        parse_duration_fields(date_part, &mut [('Y', &mut offset.years), ('M', &mut offset.months), ('D', &mut offset.days)], s)?;
        if let Some(t) = time_part {
            parse_duration_fields(t, &mut [('H', &mut offset.hours), ('M', &mut offset.minutes), ('S', &mut offset.seconds)], s)?;
        }
        if sign < 0 {
            offset.years = -offset.years;
            offset.months = -offset.months;
            offset.days = -offset.days;
            offset.hours = -offset.hours;
            offset.minutes = -offset.minutes;
            offset.seconds = -offset.seconds;
        }
        Ok(offset)
    }
}

fn parse_duration_fields(s: &str, fields: &mut [(char, &mut i32)], original: &str) -> Result<(), BadSequence> {
    let mut rest = s;
    while !rest.is_empty() {
        let digit_end = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(|| BadSequence::Malformed(original.to_string()))?;
        if digit_end == 0 {
            return Err(BadSequence::Malformed(original.to_string()));
        }
        let number: i32 = rest[..digit_end].parse().map_err(|_| BadSequence::Malformed(original.to_string()))?;
        let unit = rest[digit_end..].chars().next().ok_or_else(|| BadSequence::Malformed(original.to_string()))?;
        let slot = fields.iter_mut().find(|(c, _)| *c == unit).ok_or_else(|| BadSequence::Malformed(original.to_string()))?;
        *slot.1 = number;
        rest = &rest[digit_end + unit.len_utf8()..];
    }
    Ok(())
}

impl fmt::Display for CycleOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "PT0S");
        }
        let negative = self.total_seconds_approx() < 0;
        let abs = CycleOffset {
            years: self.years.abs(),
            months: self.months.abs(),
            days: self.days.abs(),
            hours: self.hours.abs(),
            minutes: self.minutes.abs(),
            seconds: self.seconds.abs(),
        };
        if negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if abs.years != 0 {
            write!(f, "{}Y", abs.years)?;
        }
        if abs.months != 0 {
            write!(f, "{}M", abs.months)?;
        }
        if abs.days != 0 {
            write!(f, "{}D", abs.days)?;
        }
        if abs.hours != 0 || abs.minutes != 0 || abs.seconds != 0 {
            write!(f, "T")?;
            if abs.hours != 0 {
                write!(f, "{}H", abs.hours)?;
            }
            if abs.minutes != 0 {
                write!(f, "{}M", abs.minutes)?;
            }
            if abs.seconds != 0 {
                write!(f, "{}S", abs.seconds)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "cycle_point_tests.rs"]
mod tests;
