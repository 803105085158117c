//! Time-range filtering for usage records
//!
//! A [`TimeFilter`] is an immutable predicate over record timestamps. It is
//! built either from a named [`RangePreset`] resolved against "now" at
//! construction time, or from explicit bounds. All windows are half-open
//! `[start, end)`: a timestamp exactly at the end boundary falls into the
//! next window, never into two adjacent ones.
//!
//! # Examples
//!
//! ```
//! use ccmon::time_filter::{RangePreset, TimeFilter};
//! use chrono::{TimeZone, Utc};
//!
//! let now = Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap();
//! let filter = TimeFilter::from_preset_at(RangePreset::Today, now);
//! assert!(filter.includes(&now));
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use std::fmt;
use std::str::FromStr;

/// Named time window, resolved against "now" when a filter is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePreset {
    /// Current calendar day
    Today,
    /// Current ISO week, starting Monday
    Week,
    /// Current calendar month
    Month,
    /// Current calendar quarter
    Quarter,
    /// Current calendar year
    Year,
    /// No time restriction
    #[default]
    All,
}

impl RangePreset {
    /// Parse a preset, mapping unrecognized input to `All`
    ///
    /// The engine treats unknown presets as "no restriction"; strict
    /// validation is the caller's concern via [`FromStr`].
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!("Unrecognized time range {:?}, defaulting to all", s);
            Self::All
        })
    }
}

impl FromStr for RangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(format!("Invalid time range: {s}")),
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Quarter => write!(f, "quarter"),
            Self::Year => write!(f, "year"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Immutable predicate over record timestamps
///
/// `All` is represented by both bounds being `None`; there is no sentinel
/// instant that could collide with a real window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeFilter {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeFilter {
    /// A filter that includes every timestamp
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from a preset resolved against the current instant
    pub fn from_preset(preset: RangePreset) -> Self {
        Self::from_preset_at(preset, Utc::now())
    }

    /// Build from a preset resolved against an explicit "now"
    ///
    /// Calendar windows are computed in UTC from the date of `now`; each
    /// window ends at the start of the next period, exclusive.
    pub fn from_preset_at(preset: RangePreset, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();

        let (start, end) = match preset {
            RangePreset::All => return Self::all(),
            RangePreset::Today => (today, today + Duration::days(1)),
            RangePreset::Week => {
                let monday = today.week(Weekday::Mon).first_day();
                (monday, monday + Duration::days(7))
            }
            RangePreset::Month => {
                let first = month_start(today.year(), today.month());
                (first, next_month_start(today.year(), today.month()))
            }
            RangePreset::Quarter => {
                let quarter_month = ((today.month() - 1) / 3) * 3 + 1;
                let first = month_start(today.year(), quarter_month);
                let end = if quarter_month == 10 {
                    month_start(today.year() + 1, 1)
                } else {
                    month_start(today.year(), quarter_month + 3)
                };
                (first, end)
            }
            RangePreset::Year => (
                month_start(today.year(), 1),
                month_start(today.year() + 1, 1),
            ),
        };

        Self {
            start: Some(day_start(start)),
            end: Some(day_start(end)),
        }
    }

    /// Build from explicit instants; either bound may be open
    pub fn with_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whether a timestamp falls inside the window `[start, end)`
    pub fn includes(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(start) = &self.start
            && timestamp < start
        {
            return false;
        }
        if let Some(end) = &self.end
            && timestamp >= end
        {
            return false;
        }
        true
    }

    /// Inclusive start bound, if any
    pub fn start(&self) -> Option<&DateTime<Utc>> {
        self.start.as_ref()
    }

    /// Exclusive end bound, if any
    pub fn end(&self) -> Option<&DateTime<Utc>> {
        self.end.as_ref()
    }
}

fn month_start(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of a valid month")
}

fn next_month_start(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
}
