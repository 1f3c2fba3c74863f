//! Named date filters and the concrete windows they resolve to.
//!
//! Every window is computed on the wall clock of one fixed UTC offset
//! (IST by default) and expressed as an inclusive pair of UTC instants.
//! The end of a window is the last nanosecond of its span.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::error::InvalidRangeError;

/// Custom bounds must fall in these years so window arithmetic cannot overflow.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// A filter as chosen in the report controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    /// No restriction.
    #[default]
    All,
    /// The current local day.
    Today,
    /// Sunday 00:00 of the current local week through the following Saturday.
    Week,
    /// The first through the last day of the current local month.
    Month,
    /// An explicit inclusive range of local dates.
    Custom { start: NaiveDate, end: NaiveDate },
}

impl DateFilter {
    /// Parse a filter token plus, for `custom`, its `YYYY-MM-DD` bounds.
    ///
    /// Empty and `all` tokens mean no restriction.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRangeError`] for unknown tokens and for custom ranges
    /// that are incomplete, unparsable, or end before they start.
    pub fn parse(
        token: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, InvalidRangeError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "custom" => {
                let start = parse_bound("start", start)?;
                let end = parse_bound("end", end)?;
                Self::custom(start, end)
            }
            other => Err(InvalidRangeError::UnknownFilter(other.to_owned())),
        }
    }

    /// Build a custom filter.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRangeError::OutOfRange`] for a bound outside years
    /// 1-9999 and [`InvalidRangeError::EndBeforeStart`] if `end < start`.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidRangeError> {
        let outside = [start, end]
            .into_iter()
            .find(|d| !SUPPORTED_YEARS.contains(&d.year()));
        if let Some(date) = outside {
            return Err(InvalidRangeError::OutOfRange(date));
        }
        if end < start {
            return Err(InvalidRangeError::EndBeforeStart { start, end });
        }
        Ok(Self::Custom { start, end })
    }

    /// Resolve against the current instant. `None` means every order passes.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateWindow> {
        let today = now.with_timezone(&offset).date_naive();

        let (first_day, next_first_day) = match *self {
            Self::All => return None,
            Self::Today => (today, today + TimeDelta::days(1)),
            Self::Week => {
                let sunday =
                    today - TimeDelta::days(i64::from(today.weekday().num_days_from_sunday()));
                (sunday, sunday + TimeDelta::days(7))
            }
            Self::Month => {
                let first = today - TimeDelta::days(i64::from(today.day0()));
                let next = first
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX);
                (first, next)
            }
            Self::Custom { start, end } => (start, end + TimeDelta::days(1)),
        };

        Some(DateWindow {
            start: local_midnight(first_day, offset),
            end: local_midnight(next_first_day, offset) - TimeDelta::nanoseconds(1),
        })
    }

    /// Short identifier used in export file names.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::All => "all".to_owned(),
            Self::Today => "today".to_owned(),
            Self::Week => "week".to_owned(),
            Self::Month => "month".to_owned(),
            Self::Custom { start, end } => {
                format!("{}_{}", start.format("%Y%m%d"), end.format("%Y%m%d"))
            }
        }
    }
}

fn parse_bound(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, InvalidRangeError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(InvalidRangeError::MissingBound(field))?;

    let unparsable = || InvalidRangeError::Unparsable {
        field,
        value: raw.to_owned(),
    };

    // chrono also accepts signed and extended years; only plain YYYY is allowed
    let plain_year = raw.len() == 10 && raw.bytes().take(4).all(|b| b.is_ascii_digit());
    if !plain_year {
        return Err(unparsable());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| unparsable())
}

/// The UTC instant of 00:00 on `date` in the given offset.
fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    (local - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// An inclusive `[start, end]` interval of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Whether `instant` lies inside the window, boundaries included.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
