//! Calendar helpers: Brasília clock, month arithmetic and date intervals.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::{America::Sao_Paulo, Tz};
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("months must be between 1 and 12, got {0}")]
    InvalidMonths(i32),
    #[error("At least one of start or end must be provided.")]
    InvalidInterval,
    #[error("End date cannot be before start date.")]
    EndDateBeforeStart,
    #[error("resulting date is out of range")]
    OutOfRange,
}

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

pub fn brasilia_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Sao_Paulo)
}

pub fn brasilia_today() -> NaiveDate {
    brasilia_now().date_naive()
}

/// Reads a wall-clock time as Brasília local time.
pub fn assume_brasilia(naive: NaiveDateTime) -> DateTime<Utc> {
    match Sao_Paulo.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Only reachable inside a DST gap; fall back to the standard offset.
        None => Utc.from_utc_datetime(&(naive + chrono::Duration::hours(3))),
    }
}

/// Calendar day of `instant` on the Brasília clock.
pub fn brasilia_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Sao_Paulo).date_naive()
}

/// UTC instants of the first and last microsecond of `day` in Brasília.
pub fn local_day_bounds_utc(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = assume_brasilia(day.and_time(NaiveTime::MIN));
    let end_time = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    let end = assume_brasilia(day.and_time(end_time));
    (start, end)
}

/// Same day of next month, clamped to the month's last day.
pub fn this_day_next_month(reference: NaiveDate) -> NaiveDate {
    reference
        .checked_add_months(Months::new(1))
        .unwrap_or(reference)
}

/// Adds between 1 and 12 months, clamping the day to the target month.
pub fn add_months_to_date(date: NaiveDate, months: i32) -> Result<NaiveDate, DateError> {
    if !(1..=12).contains(&months) {
        return Err(DateError::InvalidMonths(months));
    }
    date.checked_add_months(Months::new(months as u32))
        .ok_or(DateError::OutOfRange)
}

/// Signed variant of [`add_months_to_date`] without the 12-month cap.
pub fn add_or_subtract_months_to_date(date: NaiveDate, months: i32) -> Result<NaiveDate, DateError> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or(DateError::OutOfRange)
}

/// First and last day of the month containing `date`.
pub fn current_month_range(date: NaiveDate) -> Interval<NaiveDate> {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date);
    Interval {
        start: Some(first),
        end: Some(last),
    }
}

/// `dd/mm/yy`, the format used in user-facing messages.
pub fn format_short(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

// ---------- Interval ----------

/// Closed interval where either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval<T> {
    start: Option<T>,
    end: Option<T>,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(start: Option<T>, end: Option<T>) -> Result<Self, DateError> {
        match (start, end) {
            (None, None) => Err(DateError::InvalidInterval),
            (Some(s), Some(e)) if s > e => Err(DateError::EndDateBeforeStart),
            _ => Ok(Interval { start, end }),
        }
    }

    pub fn start(&self) -> Option<T> {
        self.start
    }

    pub fn end(&self) -> Option<T> {
        self.end
    }

    pub fn contains(&self, value: T) -> bool {
        match (self.start, self.end) {
            (Some(s), Some(e)) => s <= value && value <= e,
            (Some(s), None) => s <= value,
            (None, Some(e)) => value <= e,
            (None, None) => false,
        }
    }
}

// ---------- serde ----------

/// Accepts RFC 3339 timestamps or naive ones, which are read as Brasília time.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
        return Some(aware.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(assume_brasilia)
}

pub fn deserialize_local_or_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).ok_or_else(|| de::Error::custom(format!("invalid datetime: {raw}")))
}

pub fn deserialize_opt_local_or_utc<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid datetime: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn next_month_clamps_to_month_end() {
        assert_eq!(this_day_next_month(d(2024, 1, 31)), d(2024, 2, 29));
        assert_eq!(this_day_next_month(d(2024, 12, 15)), d(2025, 1, 15));
    }

    #[test]
    fn signed_month_shift() {
        assert_eq!(add_or_subtract_months_to_date(d(2025, 9, 30), 3).unwrap(), d(2025, 12, 30));
        assert_eq!(add_or_subtract_months_to_date(d(2025, 3, 31), -1).unwrap(), d(2025, 2, 28));
        assert_eq!(add_or_subtract_months_to_date(d(2025, 3, 31), 0).unwrap(), d(2025, 3, 31));
    }

    #[test]
    fn interval_requires_a_bound() {
        assert_eq!(
            Interval::<NaiveDate>::new(None, None),
            Err(DateError::InvalidInterval)
        );
        assert_eq!(
            Interval::new(Some(d(2024, 2, 1)), Some(d(2024, 1, 1))),
            Err(DateError::EndDateBeforeStart)
        );
    }

    #[test]
    fn open_interval_contains() {
        let from = Interval::new(Some(d(2024, 1, 1)), None).unwrap();
        assert!(from.contains(d(2030, 1, 1)));
        assert!(!from.contains(d(2023, 12, 31)));

        let until = Interval::new(None, Some(d(2024, 1, 1))).unwrap();
        assert!(until.contains(d(2024, 1, 1)));
        assert!(!until.contains(d(2024, 1, 2)));
    }

    #[test]
    fn naive_timestamps_are_brasilia() {
        let parsed = parse_datetime("2024-05-10T20:00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-10T23:00:00+00:00");

        let aware = parse_datetime("2024-05-10T20:00:00Z").unwrap();
        assert_eq!(aware.to_rfc3339(), "2024-05-10T20:00:00+00:00");

        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn day_bounds_cover_the_local_day() {
        let (start, end) = local_day_bounds_utc(d(2024, 5, 10));
        assert_eq!(start.to_rfc3339(), "2024-05-10T03:00:00+00:00");
        assert!(end > start);
        assert_eq!(end.date_naive(), d(2024, 5, 11));
    }
}
