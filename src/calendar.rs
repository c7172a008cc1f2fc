//! Calendar bucketing shared by every period-based analysis
//!
//! Weeks start on Monday 00:00 (ISO weeks) and months are calendar months.
//! Both the period bucketer and the exercise frequency analysis go through
//! these helpers so their boundaries are identical.

use chrono::{Datelike, Duration, IsoWeek, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalendarPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        CalendarPeriod { start, end }
    }

    /// ISO week containing `date`
    pub fn week_of(date: NaiveDate) -> Self {
        CalendarPeriod::new(start_of_week(date), end_of_week(date))
    }

    /// Calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        CalendarPeriod::new(start_of_month(date), end_of_month(date))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn contains_timestamp(&self, timestamp: NaiveDateTime) -> bool {
        self.contains(timestamp.date())
    }

    /// Number of calendar days, inclusive of both ends
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every date in the period
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Midnight at the start of the first day
    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Last second of the final day
    pub fn end_datetime(&self) -> NaiveDateTime {
        self.end.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1)
    }
}

/// Monday of the ISO week containing `date`
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the ISO week containing `date`
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

/// First day of the month containing `date`
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = start_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Consecutive ISO weeks from the week of `first` through the week of `last`
pub fn weeks_between(first: NaiveDate, last: NaiveDate) -> Vec<CalendarPeriod> {
    let mut weeks = Vec::new();
    let end = end_of_week(last);
    let mut monday = start_of_week(first);

    while monday <= end {
        weeks.push(CalendarPeriod::week_of(monday));
        monday += Duration::days(7);
    }

    weeks
}

/// Consecutive calendar months from the month of `first` through the month of `last`
pub fn months_between(first: NaiveDate, last: NaiveDate) -> Vec<CalendarPeriod> {
    let mut months = Vec::new();
    let end = end_of_month(last);
    let mut current = start_of_month(first);

    while current <= end {
        months.push(CalendarPeriod::month_of(current));
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    months
}

/// Monday 00:00 timestamps within `[start, end]`
pub fn week_boundaries(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    let mut boundaries = Vec::new();
    let mut monday = start_of_week(start.date()).and_time(NaiveTime::MIN);

    while monday <= end {
        if monday >= start {
            boundaries.push(monday);
        }
        monday += Duration::days(7);
    }

    boundaries
}

/// Label like `2024-W10`
pub fn week_label(date: NaiveDate) -> String {
    let week: IsoWeek = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Label like `2024-03`
pub fn month_label(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}
