//! Date utilities for the daily reset hour.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};

/// Study day for `now` given the hour (0-23) at which a new day begins.
///
/// Before the reset hour the learner is still on the previous day, so late
/// night reviews count towards it.
pub fn study_day<Tz: TimeZone>(daily_reset_hour: u32, now: &DateTime<Tz>) -> NaiveDate {
    if now.hour() < daily_reset_hour {
        (now.clone() - Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    }
}

/// Today's study day in local time.
pub fn today(daily_reset_hour: u32) -> NaiveDate {
    study_day(daily_reset_hour, &Local::now())
}
