//! Given a `YYYYMMDD` date, resolves the set of active `service_id`s:
//! calendar weekday mask + date range, overlaid with per-date exceptions.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::dataset::{Dataset, ExceptionKind};

/// `Sun=0 .. Sat=6`, matching `calendar.txt`'s column order. Fixed rather
/// than locale-configurable.
fn weekday_index(date: NaiveDate) -> usize {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Parse a `YYYYMMDD` string into a [`NaiveDate`]. Callers at the gateway
/// boundary are expected to validate the `^\d{8}$` shape first; this parses
/// the calendar semantics on top of that.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// The set of `service_id`s active on `date_key` (a raw `YYYYMMDD` string,
/// compared lexicographically against `calendar.txt`'s fixed-width range).
pub fn resolve_active_services(dataset: &Dataset, date: NaiveDate) -> HashSet<String> {
    let date_key = date.format("%Y%m%d").to_string();
    let weekday = weekday_index(date);

    let mut active: HashSet<String> = dataset
        .calendars
        .values()
        .filter(|cal| {
            cal.start_date.as_str() <= date_key.as_str()
                && date_key.as_str() <= cal.end_date.as_str()
                && cal.days[weekday]
        })
        .map(|cal| cal.service_id.clone())
        .collect();

    if let Some(exceptions) = dataset.calendar_exceptions_by_date.get(&date_key) {
        for (service_id, kind) in exceptions {
            match kind {
                ExceptionKind::Add => {
                    active.insert(service_id.clone());
                }
                ExceptionKind::Remove => {
                    active.remove(service_id);
                }
            }
        }
    }

    active
}
