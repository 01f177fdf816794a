// Summary statistics over a tag's entries.
//
// Purpose
// - Merge entries into per-day totals and derive the averages shown next to a tally.
//
// Responsibilities
// - Stay pure: the current instant is an argument, never read from the clock here.
// - Days are bucketed in UTC.

use crate::core::tally::entry::Entry;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallySummary {
    pub total_today: f64,
    pub avg_7_days: f64,
    pub avg_30_days: f64,
    pub avg_this_week: f64,
    pub avg_this_month: f64,
    pub total: f64,
}

/// One entry per UTC day holding the summed count, most recent day first.
pub fn merge_days(entries: &[Entry]) -> Vec<Entry> {
    let mut days: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    for entry in entries {
        *days.entry(start_of_day(entry.date)).or_default() += entry.count;
    }
    days.into_iter()
        .rev()
        .map(|(date, count)| Entry::new(count, date))
        .collect()
}

pub fn summarize(entries: &[Entry], now: DateTime<Utc>) -> TallySummary {
    let merged = merge_days(entries);
    let within = |days: i64| {
        let since = now - Duration::days(days);
        merged.iter().filter(move |day| day.date > since)
    };

    let weekday = i64::from(now.weekday().num_days_from_sunday());
    let day_of_month = i64::from(now.day());

    TallySummary {
        total_today: within(1).map(|day| day.count).next().unwrap_or(0.0),
        avg_7_days: sum(within(7)) / 7.0,
        avg_30_days: sum(within(30)) / 30.0,
        avg_this_week: average(sum(within(weekday.min(7))), weekday),
        avg_this_month: average(sum(within(day_of_month.min(30))), day_of_month),
        total: sum(entries.iter()),
    }
}

/// Rounds to one decimal for display.
pub fn tally_round(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn start_of_day(date: DateTime<Utc>) -> DateTime<Utc> {
    date.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn sum<'a>(days: impl Iterator<Item = &'a Entry>) -> f64 {
    days.fold(0.0, |total, day| total + day.count)
}

fn average(total: f64, days: i64) -> f64 {
    if days == 0 { 0.0 } else { total / days as f64 }
}
