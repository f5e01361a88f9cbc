//! Time-bucketed sums (UTC calendar).
//!
//! Only rows with both a date and a non-NaN amount participate. Buckets carry
//! numeric keys; names are attached at render time via `locale`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::domain::{CanonicalRow, DailyPoint, MonthlyPoint, WeekdayPoint};

/// Sum per calendar day, ascending by date.
pub fn daily_totals(rows: &[CanonicalRow]) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, amount) in rows.iter().filter_map(CanonicalRow::dated_amount) {
        *by_day.entry(date.date_naive()).or_insert(0.0) += amount;
    }
    by_day
        .into_iter()
        .map(|(date, total)| DailyPoint { date, total })
        .collect()
}

/// Sum per `(year, month)`, chronological.
pub fn monthly_totals(rows: &[CanonicalRow]) -> Vec<MonthlyPoint> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for (date, amount) in rows.iter().filter_map(CanonicalRow::dated_amount) {
        *by_month.entry((date.year(), date.month())).or_insert(0.0) += amount;
    }
    by_month
        .into_iter()
        .map(|((year, month), total)| MonthlyPoint { year, month, total })
        .collect()
}

/// Sum per day of week, Sunday first; days without sales are omitted.
pub fn weekday_totals(rows: &[CanonicalRow]) -> Vec<WeekdayPoint> {
    let mut by_day: [Option<f64>; 7] = [None; 7];
    for (date, amount) in rows.iter().filter_map(CanonicalRow::dated_amount) {
        let slot = &mut by_day[date.weekday().num_days_from_sunday() as usize];
        *slot = Some(slot.unwrap_or(0.0) + amount);
    }

    let grand_total: f64 = by_day.iter().flatten().sum();
    by_day
        .iter()
        .enumerate()
        .filter_map(|(day, total)| {
            total.map(|total| WeekdayPoint {
                day: day as u32,
                total,
                share: if grand_total > 0.0 { total / grand_total } else { 0.0 },
            })
        })
        .collect()
}
