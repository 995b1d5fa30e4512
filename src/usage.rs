//! Interval usage ingestion.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use itertools::Itertools;
use serde::Serialize;

use crate::{periods::Season, prelude::*, quantity::KilowattHours};

/// One raw input row, as handed over by the CSV front-end. All fields are
/// unparsed strings.
#[derive(Clone, Debug, Default)]
pub struct RawRow {
    pub date: String,
    pub start_time: String,
    pub consumption: String,

    /// Columns beyond the three required ones, keyed by header.
    pub extra: BTreeMap<String, String>,
}

/// An interval reading enriched with the derived classification fields.
#[derive(Clone, Debug, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub consumption: KilowattHours,
    pub hour: u32,
    pub is_weekend: bool,
    pub season: Season,

    /// `YYYY-MM` grouping key.
    pub month_key: String,

    /// `YYYY-MM-DD` grouping key.
    pub date_key: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

const DATETIME_FORMAT: &str = "%m/%d/%Y %I:%M %p";

fn parse_row(row: &RawRow) -> Option<Reading> {
    let date = row.date.trim();
    let time = row.start_time.trim();
    if date.is_empty() || time.is_empty() {
        return None;
    }
    let consumption: f64 = row.consumption.trim().parse().ok()?;
    if !consumption.is_finite() || consumption < 0.0 {
        return None;
    }
    let timestamp = NaiveDateTime::parse_from_str(&format!("{date} {time}"), DATETIME_FORMAT).ok()?;
    Some(Reading {
        timestamp,
        consumption: consumption.into(),
        hour: timestamp.hour(),
        is_weekend: matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun),
        season: Season::from_month0(timestamp.month0()),
        month_key: timestamp.format("%Y-%m").to_string(),
        date_key: timestamp.format("%Y-%m-%d").to_string(),
        extra: row.extra.clone(),
    })
}

/// Parse and enrich raw rows.
///
/// Malformed rows are dropped silently, by policy: partial input must never
/// abort processing of the valid remainder. Only the surviving count is
/// reported.
pub fn ingest(rows: &[RawRow]) -> Vec<Reading> {
    let readings: Vec<Reading> = rows.iter().filter_map(parse_row).collect();
    debug!(surviving = readings.len(), total = rows.len(), "ingested usage rows");
    readings
}

/// Same-day consumption totals keyed by `date_key`, computed once per pass so
/// the tiered baseline check stays O(n) overall.
pub fn daily_totals<'a>(
    items: impl IntoIterator<Item = (&'a str, KilowattHours)>,
) -> HashMap<String, KilowattHours> {
    items.into_iter().map(|(date_key, consumption)| (date_key.to_owned(), consumption)).into_grouping_map().sum()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn row(date: &str, time: &str, consumption: &str) -> RawRow {
        RawRow {
            date: date.to_owned(),
            start_time: time.to_owned(),
            consumption: consumption.to_owned(),
            ..RawRow::default()
        }
    }

    #[test]
    fn test_enrichment() {
        // 2025-03-15 is a Saturday.
        let readings = ingest(&[row("3/15/2025", "11:00 PM", "1.25")]);
        assert_eq!(readings.len(), 1);
        let reading = &readings[0];
        assert_eq!(reading.hour, 23);
        assert!(reading.is_weekend);
        assert_eq!(reading.season, Season::Winter);
        assert_eq!(reading.month_key, "2025-03");
        assert_eq!(reading.date_key, "2025-03-15");
        assert_abs_diff_eq!(f64::from(reading.consumption), 1.25);
    }

    #[test]
    fn test_twelve_hour_clock() {
        let readings = ingest(&[row("6/2/2025", "12:00 AM", "0.5"), row("6/2/2025", "12:30 PM", "0.5")]);
        assert_eq!(readings[0].hour, 0);
        assert_eq!(readings[1].hour, 12);
        assert_eq!(readings[0].season, Season::Summer);
    }

    #[test]
    fn test_malformed_rows_are_dropped_silently() {
        let rows = [
            row("", "1:00 PM", "1.0"),
            row("1/1/2025", "", "1.0"),
            row("1/1/2025", "1:00 PM", "not-a-number"),
            row("1/1/2025", "1:00 PM", "-0.5"),
            row("2/30/2025", "1:00 PM", "1.0"),
            row("1/1/2025", "25:00 PM", "1.0"),
            row("1/1/2025", "1:00 PM", "1.0"),
        ];
        assert_eq!(ingest(&rows).len(), 1);
    }

    #[test]
    fn test_daily_totals() {
        let totals = daily_totals(vec![
            ("2025-01-01", KilowattHours::from(1.0)),
            ("2025-01-01", KilowattHours::from(2.5)),
            ("2025-01-02", KilowattHours::from(4.0)),
        ]);
        assert_abs_diff_eq!(f64::from(totals["2025-01-01"]), 3.5);
        assert_abs_diff_eq!(f64::from(totals["2025-01-02"]), 4.0);
    }
}
