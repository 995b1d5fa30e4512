//! Chart-ready series for an external renderer. No drawing happens here.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::compare::{Comparison, UsageRecord};

/// One labeled series of plain numbers.
#[derive(Clone, Debug, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Shared x-axis labels plus the datasets drawn over them.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SeriesGroup {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ChartData {
    /// Daily kWh stacked by the first-position plan's period label.
    pub daily_usage: SeriesGroup,

    /// Total monthly cost per plan, fixed charges included.
    pub monthly_comparison: SeriesGroup,

    /// Signed monthly savings.
    pub monthly_savings: SeriesGroup,
}

pub fn build(records: &[UsageRecord], comparison: &Comparison) -> ChartData {
    let mut per_day: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
    let mut period_labels: BTreeSet<String> = BTreeSet::new();
    for record in records {
        let label = record.plans[0].period.to_string();
        period_labels.insert(label.clone());
        *per_day
            .entry(record.reading.date_key.as_str())
            .or_default()
            .entry(label)
            .or_default() += f64::from(record.reading.consumption);
    }

    let daily_usage = SeriesGroup {
        labels: per_day.keys().map(|date| (*date).to_owned()).collect(),
        datasets: period_labels
            .into_iter()
            .map(|label| Dataset {
                data: per_day.values().map(|day| day.get(&label).copied().unwrap_or(0.0)).collect(),
                label,
            })
            .collect(),
    };

    let months: Vec<String> =
        comparison.by_month.iter().map(|entry| entry.month.clone()).collect();
    let monthly_comparison = SeriesGroup {
        labels: months.clone(),
        datasets: vec![
            Dataset {
                label: comparison.overall.first.name.to_owned(),
                data: comparison.by_month.iter().map(|entry| f64::from(entry.first_total)).collect(),
            },
            Dataset {
                label: comparison.overall.second.name.to_owned(),
                data: comparison.by_month.iter().map(|entry| f64::from(entry.second_total)).collect(),
            },
        ],
    };
    let monthly_savings = SeriesGroup {
        labels: months,
        datasets: vec![Dataset {
            label: "Monthly Savings".to_owned(),
            data: comparison.by_month.iter().map(|entry| f64::from(entry.savings)).collect(),
        }],
    };

    ChartData { daily_usage, monthly_comparison, monthly_savings }
}
