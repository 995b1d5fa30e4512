//! Comparison aggregation: prices every reading under the two selected plans
//! and rolls the results into the overall, per-period, and per-month views.

use std::collections::BTreeSet;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    catalog::{PlanKey, RatePlan},
    error::EngineError,
    periods::{Period, Season},
    prelude::*,
    quantity::{KilowattHours, Usd, UsdPerKilowattHour},
    rate::{self, Quote},
    usage::{Reading, daily_totals},
};

/// A costed interval record: the reading plus its quote under each of the two
/// compared plans, kept in canonical order (cheaper plan second).
#[derive(Clone, Debug, Serialize)]
pub struct UsageRecord {
    #[serde(flatten)]
    pub reading: Reading,
    pub plans: [Quote; 2],
}

/// One plan's share of the overall view.
#[derive(Clone, Debug, Serialize)]
pub struct PlanTotal {
    pub plan: PlanKey,
    pub name: &'static str,
    pub total_cost: Usd,
    pub average_rate: UsdPerKilowattHour,
}

/// Overall totals across the whole record set.
#[derive(Clone, Debug, Serialize)]
pub struct Overall {
    pub first: PlanTotal,
    pub second: PlanTotal,
    pub total_kwh: KilowattHours,

    /// Signed; positive means the second-position plan is cheaper.
    pub total_savings: Usd,
    pub cheaper: PlanKey,

    /// Count of distinct `YYYY-MM` keys, never the day span or row count.
    pub months_analyzed: usize,
}

/// Totals for one (season, first-plan period) group.
#[derive(Clone, Debug, Serialize)]
pub struct PeriodBreakdown {
    pub season: Season,
    pub period: Period,
    pub consumption: KilowattHours,
    pub first_cost: Usd,
    pub second_cost: Usd,
    pub cost_difference: Usd,
    pub first_average_rate: UsdPerKilowattHour,
    pub second_average_rate: UsdPerKilowattHour,
}

/// Totals for one calendar month, fixed charges included once.
#[derive(Clone, Debug, Serialize)]
pub struct MonthBreakdown {
    pub month: String,
    pub consumption: KilowattHours,
    pub first_fixed_charge: Usd,
    pub second_fixed_charge: Usd,
    pub first_total: Usd,
    pub second_total: Usd,

    /// Signed; positive means the second-position plan is cheaper this month.
    pub savings: Usd,
}

/// The three derived views, recomputed wholesale on every aggregation pass.
#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub overall: Overall,
    pub by_period: Vec<PeriodBreakdown>,
    pub by_month: Vec<MonthBreakdown>,
}

/// Validate a plan selection for a comparison run: exactly two distinct keys.
pub fn selected_pair(plans: &[PlanKey]) -> Result<(PlanKey, PlanKey), EngineError> {
    match *plans {
        [first, second] if first != second => Ok((first, second)),
        _ => Err(EngineError::Selection),
    }
}

/// Price every reading under both plans and build the aggregate views.
#[instrument(skip_all, fields(n_readings = readings.len(), %first, %second))]
pub fn evaluate(
    readings: Vec<Reading>,
    first: PlanKey,
    second: PlanKey,
) -> Result<(Vec<UsageRecord>, Comparison), EngineError> {
    if first == second {
        return Err(EngineError::Selection);
    }
    let totals =
        daily_totals(readings.iter().map(|reading| (reading.date_key.as_str(), reading.consumption)));
    let mut records = Vec::with_capacity(readings.len());
    for reading in readings {
        let daily_total = totals.get(&reading.date_key).copied().unwrap_or(KilowattHours::ZERO);
        let plans = [
            quote_reading(first, &reading, daily_total)?,
            quote_reading(second, &reading, daily_total)?,
        ];
        records.push(UsageRecord { reading, plans });
    }
    let comparison = aggregate(&mut records, first, second);
    Ok((records, comparison))
}

pub(crate) fn quote_reading(
    plan: PlanKey,
    reading: &Reading,
    daily_total: KilowattHours,
) -> Result<Quote, EngineError> {
    rate::quote(
        RatePlan::get(plan),
        reading.hour,
        reading.is_weekend,
        reading.season,
        reading.consumption,
        daily_total,
    )
}

/// Re-derive the three views from costed records.
///
/// Canonical ordering is a documented post-condition: after this call,
/// `records[i].plans[1]` and [`Overall::second`] refer to the cheaper plan
/// regardless of argument order, and ties keep the caller's order.
pub fn aggregate(records: &mut [UsageRecord], first: PlanKey, second: PlanKey) -> Comparison {
    let months_analyzed = records
        .iter()
        .map(|record| record.reading.month_key.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let (first, second) =
        if plan_total(records, first, months_analyzed) < plan_total(records, second, months_analyzed) {
            (second, first)
        } else {
            (first, second)
        };
    for record in records.iter_mut() {
        if record.plans[0].plan != first {
            record.plans.swap(0, 1);
        }
    }

    Comparison {
        overall: build_overall(records, first, second, months_analyzed),
        by_period: build_by_period(records),
        by_month: build_by_month(records, first, second),
    }
}

/// Total cost of `plan` over the records: per-interval energy cost plus the
/// monthly fixed charge once per analyzed month.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn plan_total(records: &[UsageRecord], plan: PlanKey, months_analyzed: usize) -> Usd {
    let energy: Usd = records.iter().map(|record| quote_for(record, plan).cost).sum();
    energy + RatePlan::get(plan).monthly_charge * months_analyzed as f64
}

fn quote_for(record: &UsageRecord, plan: PlanKey) -> &Quote {
    if record.plans[0].plan == plan { &record.plans[0] } else { &record.plans[1] }
}

fn average_rate(total: Usd, kwh: KilowattHours) -> UsdPerKilowattHour {
    if kwh > KilowattHours::ZERO { total / kwh } else { UsdPerKilowattHour::ZERO }
}

fn build_overall(
    records: &[UsageRecord],
    first: PlanKey,
    second: PlanKey,
    months_analyzed: usize,
) -> Overall {
    let total_kwh: KilowattHours = records.iter().map(|record| record.reading.consumption).sum();
    let first_total = plan_total(records, first, months_analyzed);
    let second_total = plan_total(records, second, months_analyzed);
    let total_savings = first_total - second_total;
    Overall {
        first: PlanTotal {
            plan: first,
            name: RatePlan::get(first).name,
            total_cost: first_total,
            average_rate: average_rate(first_total, total_kwh),
        },
        second: PlanTotal {
            plan: second,
            name: RatePlan::get(second).name,
            total_cost: second_total,
            average_rate: average_rate(second_total, total_kwh),
        },
        total_kwh,
        total_savings,
        cheaper: if total_savings > Usd::ZERO { second } else { first },
        months_analyzed,
    }
}

fn build_by_period(records: &[UsageRecord]) -> Vec<PeriodBreakdown> {
    let mut by_period: Vec<PeriodBreakdown> = records
        .iter()
        .into_group_map_by(|record| (record.reading.season, record.plans[0].period))
        .into_iter()
        .map(|((season, period), group)| {
            let consumption: KilowattHours =
                group.iter().map(|record| record.reading.consumption).sum();
            let first_cost: Usd = group.iter().map(|record| record.plans[0].cost).sum();
            let second_cost: Usd = group.iter().map(|record| record.plans[1].cost).sum();
            PeriodBreakdown {
                season,
                period,
                consumption,
                first_cost,
                second_cost,
                cost_difference: first_cost - second_cost,
                first_average_rate: average_rate(first_cost, consumption),
                second_average_rate: average_rate(second_cost, consumption),
            }
        })
        .collect();
    by_period.sort_by_key(|entry| (entry.season, entry.period.to_string()));
    by_period
}

fn build_by_month(records: &[UsageRecord], first: PlanKey, second: PlanKey) -> Vec<MonthBreakdown> {
    let first_charge = RatePlan::get(first).monthly_charge;
    let second_charge = RatePlan::get(second).monthly_charge;
    let mut by_month: Vec<MonthBreakdown> = records
        .iter()
        .into_group_map_by(|record| record.reading.month_key.as_str())
        .into_iter()
        .map(|(month, group)| {
            let consumption: KilowattHours =
                group.iter().map(|record| record.reading.consumption).sum();
            let first_cost: Usd = group.iter().map(|record| record.plans[0].cost).sum();
            let second_cost: Usd = group.iter().map(|record| record.plans[1].cost).sum();
            MonthBreakdown {
                month: month.to_owned(),
                consumption,
                first_fixed_charge: first_charge,
                second_fixed_charge: second_charge,
                first_total: first_cost + first_charge,
                second_total: second_cost + second_charge,
                savings: first_cost + first_charge - second_cost - second_charge,
            }
        })
        .collect();
    by_month.sort_by(|a, b| a.month.cmp(&b.month));
    by_month
}
