//! Plan recommendation: totals every eligible plan over the current usage
//! and returns the cheapest.

use std::collections::BTreeSet;

use enumset::EnumSet;
use tokio::task::yield_now;

use crate::{
    catalog::{PlanKey, RatePlan},
    compare,
    error::EngineError,
    prelude::*,
    quantity::{KilowattHours, Usd},
    usage::{Reading, daily_totals},
};

/// Plans the household qualifies for. The EV plan requires a registered
/// electric vehicle.
#[must_use]
pub fn eligible_plans(ev_eligible: bool) -> EnumSet<PlanKey> {
    let mut plans = EnumSet::all();
    if !ev_eligible {
        plans.remove(PlanKey::EvTou5);
    }
    plans
}

/// Rank every eligible plan by total cost, ascending. Uses the same cost
/// formula as the comparison aggregator: energy cost plus the monthly fixed
/// charge once per distinct month.
#[instrument(skip_all, fields(ev_eligible))]
pub async fn rank<'a>(
    readings: impl IntoIterator<Item = &'a Reading>,
    ev_eligible: bool,
) -> Result<Vec<(PlanKey, Usd)>, EngineError> {
    let readings: Vec<&Reading> = readings.into_iter().collect();
    if readings.is_empty() {
        return Err(EngineError::EmptyUsage);
    }
    let months_analyzed = readings
        .iter()
        .map(|reading| reading.month_key.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let totals =
        daily_totals(readings.iter().map(|reading| (reading.date_key.as_str(), reading.consumption)));

    let mut ranked = Vec::new();
    for plan in eligible_plans(ev_eligible) {
        // One yield per plan evaluated so a caller's indicator can repaint.
        yield_now().await;
        let mut energy = Usd::ZERO;
        for &reading in &readings {
            let daily_total =
                totals.get(&reading.date_key).copied().unwrap_or(KilowattHours::ZERO);
            energy += compare::quote_reading(plan, reading, daily_total)?.cost;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = energy + RatePlan::get(plan).monthly_charge * months_analyzed as f64;
        debug!(%plan, %total, "evaluated plan");
        ranked.push((plan, total));
    }
    ranked.sort_by_key(|(_, total)| *total);
    Ok(ranked)
}

/// The two cheapest eligible plans, cheapest first.
pub async fn recommend<'a>(
    readings: impl IntoIterator<Item = &'a Reading>,
    ev_eligible: bool,
) -> Result<[PlanKey; 2], EngineError> {
    let ranked = rank(readings, ev_eligible).await?;
    let mut plans = ranked.into_iter().map(|(plan, _)| plan);
    match (plans.next(), plans.next()) {
        (Some(cheapest), Some(runner_up)) => Ok([cheapest, runner_up]),
        _ => Err(EngineError::EmptyUsage),
    }
}
