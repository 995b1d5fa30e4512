//! Pure rate calculation: one interval reading priced under one plan.

use serde::Serialize;

use crate::{
    catalog::{BASELINE_MULTIPLIER, PlanKey, Pricing, RatePlan, baseline_allowance},
    error::EngineError,
    periods::{Period, Season, time_of_use_period},
    quantity::{KilowattHours, Usd, UsdPerKilowattHour},
};

/// The outcome of pricing one interval reading under one plan.
///
/// Invariant: `cost = consumption × rate`, with `rate` already including the
/// baseline credit where one applies.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Quote {
    pub plan: PlanKey,
    pub rate: UsdPerKilowattHour,
    pub cost: Usd,
    pub period: Period,
}

/// Price `consumption` for a single interval under `plan`.
///
/// `daily_total` is the same-day total consumption; it drives the baseline
/// tier check and is ignored by time-of-use plans. Pure and side-effect-free.
pub fn quote(
    plan: &RatePlan,
    hour: u32,
    is_weekend: bool,
    season: Season,
    consumption: KilowattHours,
    daily_total: KilowattHours,
) -> Result<Quote, EngineError> {
    match &plan.pricing {
        Pricing::Tiered { rates, baseline_credit } => {
            let threshold = baseline_allowance(season) * BASELINE_MULTIPLIER;
            let within_baseline = f64::from(daily_total) <= threshold;
            let rates = rates.get(season);
            let (rate, period) = if within_baseline {
                let credited = baseline_credit.map_or(rates.tier1, |credit| rates.tier1 + credit);
                (credited, Period::Tier1)
            } else {
                (rates.tier2, Period::Tier2)
            };
            Ok(Quote { plan: plan.key, rate, cost: consumption * rate, period })
        }
        Pricing::TimeOfUse { rates } => {
            let period = time_of_use_period(plan, season, hour, is_weekend);
            let season_rates = rates.get(season);
            let rate = match period {
                Period::OnPeak => Some(season_rates.on_peak),
                Period::OffPeak => Some(season_rates.off_peak),
                Period::SuperOffPeak => season_rates.super_off_peak,
                Period::Tier1 | Period::Tier2 => None,
            }
            .ok_or(EngineError::MissingRate { plan: plan.key, season, period })?;
            Ok(Quote { plan: plan.key, rate, cost: consumption * rate, period })
        }
    }
}
