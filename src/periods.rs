//! Season and rate-period classification.

use std::str::FromStr;

use serde::Serialize;

use crate::{
    catalog::{PlanKey, RatePlan},
    prelude::*,
};

/// Billing season. Summer runs June through October, fixed for every plan.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[display("summer")]
    Summer,

    #[display("winter")]
    Winter,
}

impl Season {
    /// Classify a 0-indexed month (January = 0).
    pub const fn from_month0(month0: u32) -> Self {
        if month0 >= 5 && month0 <= 9 { Self::Summer } else { Self::Winter }
    }
}

impl FromStr for Season {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("summer") {
            Ok(Self::Summer)
        } else if s.eq_ignore_ascii_case("winter") {
            Ok(Self::Winter)
        } else {
            bail!("expected `summer` or `winter`, got `{s}`");
        }
    }
}

/// A rate period. Time-of-use plans resolve to the first three; tiered plans
/// resolve to a tier from the daily baseline comparison instead.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, derive_more::Display)]
pub enum Period {
    #[display("On Peak")]
    #[serde(rename = "On Peak")]
    OnPeak,

    #[display("Off Peak")]
    #[serde(rename = "Off Peak")]
    OffPeak,

    #[display("Super Off Peak")]
    #[serde(rename = "Super Off Peak")]
    SuperOffPeak,

    #[display("Tier 1")]
    #[serde(rename = "Tier 1")]
    Tier1,

    #[display("Tier 2")]
    #[serde(rename = "Tier 2")]
    Tier2,
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::OnPeak, Self::OffPeak, Self::SuperOffPeak, Self::Tier1, Self::Tier2]
            .into_iter()
            .find(|period| period.to_string().eq_ignore_ascii_case(s))
            .with_context(|| format!("unknown rate period `{s}`"))
    }
}

/// Resolve the time-of-use period for one interval.
///
/// The check order is load-bearing: the weekend and overnight windows resolve
/// before the on-peak window, and the `TOU-DR-P` midday window only applies
/// after on-peak has been ruled out.
pub fn time_of_use_period(plan: &RatePlan, season: Season, hour: u32, is_weekend: bool) -> Period {
    let overnight = if plan.has_super_off_peak(season) {
        Period::SuperOffPeak
    } else {
        Period::OffPeak
    };

    if is_weekend && hour < 14 {
        return overnight;
    }
    if hour < 6 {
        return overnight;
    }
    if (16..21).contains(&hour) {
        return Period::OnPeak;
    }
    // TOU-DR-P grants an extra midday super-off-peak window on summer
    // weekdays. Plan-specific, not to be generalized.
    if plan.key == PlanKey::TouDrP
        && !is_weekend
        && season == Season::Summer
        && (10..15).contains(&hour)
    {
        return Period::SuperOffPeak;
    }
    Period::OffPeak
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summer_months() {
        assert_eq!(Season::from_month0(5), Season::Summer);
        assert_eq!(Season::from_month0(9), Season::Summer);
        assert_eq!(Season::from_month0(4), Season::Winter);
        assert_eq!(Season::from_month0(10), Season::Winter);
        assert_eq!(Season::from_month0(11), Season::Winter);
        assert_eq!(Season::from_month0(0), Season::Winter);
    }

    #[test]
    fn test_weekday_windows() {
        let plan = RatePlan::get(PlanKey::TouDr1);
        assert_eq!(time_of_use_period(plan, Season::Summer, 3, false), Period::SuperOffPeak);
        assert_eq!(time_of_use_period(plan, Season::Summer, 12, false), Period::OffPeak);
        assert_eq!(time_of_use_period(plan, Season::Summer, 16, false), Period::OnPeak);
        assert_eq!(time_of_use_period(plan, Season::Summer, 20, false), Period::OnPeak);
        assert_eq!(time_of_use_period(plan, Season::Summer, 21, false), Period::OffPeak);
    }

    #[test]
    fn test_weekend_morning_is_super_off_peak() {
        let plan = RatePlan::get(PlanKey::TouDr1);
        assert_eq!(time_of_use_period(plan, Season::Winter, 13, true), Period::SuperOffPeak);
        assert_eq!(time_of_use_period(plan, Season::Winter, 14, true), Period::OffPeak);
    }

    #[test]
    fn test_fallback_without_super_off_peak() {
        // TOU-DR2 defines no super-off-peak rate, so its overnight and
        // weekend-morning windows fall back to off-peak.
        let plan = RatePlan::get(PlanKey::TouDr2);
        assert_eq!(time_of_use_period(plan, Season::Summer, 3, false), Period::OffPeak);
        assert_eq!(time_of_use_period(plan, Season::Winter, 10, true), Period::OffPeak);
        assert_eq!(time_of_use_period(plan, Season::Winter, 18, true), Period::OnPeak);
    }

    #[test]
    fn test_tou_dr_p_midday_override() {
        let plan = RatePlan::get(PlanKey::TouDrP);
        assert_eq!(time_of_use_period(plan, Season::Summer, 12, false), Period::SuperOffPeak);
        assert_eq!(time_of_use_period(plan, Season::Summer, 15, false), Period::OffPeak);
        // Winter and weekends are not covered by the override.
        assert_eq!(time_of_use_period(plan, Season::Winter, 12, false), Period::OffPeak);
        assert_eq!(time_of_use_period(plan, Season::Summer, 12, true), Period::SuperOffPeak);
        // Other plans never get the midday window.
        let other = RatePlan::get(PlanKey::TouDr1);
        assert_eq!(time_of_use_period(other, Season::Summer, 12, false), Period::OffPeak);
    }

    #[test]
    fn test_period_label_round_trip() {
        assert_eq!("Super Off Peak".parse::<Period>().unwrap(), Period::SuperOffPeak);
        assert_eq!("on peak".parse::<Period>().unwrap(), Period::OnPeak);
        assert!("midnight".parse::<Period>().is_err());
    }
}
