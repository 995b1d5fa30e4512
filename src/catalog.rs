//! SDG&E residential tariff schedules, effective February 1, 2025.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{
    error::EngineError,
    periods::Season,
    quantity::{Usd, UsdPerKilowattHour},
};

/// Daily baseline allowance in kWh, used by tiered plans. Fixed constants
/// independent of climate zone.
pub const fn baseline_allowance(season: Season) -> f64 {
    match season {
        Season::Summer => 11.2,
        Season::Winter => 9.6,
    }
}

/// Daily consumption up to this multiple of the allowance stays in tier 1.
pub const BASELINE_MULTIPLIER: f64 = 1.3;

/// The closed set of catalog plan keys. Unknown keys only exist at the
/// string boundary, where parsing fails with [`EngineError::UnknownPlan`].
#[derive(Debug, clap::ValueEnum, enumset::EnumSetType, Serialize, Deserialize)]
pub enum PlanKey {
    /// Standard tiered residential service.
    #[value(name = "DR")]
    #[serde(rename = "DR")]
    Dr,

    /// Time-of-use service.
    #[value(name = "TOU-DR1")]
    #[serde(rename = "TOU-DR1")]
    TouDr1,

    /// Time-of-use service without a super-off-peak rate.
    #[value(name = "TOU-DR2")]
    #[serde(rename = "TOU-DR2")]
    TouDr2,

    /// Time-of-use "plus" service with a midday summer window.
    #[value(name = "TOU-DR-P")]
    #[serde(rename = "TOU-DR-P")]
    TouDrP,

    /// Electric-vehicle time-of-use service.
    #[value(name = "EV-TOU-5")]
    #[serde(rename = "EV-TOU-5")]
    EvTou5,
}

impl PlanKey {
    pub const ALL: [Self; 5] = [Self::Dr, Self::TouDr1, Self::TouDr2, Self::TouDrP, Self::EvTou5];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dr => "DR",
            Self::TouDr1 => "TOU-DR1",
            Self::TouDr2 => "TOU-DR2",
            Self::TouDrP => "TOU-DR-P",
            Self::EvTou5 => "EV-TOU-5",
        }
    }
}

impl Display for PlanKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| EngineError::UnknownPlan(s.to_owned()))
    }
}

/// Per-season values, looked up by [`Season`].
pub struct BySeason<T> {
    pub summer: T,
    pub winter: T,
}

impl<T> BySeason<T> {
    pub const fn get(&self, season: Season) -> &T {
        match season {
            Season::Summer => &self.summer,
            Season::Winter => &self.winter,
        }
    }
}

pub struct TierRates {
    pub tier1: UsdPerKilowattHour,
    pub tier2: UsdPerKilowattHour,
}

pub struct TouRates {
    pub on_peak: UsdPerKilowattHour,
    pub off_peak: UsdPerKilowattHour,
    /// Absent super-off-peak means those hours fall back to off-peak.
    pub super_off_peak: Option<UsdPerKilowattHour>,
}

pub enum Pricing {
    Tiered {
        rates: BySeason<TierRates>,
        /// Signed adjustment added to the tier-1 rate within baseline.
        baseline_credit: Option<UsdPerKilowattHour>,
    },
    TimeOfUse {
        rates: BySeason<TouRates>,
    },
}

/// An immutable catalog entry. Defined once at process start, never mutated.
pub struct RatePlan {
    pub key: PlanKey,
    pub name: &'static str,
    pub description: &'static str,
    pub monthly_charge: Usd,
    pub requirements: &'static [&'static str],
    pub pricing: Pricing,
}

impl RatePlan {
    pub fn get(key: PlanKey) -> &'static Self {
        // CATALOG is ordered by `PlanKey` discriminant.
        &CATALOG[key as usize]
    }

    pub const fn structural_type(&self) -> &'static str {
        match self.pricing {
            Pricing::Tiered { .. } => "tiered",
            Pricing::TimeOfUse { .. } => "time_of_use",
        }
    }

    pub const fn has_super_off_peak(&self, season: Season) -> bool {
        match &self.pricing {
            Pricing::Tiered { .. } => false,
            Pricing::TimeOfUse { rates } => rates.get(season).super_off_peak.is_some(),
        }
    }
}

const fn rate(value: f64) -> UsdPerKilowattHour {
    UsdPerKilowattHour(OrderedFloat(value))
}

const fn usd(value: f64) -> Usd {
    Usd(OrderedFloat(value))
}

static CATALOG: [RatePlan; 5] = [
    RatePlan {
        key: PlanKey::Dr,
        name: "DR - Standard Residential",
        description: "Standard UDC schedule for domestic residential electric service",
        monthly_charge: usd(0.402),
        requirements: &[],
        pricing: Pricing::Tiered {
            rates: BySeason {
                summer: TierRates { tier1: rate(0.40692), tier2: rate(0.51236) },
                winter: TierRates { tier1: rate(0.40692), tier2: rate(0.51236) },
            },
            baseline_credit: Some(rate(-0.10544)),
        },
    },
    RatePlan {
        key: PlanKey::TouDr1,
        name: "TOU-DR1 - Time of Use Service",
        description: "Time-of-use option for residential customers",
        monthly_charge: usd(0.402),
        requirements: &[],
        pricing: Pricing::TimeOfUse {
            rates: BySeason {
                summer: TouRates {
                    on_peak: rate(0.71412),
                    off_peak: rate(0.47416),
                    super_off_peak: Some(rate(0.34812)),
                },
                winter: TouRates {
                    on_peak: rate(0.56348),
                    off_peak: rate(0.49877),
                    super_off_peak: Some(rate(0.47999)),
                },
            },
        },
    },
    RatePlan {
        key: PlanKey::TouDr2,
        name: "TOU-DR2 - Time of Use Service",
        description: "Time-of-use option for residential customers",
        monthly_charge: usd(0.402),
        requirements: &[],
        pricing: Pricing::TimeOfUse {
            rates: BySeason {
                summer: TouRates {
                    on_peak: rate(0.71987),
                    off_peak: rate(0.41964),
                    super_off_peak: None,
                },
                winter: TouRates {
                    on_peak: rate(0.56348),
                    off_peak: rate(0.49012),
                    super_off_peak: None,
                },
            },
        },
    },
    RatePlan {
        key: PlanKey::TouDrP,
        name: "TOU-DR-P - Time of Use Plus Service",
        description: "Time-of-use option for customers who manage costs by reducing use during events",
        monthly_charge: usd(0.402),
        requirements: &[],
        pricing: Pricing::TimeOfUse {
            rates: BySeason {
                summer: TouRates {
                    on_peak: rate(0.51244),
                    off_peak: rate(0.48655),
                    super_off_peak: Some(rate(0.37526)),
                },
                winter: TouRates {
                    on_peak: rate(0.54726),
                    off_peak: rate(0.48967),
                    super_off_peak: Some(rate(0.47297)),
                },
            },
        },
    },
    RatePlan {
        key: PlanKey::EvTou5,
        name: "EV-TOU-5 - Electric Vehicle Time of Use",
        description: "Residential service for customers with qualifying electric vehicles",
        monthly_charge: usd(16.00),
        requirements: &["Must own electric vehicle registered with California DMV"],
        pricing: Pricing::TimeOfUse {
            rates: BySeason {
                summer: TouRates {
                    on_peak: rate(0.71106),
                    off_peak: rate(0.45460),
                    super_off_peak: Some(rate(0.12017)),
                },
                winter: TouRates {
                    on_peak: rate(0.47772),
                    off_peak: rate(0.42893),
                    super_off_peak: Some(rate(0.11381)),
                },
            },
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_keys() {
        for key in PlanKey::ALL {
            assert_eq!(RatePlan::get(key).key, key);
        }
    }

    #[test]
    fn test_plan_key_round_trip() {
        for key in PlanKey::ALL {
            assert_eq!(key.as_str().parse::<PlanKey>().unwrap(), key);
        }
        assert!(matches!("TOU-DR9".parse::<PlanKey>(), Err(EngineError::UnknownPlan(_))));
    }

    #[test]
    fn test_super_off_peak_presence() {
        assert!(RatePlan::get(PlanKey::TouDr1).has_super_off_peak(Season::Summer));
        assert!(!RatePlan::get(PlanKey::TouDr2).has_super_off_peak(Season::Summer));
        assert!(!RatePlan::get(PlanKey::Dr).has_super_off_peak(Season::Winter));
    }
}
