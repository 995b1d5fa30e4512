//! Quantity newtypes.
//!
//! The inner values keep full floating-point precision; `Display` carries the
//! fixed presentation precision of each quantity (consumption 2 decimals,
//! rates 5, money 2), and serialization goes through `Display` so reports
//! show the same rounded strings.

use std::{
    fmt::{Display, Formatter},
    ops::{Div, Mul},
};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Energy in kilowatt-hours.
#[serde_as]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::FromStr,
    derive_more::Sub,
    derive_more::Sum,
)]
pub struct KilowattHours(#[serde_as(as = "serde_with::DisplayFromStr")] pub OrderedFloat<f64>);

impl KilowattHours {
    pub const ZERO: Self = Self(OrderedFloat(0.0));
}

impl From<f64> for KilowattHours {
    fn from(value: f64) -> Self {
        Self(OrderedFloat(value))
    }
}

impl From<KilowattHours> for f64 {
    fn from(value: KilowattHours) -> Self {
        value.0.into_inner()
    }
}

impl Display for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Mul<UsdPerKilowattHour> for KilowattHours {
    type Output = Usd;

    fn mul(self, rhs: UsdPerKilowattHour) -> Usd {
        Usd(self.0 * rhs.0)
    }
}

impl Mul<f64> for KilowattHours {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

/// The ratio of two energies, used as a proportional scale factor.
impl Div for KilowattHours {
    type Output = f64;

    fn div(self, rhs: Self) -> f64 {
        (self.0 / rhs.0).into_inner()
    }
}

/// Dollars per kilowatt-hour.
#[serde_as]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::FromStr,
    derive_more::Sub,
)]
pub struct UsdPerKilowattHour(#[serde_as(as = "serde_with::DisplayFromStr")] pub OrderedFloat<f64>);

impl UsdPerKilowattHour {
    pub const ZERO: Self = Self(OrderedFloat(0.0));
}

impl From<f64> for UsdPerKilowattHour {
    fn from(value: f64) -> Self {
        Self(OrderedFloat(value))
    }
}

impl From<UsdPerKilowattHour> for f64 {
    fn from(value: UsdPerKilowattHour) -> Self {
        value.0.into_inner()
    }
}

impl Display for UsdPerKilowattHour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}", self.0)
    }
}

/// Money in US dollars.
#[serde_as]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::FromStr,
    derive_more::Sub,
    derive_more::Sum,
)]
pub struct Usd(#[serde_as(as = "serde_with::DisplayFromStr")] pub OrderedFloat<f64>);

impl Usd {
    pub const ZERO: Self = Self(OrderedFloat(0.0));
}

impl From<f64> for Usd {
    fn from(value: f64) -> Self {
        Self(OrderedFloat(value))
    }
}

impl From<Usd> for f64 {
    fn from(value: Usd) -> Self {
        value.0.into_inner()
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Mul<f64> for Usd {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<KilowattHours> for Usd {
    type Output = UsdPerKilowattHour;

    fn div(self, rhs: KilowattHours) -> UsdPerKilowattHour {
        UsdPerKilowattHour(self.0 / rhs.0)
    }
}
