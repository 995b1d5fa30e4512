use std::{path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand};

use crate::{
    catalog::PlanKey,
    periods::{Period, Season},
    prelude::*,
    quantity::KilowattHours,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    /// Optional TOML configuration file.
    #[clap(long, env = "TARIFFSCOPE_CONFIG", default_value = "tariffscope.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the tariff catalog.
    Plans,

    /// Compare two plans over a Green Button usage export.
    Compare(CompareArgs),

    /// Rank the eligible plans by total cost and suggest the two cheapest.
    Recommend(RecommendArgs),
}

#[derive(Parser)]
pub struct CompareArgs {
    /// Green Button CSV export.
    pub usage: PathBuf,

    /// Plan keys to compare (exactly two).
    #[clap(long = "plans", value_delimiter = ',', num_args = 1.., env = "TARIFFSCOPE_PLANS")]
    pub plans: Vec<PlanKey>,

    /// What-if edit scaling a month's total consumption, e.g. `2025-03=650`.
    #[clap(long = "set-month", value_name = "YYYY-MM=KWH")]
    pub set_month: Vec<MonthEdit>,

    /// What-if edit scaling a season/period total, e.g. `summer/On Peak=300`.
    #[clap(long = "set-period", value_name = "SEASON/PERIOD=KWH")]
    pub set_period: Vec<PeriodEdit>,

    /// Emit the full report as JSON instead of tables.
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct RecommendArgs {
    /// Green Button CSV export.
    pub usage: PathBuf,

    /// The household qualifies for EV-specific plans.
    #[clap(long, env = "TARIFFSCOPE_EV")]
    pub ev: bool,
}

#[derive(Clone, Debug)]
pub struct MonthEdit {
    pub month: String,
    pub consumption: KilowattHours,
}

impl FromStr for MonthEdit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (month, consumption) = s.split_once('=').context("expected `YYYY-MM=KWH`")?;
        Ok(Self {
            month: month.trim().to_owned(),
            consumption: consumption
                .trim()
                .parse::<f64>()
                .context("consumption must be a number")?
                .into(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct PeriodEdit {
    pub season: Season,
    pub period: Period,
    pub consumption: KilowattHours,
}

impl FromStr for PeriodEdit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (selector, consumption) = s.split_once('=').context("expected `SEASON/PERIOD=KWH`")?;
        let (season, period) = selector.split_once('/').context("expected `SEASON/PERIOD=KWH`")?;
        Ok(Self {
            season: season.trim().parse()?,
            period: period.trim().parse()?,
            consumption: consumption
                .trim()
                .parse::<f64>()
                .context("consumption must be a number")?
                .into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_parse_month_edit() {
        let edit: MonthEdit = "2025-03=650".parse().unwrap();
        assert_eq!(edit.month, "2025-03");
        assert_abs_diff_eq!(f64::from(edit.consumption), 650.0);
        assert!("2025-03".parse::<MonthEdit>().is_err());
    }

    #[test]
    fn test_parse_period_edit() {
        let edit: PeriodEdit = "summer/On Peak=300.5".parse().unwrap();
        assert_eq!(edit.season, Season::Summer);
        assert_eq!(edit.period, Period::OnPeak);
        assert_abs_diff_eq!(f64::from(edit.consumption), 300.5);
        assert!("monsoon/On Peak=1".parse::<PeriodEdit>().is_err());
    }
}
