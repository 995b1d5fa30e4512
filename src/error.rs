use crate::{
    catalog::PlanKey,
    periods::{Period, Season},
};

/// Engine-level failures.
///
/// Row-level parse problems are deliberately absent: ingestion drops
/// malformed rows silently and never aborts the valid remainder.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A comparison run needs exactly two distinct plans.
    #[error("Please select exactly 2 plans for comparison")]
    Selection,

    /// More than two plans were supplied to the selection setter.
    #[error("maximum of two plans can be selected for comparison")]
    SelectionLimit,

    /// A plan key outside the catalog was requested.
    #[error("unknown plan key: {0}")]
    UnknownPlan(String),

    /// Catalog inconsistency: a time-of-use plan lacks a rate for the
    /// resolved season/period combination.
    #[error("no {period} rate defined for {plan} in {season}")]
    MissingRate {
        plan: PlanKey,
        season: Season,
        period: Period,
    },

    /// No usage records to base a recommendation on.
    #[error("no usage records to analyze")]
    EmptyUsage,
}
