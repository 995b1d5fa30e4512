//! The editable-usage session: owns the working and original record sets and
//! funnels every mutation through atomic, re-aggregating operations.

use tokio::task::yield_now;

use crate::{
    catalog::PlanKey,
    chart::{self, ChartData},
    compare::{self, Comparison, UsageRecord, selected_pair},
    error::EngineError,
    periods::{Period, Season},
    prelude::*,
    quantity::KilowattHours,
    recommend,
    usage::{self, RawRow, daily_totals},
};

pub struct Session {
    selected: Vec<PlanKey>,
    ev_eligible: bool,

    /// The plan pair of the last successful processing, in caller order.
    active: Option<(PlanKey, PlanKey)>,

    /// User-editable copy, replaced wholesale by edits and reset.
    working: Vec<UsageRecord>,

    /// Frozen after the first successful processing; reset restores from it.
    original: Vec<UsageRecord>,

    comparison: Option<Comparison>,
    chart: Option<ChartData>,
    modified: bool,
    processing: bool,
    updating: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selected: vec![PlanKey::TouDr1, PlanKey::EvTou5],
            ev_eligible: false,
            active: None,
            working: Vec::new(),
            original: Vec::new(),
            comparison: None,
            chart: None,
            modified: false,
            processing: false,
            updating: false,
        }
    }

    /// Select 0–2 plans. Running a comparison still requires exactly two.
    pub fn set_selected_plans(&mut self, plans: &[PlanKey]) -> Result<(), EngineError> {
        if plans.len() > 2 {
            return Err(EngineError::SelectionLimit);
        }
        self.selected = plans.to_vec();
        Ok(())
    }

    pub fn set_ev_eligibility(&mut self, eligible: bool) {
        self.ev_eligible = eligible;
    }

    #[must_use]
    pub fn selected_plans(&self) -> &[PlanKey] {
        &self.selected
    }

    #[must_use]
    pub const fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    #[must_use]
    pub const fn chart_data(&self) -> Option<&ChartData> {
        self.chart.as_ref()
    }

    #[must_use]
    pub fn records(&self) -> &[UsageRecord] {
        &self.working
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.processing
    }

    #[must_use]
    pub const fn is_updating(&self) -> bool {
        self.updating
    }

    /// Ingest raw rows and run the full comparison.
    ///
    /// A selection failure leaves any previous valid state untouched; any
    /// other failure resets to a clean empty state, never a half-built one.
    #[instrument(skip_all, fields(n_rows = rows.len()))]
    pub async fn process_data(&mut self, rows: &[RawRow]) -> Result<(), EngineError> {
        self.processing = true;
        let result = self.process_data_inner(rows).await;
        self.processing = false;
        if let Err(error) = &result {
            match error {
                EngineError::Selection => {}
                _ => self.clear(),
            }
        }
        result
    }

    async fn process_data_inner(&mut self, rows: &[RawRow]) -> Result<(), EngineError> {
        let (first, second) = selected_pair(&self.selected)?;
        yield_now().await;
        let readings = usage::ingest(rows);
        let (records, comparison) = compare::evaluate(readings, first, second)?;
        self.chart = Some(chart::build(&records, &comparison));
        self.original = records.clone();
        self.working = records;
        self.comparison = Some(comparison);
        self.active = Some((first, second));
        self.modified = false;
        Ok(())
    }

    fn clear(&mut self) {
        self.working.clear();
        self.original.clear();
        self.comparison = None;
        self.chart = None;
        self.active = None;
        self.modified = false;
    }

    /// Scale one month's total consumption to `new_total`, preserving the
    /// intra-month distribution, then re-aggregate the whole working set.
    ///
    /// Silent no-op when the month is absent or its current total is
    /// non-positive.
    pub async fn update_monthly_usage(
        &mut self,
        month_key: &str,
        new_total: KilowattHours,
    ) -> Result<(), EngineError> {
        let targeted: Vec<usize> = self
            .working
            .iter()
            .enumerate()
            .filter(|(_, record)| record.reading.month_key == month_key)
            .map(|(index, _)| index)
            .collect();
        self.rescale(&targeted, new_total).await
    }

    /// Scale one (season, first-plan period) group's total consumption.
    ///
    /// Daily totals are rebuilt from the scaled values before re-quoting
    /// because a period edit changes day totals, which drive tiered
    /// baselines.
    pub async fn update_period_usage(
        &mut self,
        season: Season,
        period: Period,
        new_total: KilowattHours,
    ) -> Result<(), EngineError> {
        let targeted: Vec<usize> = self
            .working
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record.reading.season == season && record.plans[0].period == period
            })
            .map(|(index, _)| index)
            .collect();
        self.rescale(&targeted, new_total).await
    }

    async fn rescale(
        &mut self,
        targeted: &[usize],
        new_total: KilowattHours,
    ) -> Result<(), EngineError> {
        let Some((first, second)) = self.active else {
            return Ok(());
        };
        let current: KilowattHours =
            targeted.iter().map(|&index| self.working[index].reading.consumption).sum();
        if targeted.is_empty() || current <= KilowattHours::ZERO {
            return Ok(());
        }
        self.modified = true;
        self.updating = true;
        yield_now().await;

        let factor = new_total / current;
        for &index in targeted {
            let reading = &mut self.working[index].reading;
            reading.consumption = reading.consumption * factor;
        }
        let totals = daily_totals(
            self.working
                .iter()
                .map(|record| (record.reading.date_key.as_str(), record.reading.consumption)),
        );
        let result = self.requote(targeted, &totals);
        if result.is_ok() {
            let comparison = compare::aggregate(&mut self.working, first, second);
            self.chart = Some(chart::build(&self.working, &comparison));
            self.comparison = Some(comparison);
        }
        self.updating = false;
        result
    }

    fn requote(
        &mut self,
        targeted: &[usize],
        totals: &std::collections::HashMap<String, KilowattHours>,
    ) -> Result<(), EngineError> {
        for &index in targeted {
            let record = &mut self.working[index];
            let daily_total =
                totals.get(&record.reading.date_key).copied().unwrap_or(KilowattHours::ZERO);
            for slot in 0..2 {
                let quote =
                    compare::quote_reading(record.plans[slot].plan, &record.reading, daily_total)?;
                record.plans[slot] = quote;
            }
        }
        Ok(())
    }

    /// Replace the working set with a fresh deep copy of the original and
    /// re-aggregate. No-op when nothing has been captured yet.
    pub async fn reset_to_original(&mut self) {
        let Some((first, second)) = self.active else {
            return;
        };
        if self.original.is_empty() {
            return;
        }
        self.updating = true;
        yield_now().await;
        self.working = self.original.clone();
        self.modified = false;
        let comparison = compare::aggregate(&mut self.working, first, second);
        self.chart = Some(chart::build(&self.working, &comparison));
        self.comparison = Some(comparison);
        self.updating = false;
    }

    /// The two cheapest eligible plans for the current working set.
    pub async fn recommended_plans(&self) -> Result<[PlanKey; 2], EngineError> {
        recommend::recommend(self.working.iter().map(|record| &record.reading), self.ev_eligible)
            .await
    }
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

    fn sample_rows() -> Vec<RawRow> {
        vec![
            row("1/8/2025", "3:00 AM", "2.0"),
            row("1/8/2025", "12:00 PM", "3.0"),
            row("1/8/2025", "6:00 PM", "1.0"),
            row("2/9/2025", "12:00 PM", "4.0"),
            row("6/3/2025", "6:00 PM", "2.0"),
        ]
    }

    fn total_kwh(session: &Session) -> f64 {
        session.records().iter().map(|record| f64::from(record.reading.consumption)).sum()
    }

    #[tokio::test]
    async fn test_process_data_captures_original() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        assert!(!session.is_modified());
        assert!(!session.is_processing());
        assert_eq!(session.records().len(), 5);
        assert_eq!(session.comparison().unwrap().overall.months_analyzed, 3);
    }

    #[tokio::test]
    async fn test_comparison_requires_exactly_two_plans() {
        let mut session = Session::new();
        session.set_selected_plans(&[PlanKey::TouDr1]).unwrap();
        let error = session.process_data(&sample_rows()).await.unwrap_err();
        assert_eq!(error.to_string(), "Please select exactly 2 plans for comparison");
        assert!(session.comparison().is_none());
        assert!(!session.is_processing());

        // Recoverable: fixing the selection and reprocessing succeeds.
        session.set_selected_plans(&[PlanKey::TouDr1, PlanKey::EvTou5]).unwrap();
        session.process_data(&sample_rows()).await.unwrap();
        assert!(session.comparison().is_some());
    }

    #[tokio::test]
    async fn test_selection_error_preserves_previous_results() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        session.set_selected_plans(&[]).unwrap();
        assert!(session.process_data(&sample_rows()).await.is_err());
        // The earlier valid comparison is still available.
        assert!(session.comparison().is_some());
        assert_eq!(session.records().len(), 5);
    }

    #[tokio::test]
    async fn test_at_most_two_plans_can_be_selected() {
        let mut session = Session::new();
        let error = session
            .set_selected_plans(&[PlanKey::Dr, PlanKey::TouDr1, PlanKey::EvTou5])
            .unwrap_err();
        assert!(matches!(error, EngineError::SelectionLimit));
        // Selecting zero or one plan is legal.
        session.set_selected_plans(&[]).unwrap();
        session.set_selected_plans(&[PlanKey::Dr]).unwrap();
    }

    #[tokio::test]
    async fn test_empty_input_is_legal() {
        let mut session = Session::new();
        session.process_data(&[]).await.unwrap();
        assert_eq!(session.comparison().unwrap().overall.total_kwh.to_string(), "0.00");
        assert!(!session.is_processing());
    }

    #[tokio::test]
    async fn test_monthly_update_scales_proportionally() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        // January currently totals 6 kWh; scale it to 12.
        session.update_monthly_usage("2025-01", KilowattHours::from(12.0)).await.unwrap();
        assert!(session.is_modified());

        let january: Vec<f64> = session
            .records()
            .iter()
            .filter(|record| record.reading.month_key == "2025-01")
            .map(|record| f64::from(record.reading.consumption))
            .collect();
        assert_abs_diff_eq!(january.iter().sum::<f64>(), 12.0, epsilon = 1e-9);
        // The intra-month distribution is preserved.
        assert_abs_diff_eq!(january[0], 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(january[1], 6.0, epsilon = 1e-9);
        // Untouched months are untouched, and the aggregates were rebuilt.
        assert_abs_diff_eq!(total_kwh(&session), 12.0 + 4.0 + 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            f64::from(session.comparison().unwrap().overall.total_kwh),
            18.0,
            epsilon = 1e-9
        );
        // The cost invariant holds for the re-quoted records.
        for record in session.records() {
            for quote in &record.plans {
                assert_abs_diff_eq!(
                    f64::from(quote.cost),
                    f64::from(record.reading.consumption) * f64::from(quote.rate),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[tokio::test]
    async fn test_monthly_update_ignores_absent_month() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        session.update_monthly_usage("2030-01", KilowattHours::from(100.0)).await.unwrap();
        assert!(!session.is_modified());
        assert_abs_diff_eq!(total_kwh(&session), 12.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_period_update_rescales_group() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        let (season, period) = {
            let record = &session.records()[0];
            (record.reading.season, record.plans[0].period)
        };
        session.update_period_usage(season, period, KilowattHours::from(9.0)).await.unwrap();
        assert!(session.is_modified());
        let group_total: f64 = session
            .records()
            .iter()
            .filter(|record| {
                record.reading.season == season && record.plans[0].period == period
            })
            .map(|record| f64::from(record.reading.consumption))
            .sum();
        assert_abs_diff_eq!(group_total, 9.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_reset_round_trip() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        let before = session.comparison().unwrap().clone();
        let kwh_before = total_kwh(&session);

        session.update_monthly_usage("2025-01", KilowattHours::from(60.0)).await.unwrap();
        session.update_period_usage(Season::Winter, Period::OffPeak, KilowattHours::from(2.0)).await.unwrap();
        assert!(session.is_modified());

        session.reset_to_original().await;
        assert!(!session.is_modified());
        assert_abs_diff_eq!(total_kwh(&session), kwh_before, epsilon = 1e-2);
        let after = session.comparison().unwrap();
        assert_eq!(after.overall.first.plan, before.overall.first.plan);
        assert_abs_diff_eq!(
            f64::from(after.overall.first.total_cost),
            f64::from(before.overall.first.total_cost),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            f64::from(after.overall.total_savings),
            f64::from(before.overall.total_savings),
            epsilon = 1e-9
        );
    }

    #[tokio::test]
    async fn test_reset_before_processing_is_a_no_op() {
        let mut session = Session::new();
        session.reset_to_original().await;
        assert!(session.comparison().is_none());
    }

    #[tokio::test]
    async fn test_recommendations_respect_ev_eligibility() {
        let mut session = Session::new();
        session.process_data(&sample_rows()).await.unwrap();
        let without_ev = session.recommended_plans().await.unwrap();
        assert!(!without_ev.contains(&PlanKey::EvTou5));
        session.set_ev_eligibility(true);
        // Eligibility widens the candidate set; the result stays a pair.
        let with_ev = session.recommended_plans().await.unwrap();
        assert_eq!(with_ev.len(), 2);
    }
}
