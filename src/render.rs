//! Table presentation of the catalog and the comparison views.
//!
//! Formatting to the fixed display precision happens here, at the
//! presentation boundary; the aggregates keep full precision.

use comfy_table::{Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    catalog::{PlanKey, RatePlan},
    compare::{Comparison, Overall},
    quantity::Usd,
};

fn base_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

fn money_cell(value: Usd) -> Cell {
    Cell::new(format!("${value}")).set_alignment(CellAlignment::Right)
}

fn savings_cell(value: Usd) -> Cell {
    money_cell(value).fg(if value > Usd::ZERO {
        Color::Green
    } else if value < Usd::ZERO {
        Color::Red
    } else {
        Color::Reset
    })
}

#[must_use]
pub fn catalog_table() -> Table {
    let mut table = base_table();
    table.set_header(vec!["Key", "Name", "Type", "Monthly charge", "Requirements"]);
    for key in PlanKey::ALL {
        let plan = RatePlan::get(key);
        table.add_row(vec![
            Cell::new(plan.key),
            Cell::new(plan.name),
            Cell::new(plan.structural_type()),
            money_cell(plan.monthly_charge),
            Cell::new(plan.requirements.join("; ")),
        ]);
    }
    table
}

#[must_use]
pub fn overall_table(overall: &Overall) -> Table {
    let mut table = base_table();
    table.set_header(vec!["", overall.first.name, overall.second.name]);
    table.add_row(vec![
        Cell::new("Total cost"),
        money_cell(overall.first.total_cost),
        // The second position is the cheaper plan by construction.
        money_cell(overall.second.total_cost).fg(Color::Green),
    ]);
    table.add_row(vec![
        Cell::new("Average rate"),
        Cell::new(format!("${}/kWh", overall.first.average_rate))
            .set_alignment(CellAlignment::Right),
        Cell::new(format!("${}/kWh", overall.second.average_rate))
            .set_alignment(CellAlignment::Right),
    ]);
    table
}

#[must_use]
pub fn period_table(comparison: &Comparison) -> Table {
    let overall = &comparison.overall;
    let mut table = base_table();
    table.set_header(vec![
        "Season",
        "Period",
        "kWh",
        overall.first.plan.as_str(),
        overall.second.plan.as_str(),
        "Difference",
    ]);
    for entry in &comparison.by_period {
        table.add_row(vec![
            Cell::new(entry.season),
            Cell::new(entry.period),
            Cell::new(entry.consumption).set_alignment(CellAlignment::Right),
            money_cell(entry.first_cost),
            money_cell(entry.second_cost),
            savings_cell(entry.cost_difference),
        ]);
    }
    table
}

#[must_use]
pub fn monthly_table(comparison: &Comparison) -> Table {
    let overall = &comparison.overall;
    let mut table = base_table();
    table.set_header(vec![
        "Month",
        "kWh",
        overall.first.plan.as_str(),
        overall.second.plan.as_str(),
        "Savings",
    ]);
    for entry in &comparison.by_month {
        table.add_row(vec![
            Cell::new(&entry.month),
            Cell::new(entry.consumption).set_alignment(CellAlignment::Right),
            money_cell(entry.first_total),
            money_cell(entry.second_total),
            savings_cell(entry.savings),
        ]);
    }
    table
}

#[must_use]
pub fn recommendation_table(ranked: &[(PlanKey, Usd)]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["Rank", "Plan", "Name", "Total cost"]);
    for (position, (plan, total)) in ranked.iter().enumerate() {
        let plan_cell = if position < 2 {
            Cell::new(plan).fg(Color::Green)
        } else {
            Cell::new(plan)
        };
        table.add_row(vec![
            Cell::new(position + 1),
            plan_cell,
            Cell::new(RatePlan::get(*plan).name),
            money_cell(*total),
        ]);
    }
    table
}
