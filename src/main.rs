mod catalog;
mod chart;
mod cli;
mod compare;
mod config;
mod error;
mod greenbutton;
mod periods;
mod prelude;
mod quantity;
mod rate;
mod recommend;
mod render;
mod session;
mod usage;

use clap::Parser;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
    chart::ChartData,
    cli::{Args, Command, CompareArgs, RecommendArgs},
    compare::Comparison,
    config::Config,
    prelude::*,
    session::Session,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    match args.command {
        Command::Plans => {
            println!("{}", render::catalog_table());
            Ok(())
        }
        Command::Compare(command) => run_compare(command, &config).await,
        Command::Recommend(command) => run_recommend(command, &config).await,
    }
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    comparison: &'a Comparison,
    chart: &'a ChartData,
}

async fn run_compare(args: CompareArgs, config: &Config) -> Result {
    let rows = greenbutton::load(&args.usage)?;
    let mut session = Session::new();
    session.set_ev_eligibility(config.ev_eligible);
    let plans = if args.plans.is_empty() { config.plans.clone() } else { args.plans };
    if !plans.is_empty() {
        session.set_selected_plans(&plans)?;
    }
    session.process_data(&rows).await?;
    for edit in &args.set_month {
        session.update_monthly_usage(&edit.month, edit.consumption).await?;
    }
    for edit in &args.set_period {
        session.update_period_usage(edit.season, edit.period, edit.consumption).await?;
    }

    let comparison = session.comparison().context("no comparison available")?;
    if args.json {
        let chart = session.chart_data().context("no chart data available")?;
        println!("{}", serde_json::to_string_pretty(&Report { comparison, chart })?);
        return Ok(());
    }
    println!("{}", render::overall_table(&comparison.overall));
    println!("{}", render::period_table(comparison));
    println!("{}", render::monthly_table(comparison));
    if session.is_modified() {
        info!("totals include what-if edits");
    }
    let overall = &comparison.overall;
    println!(
        "Analyzed {} kWh across {} month(s); {} comes out ${} cheaper.",
        overall.total_kwh, overall.months_analyzed, overall.cheaper, overall.total_savings,
    );
    Ok(())
}

async fn run_recommend(args: RecommendArgs, config: &Config) -> Result {
    let rows = greenbutton::load(&args.usage)?;
    let readings = usage::ingest(&rows);
    let ranked = recommend::rank(&readings, args.ev || config.ev_eligible).await?;
    println!("{}", render::recommendation_table(&ranked));
    if let [(cheapest, _), (runner_up, _), ..] = ranked.as_slice() {
        println!("Recommended plans: {cheapest} and {runner_up}.");
    }
    Ok(())
}
