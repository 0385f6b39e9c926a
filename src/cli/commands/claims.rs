//! `cca claims` command - AI-enriched claims table

use console::style;
use miette::Result;

use crate::cli::commands::utils::{load_error, open_dashboard, to_json, to_yaml};
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::Clock;
use crate::core::claim::{Claim, StatusFilter};
use crate::core::Dashboard;

/// Shown instead of a table when the filter matches nothing
pub const NO_CLAIMS: &str = "No claims found for the selected filter.";

#[derive(clap::Args, Debug, Default)]
pub struct ClaimsArgs {
    /// Wrap long text columns at this width instead of truncating
    #[arg(long, short = 'w')]
    pub wrap: Option<usize>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "CLAIM_ID", 14),
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("diagnosis", "DIAGNOSIS", 28),
    ColumnDef::new("amount", "AMOUNT", 14),
    ColumnDef::new("score", "SCORE", 8),
    ColumnDef::new("label", "SENTIMENT", 10),
    ColumnDef::new("summary", "NOTES_SUMMARY", 40),
    ColumnDef::new("recommendation", "CARE_RECOMMENDATION", 40),
];

pub fn run(args: ClaimsArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let claims = dashboard.claims(global.status).map_err(load_error)?;

    let machine = matches!(global.format, OutputFormat::Json | OutputFormat::Yaml);
    if claims.is_empty() && !machine {
        if !global.quiet {
            eprintln!("{} {}", style("!").yellow(), NO_CLAIMS);
        }
        return Ok(());
    }

    let config = match args.wrap {
        Some(width) => TableConfig::with_wrap(width),
        None if global.quiet => TableConfig::for_pipe(),
        None => TableConfig::default(),
    };
    print!("{}", render_claims(&claims, global.format, config)?);
    Ok(())
}

/// Render the claims table for `filter`, or the empty-filter notice
pub fn render<C: Clock>(
    dashboard: &Dashboard<C>,
    filter: StatusFilter,
    format: OutputFormat,
) -> Result<String> {
    let claims = dashboard.claims(filter).map_err(load_error)?;
    if claims.is_empty() {
        return Ok(format!("{}\n", NO_CLAIMS));
    }
    render_claims(&claims, format, TableConfig::default())
}

fn render_claims(claims: &[Claim], format: OutputFormat, config: TableConfig) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", to_json(&claims)?)),
        OutputFormat::Yaml => to_yaml(&claims),
        _ => Ok(TableFormatter::new(COLUMNS, "claim")
            .with_config(config)
            .render(claims.iter().map(claim_row), format)),
    }
}

fn claim_row(claim: &Claim) -> TableRow {
    TableRow::new(claim.claim_id.clone())
        .cell("id", CellValue::Id(claim.claim_id.clone()))
        .cell("date", CellValue::Date(claim.claim_date))
        .cell("status", CellValue::Status(claim.claim_status))
        .cell("diagnosis", text_or_empty(&claim.diagnosis_desc))
        .cell("amount", CellValue::Amount(claim.claim_amount))
        .cell("score", CellValue::Score(claim.sentiment_score))
        .cell("label", CellValue::Sentiment(claim.sentiment_label))
        .cell("summary", text_or_empty(&claim.notes_summary))
        .cell("recommendation", text_or_empty(&claim.care_recommendation))
}

fn text_or_empty(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(s.to_string())
    }
}
