//! `cca sentiment` command - sentiment statistics by status and label

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::commands::utils::{load_error, open_dashboard, to_json, to_yaml};
use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::Clock;
use crate::core::claim::{Claim, StatusFilter, StatusSummary};
use crate::core::stats::{by_sentiment, sentiment_distribution, LabelCount};
use crate::core::Dashboard;

#[derive(clap::Args, Debug, Default)]
pub struct SentimentArgs {
    /// Only show the per-status summary table
    #[arg(long)]
    pub summary_only: bool,
}

const SUMMARY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("status", "CLAIM_STATUS", 14),
    ColumnDef::new("total", "TOTAL_CLAIMS", 14),
    ColumnDef::new("amount", "TOTAL_AMOUNT", 16),
    ColumnDef::new("avg", "AVG_SENTIMENT", 14),
];

const FEEDBACK_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "CLAIM_ID", 14),
    ColumnDef::new("status", "STATUS", 10),
    ColumnDef::new("score", "SCORE", 8),
    ColumnDef::new("label", "SENTIMENT", 10),
    ColumnDef::new("feedback", "PATIENT_FEEDBACK", 60),
];

/// Machine-readable form of the sentiment view
#[derive(Debug, Serialize)]
struct SentimentReport<'a> {
    summary: &'a [StatusSummary],
    distribution: Vec<LabelCount>,
    claims: Vec<&'a Claim>,
}

pub fn run(args: SentimentArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    print!(
        "{}",
        render(&dashboard, global.status, global.format, args.summary_only)?
    );
    Ok(())
}

/// Render the sentiment view
///
/// The per-status summary always covers the whole table; the distribution and
/// the sorted feedback list follow `filter`.
pub fn render<C: Clock>(
    dashboard: &Dashboard<C>,
    filter: StatusFilter,
    format: OutputFormat,
    summary_only: bool,
) -> Result<String> {
    let summary = dashboard.summary().map_err(load_error)?;
    let summary_table = TableFormatter::new(SUMMARY_COLUMNS, "status")
        .with_config(TableConfig::for_pipe());

    if summary_only {
        return match format {
            OutputFormat::Json => Ok(format!("{}\n", to_json(&*summary)?)),
            OutputFormat::Yaml => to_yaml(&*summary),
            _ => Ok(summary_table.render(summary.iter().map(summary_row), format)),
        };
    }

    let claims = dashboard.claims(filter).map_err(load_error)?;
    let report = SentimentReport {
        summary: &summary,
        distribution: sentiment_distribution(&claims),
        claims: by_sentiment(&claims),
    };

    match format {
        OutputFormat::Json => Ok(format!("{}\n", to_json(&report)?)),
        OutputFormat::Yaml => to_yaml(&report),
        OutputFormat::Id => Ok(report
            .claims
            .iter()
            .map(|c| format!("{}\n", c.claim_id))
            .collect()),
        _ => {
            let mut out = String::new();
            out.push_str(&heading("Sentiment by Claim Status"));
            out.push_str(&summary_table.render(summary.iter().map(summary_row), format));

            out.push('\n');
            out.push_str(&heading(&format!("Sentiment Distribution ({})", filter)));
            if report.distribution.is_empty() {
                out.push_str("  (no claims)\n");
            }
            for entry in &report.distribution {
                out.push_str(&format!("  {:<10} {:>5}\n", entry.label.to_string(), entry.count));
            }

            out.push('\n');
            out.push_str(&heading("Patient Feedback by Sentiment Score"));
            out.push_str(
                &TableFormatter::new(FEEDBACK_COLUMNS, "claim")
                    .render(report.claims.iter().copied().map(feedback_row), format),
            );
            Ok(out)
        }
    }
}

fn heading(title: &str) -> String {
    format!("{}\n", style(title).bold().underlined())
}

fn summary_row(summary: &StatusSummary) -> TableRow {
    TableRow::new(summary.claim_status.to_string())
        .cell("status", CellValue::Status(summary.claim_status))
        .cell("total", CellValue::Number(summary.total_claims))
        .cell("amount", CellValue::Amount(summary.total_amount))
        .cell("avg", CellValue::Score(summary.avg_sentiment))
}

fn feedback_row(claim: &Claim) -> TableRow {
    let feedback = if claim.patient_feedback.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(claim.patient_feedback.clone())
    };
    TableRow::new(claim.claim_id.clone())
        .cell("id", CellValue::Id(claim.claim_id.clone()))
        .cell("status", CellValue::Status(claim.claim_status))
        .cell("score", CellValue::Score(claim.sentiment_score))
        .cell("label", CellValue::Sentiment(claim.sentiment_label))
        .cell("feedback", feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::claim::ClaimStatus;

    #[test]
    fn test_summary_row_as_csv() {
        let summary = StatusSummary {
            claim_status: ClaimStatus::Denied,
            total_claims: 4,
            total_amount: 1500.0,
            avg_sentiment: -0.25,
        };
        let out = TableFormatter::new(SUMMARY_COLUMNS, "status")
            .render([summary_row(&summary)], OutputFormat::Csv);
        assert_eq!(out, "status,total,amount,avg\nDENIED,4,1500.00,-0.250\n");
    }
}
