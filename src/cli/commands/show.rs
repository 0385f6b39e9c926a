//! `cca show` command - full text fields for one claim

use console::style;
use miette::Result;

use crate::cli::commands::utils::{load_error, open_dashboard, to_json, to_yaml};
use crate::cli::helpers::format_amount;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::Clock;
use crate::core::claim::{Claim, StatusFilter};
use crate::core::Dashboard;

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Claim ID (case-insensitive)
    pub claim_id: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    print!(
        "{}",
        render(&dashboard, global.status, &args.claim_id, global.format)?
    );
    Ok(())
}

/// Render one claim of the current filter; unknown IDs are an error
pub fn render<C: Clock>(
    dashboard: &Dashboard<C>,
    filter: StatusFilter,
    claim_id: &str,
    format: OutputFormat,
) -> Result<String> {
    let claim = dashboard
        .find_claim(filter, claim_id)
        .map_err(load_error)?
        .ok_or_else(|| {
            miette::miette!(
                help = "Run `cca claims` to list the claims of this filter",
                "No claim '{}' in {} claims",
                claim_id.trim(),
                filter
            )
        })?;

    match format {
        OutputFormat::Json => Ok(format!("{}\n", to_json(&claim)?)),
        OutputFormat::Yaml => to_yaml(&claim),
        OutputFormat::Id => Ok(format!("{}\n", claim.claim_id)),
        _ => Ok(format_claim(&claim)),
    }
}

fn format_claim(claim: &Claim) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style(&claim.claim_id).cyan().bold()));
    out.push_str(&format!("{:-<60}\n", ""));
    out.push_str(&format!(
        "{}: {}\n",
        style("Date").bold(),
        claim.claim_date.format("%Y-%m-%d")
    ));
    out.push_str(&format!("{}: {}\n", style("Status").bold(), claim.claim_status));
    out.push_str(&format!(
        "{}: {}\n",
        style("Diagnosis").bold(),
        claim.diagnosis_desc
    ));
    out.push_str(&format!(
        "{}: {}\n",
        style("Amount").bold(),
        format_amount(claim.claim_amount)
    ));
    out.push_str(&format!(
        "{}: {:.3} ({})\n",
        style("Sentiment").bold(),
        claim.sentiment_score,
        claim.sentiment_label
    ));

    for (title, body) in [
        ("Provider Notes", &claim.provider_notes),
        ("AI Summary", &claim.notes_summary),
        ("Care Recommendation", &claim.care_recommendation),
        ("Patient Feedback", &claim.patient_feedback),
    ] {
        out.push('\n');
        out.push_str(&format!("{}\n", style(title).bold().underlined()));
        if body.is_empty() {
            out.push_str(&format!("{}\n", style("(none)").dim()));
        } else {
            out.push_str(body);
            out.push('\n');
        }
    }
    out
}
