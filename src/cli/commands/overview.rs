//! `cca overview` command - headline metrics for the selected claims

use console::style;
use miette::Result;

use crate::cli::commands::utils::{load_error, open_dashboard, to_json, to_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::Clock;
use crate::core::claim::StatusFilter;
use crate::core::stats::ClaimsOverview;
use crate::core::Dashboard;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    print!("{}", render(&dashboard, global.status, global.format)?);
    Ok(())
}

/// Render the overview for `filter`
pub fn render<C: Clock>(
    dashboard: &Dashboard<C>,
    filter: StatusFilter,
    format: OutputFormat,
) -> Result<String> {
    let overview = dashboard.overview(filter).map_err(load_error)?;

    match format {
        OutputFormat::Json => Ok(format!("{}\n", to_json(&overview)?)),
        OutputFormat::Yaml => to_yaml(&overview),
        OutputFormat::Tsv | OutputFormat::Csv => {
            let sep = if format == OutputFormat::Csv { "," } else { "\t" };
            Ok(format!(
                "total{sep}approved{sep}denied{sep}pending{sep}mean_sentiment{sep}negative\n\
                 {}{sep}{}{sep}{}{sep}{}{sep}{:.2}{sep}{}\n",
                overview.total,
                overview.approved,
                overview.denied,
                overview.pending,
                overview.mean_sentiment,
                overview.negative,
            ))
        }
        _ => Ok(format_kpis(&overview, filter)),
    }
}

fn format_kpis(overview: &ClaimsOverview, filter: StatusFilter) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {}\n",
        style("Claims Overview").bold().underlined(),
        style(format!("({})", filter)).dim()
    ));
    out.push_str(&format!("{:-<44}\n", ""));
    out.push_str(&format!("  {:<16} {:>8}\n", "Total Claims", overview.total));
    out.push_str(&format!(
        "  {:<16} {:>8}\n",
        "Approved",
        style(overview.approved).green()
    ));
    out.push_str(&format!("  {:<16} {:>8}\n", "Denied", style(overview.denied).red()));
    out.push_str(&format!(
        "  {:<16} {:>8}\n",
        "Pending",
        style(overview.pending).yellow()
    ));
    out.push_str(&format!(
        "  {:<16} {:>8}  {}\n",
        "Avg Sentiment",
        format!("{:.2}", overview.mean_sentiment),
        style(format!("{} negative", overview.negative)).dim()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kpis() {
        let overview = ClaimsOverview {
            total: 3,
            approved: 1,
            denied: 1,
            pending: 1,
            mean_sentiment: -1.0 / 3.0,
            negative: 2,
        };
        let out = format_kpis(&overview, StatusFilter::All);
        assert!(out.contains("Total Claims"));
        assert!(out.contains("-0.33"));
        assert!(out.contains("2 negative"));
        assert!(out.contains("(ALL)"));
    }
}
