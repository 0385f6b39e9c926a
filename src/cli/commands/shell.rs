//! `cca shell` command - interactive session over one cached dashboard
//!
//! Every line is one render of a view. The status filter persists between
//! lines and the dashboard's result caches are shared by all of them, so
//! repeating a view inside the cache window does not query the warehouse.
//! When stdin is not a terminal, lines are read from it without prompting.

use console::style;
use dialoguer::Input;
use miette::{IntoDiagnostic, Result};
use std::io::{BufRead, IsTerminal};

use crate::cli::commands::utils::open_dashboard;
use crate::cli::commands::{ask, claims, overview, sentiment, show};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::cache::Clock;
use crate::core::claim::StatusFilter;
use crate::core::Dashboard;

#[derive(clap::Args, Debug, Default)]
pub struct ShellArgs {}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Show or change the status filter
    Status(Option<StatusFilter>),
    Overview,
    Claims,
    Show(String),
    Sentiment,
    Ask(String),
    Examples,
    Cache,
    Help,
    Quit,
    Empty,
}

/// Whether the session keeps reading lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const HELP: &[(&str, &str)] = &[
    ("status [ALL|APPROVED|DENIED|PENDING]", "Show or change the status filter"),
    ("overview", "Headline metrics"),
    ("claims", "AI-enriched claims table"),
    ("show <CLAIM_ID>", "Full notes for one claim"),
    ("sentiment", "Sentiment statistics"),
    ("ask <QUESTION>", "Ask a question about the selected claims"),
    ("examples", "Example questions"),
    ("cache", "Result cache statistics"),
    ("help", "This list"),
    ("quit", "Leave the shell"),
];

/// Parse one input line
pub fn parse_line(line: &str) -> std::result::Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "status" if rest.is_empty() => ShellCommand::Status(None),
        "status" => ShellCommand::Status(Some(rest.parse()?)),
        "overview" => ShellCommand::Overview,
        "claims" => ShellCommand::Claims,
        "show" if rest.is_empty() => return Err("Usage: show <CLAIM_ID>".to_string()),
        "show" => ShellCommand::Show(rest.to_string()),
        "sentiment" => ShellCommand::Sentiment,
        // blank questions are reported by the dashboard
        "ask" => ShellCommand::Ask(rest.to_string()),
        "examples" => ShellCommand::Examples,
        "cache" => ShellCommand::Cache,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("Unknown command '{}'. Type 'help' for a list.", other)),
    };
    Ok(command)
}

/// Shell state carried between lines
pub struct Session<C: Clock> {
    dashboard: Dashboard<C>,
    filter: StatusFilter,
    format: OutputFormat,
}

impl<C: Clock> Session<C> {
    pub fn new(dashboard: Dashboard<C>, filter: StatusFilter, format: OutputFormat) -> Self {
        Self {
            dashboard,
            filter,
            format,
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn dashboard(&self) -> &Dashboard<C> {
        &self.dashboard
    }

    /// Parse and run one line, printing its output
    ///
    /// Errors are printed and the session continues.
    pub fn execute_line(&mut self, line: &str) -> Flow {
        let command = match parse_line(line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{} {}", style("!").yellow(), message);
                return Flow::Continue;
            }
        };

        match self.execute(command) {
            Ok(flow) => flow,
            Err(err) => {
                eprintln!("{} {}", style("✗").red(), err);
                Flow::Continue
            }
        }
    }

    fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Empty => {}
            ShellCommand::Status(None) => println!("Status filter: {}", style(self.filter).cyan()),
            ShellCommand::Status(Some(filter)) => {
                self.filter = filter;
                println!("Status filter: {}", style(self.filter).cyan());
            }
            ShellCommand::Overview => {
                print!("{}", overview::render(&self.dashboard, self.filter, self.format)?)
            }
            ShellCommand::Claims => {
                print!("{}", claims::render(&self.dashboard, self.filter, self.format)?)
            }
            ShellCommand::Show(id) => print!(
                "{}",
                show::render(&self.dashboard, self.filter, &id, self.format)?
            ),
            ShellCommand::Sentiment => print!(
                "{}",
                sentiment::render(&self.dashboard, self.filter, self.format, false)?
            ),
            ShellCommand::Ask(question) => {
                ask::report(&self.dashboard.ask(self.filter, &question));
            }
            ShellCommand::Examples => ask::print_examples(),
            ShellCommand::Cache => print!("{}", self.cache_report()),
            ShellCommand::Help => print_help(),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn cache_report(&self) -> String {
        let stats = self.dashboard.cache_stats();
        let mut out = format!(
            "Cache window: {}s\n",
            self.dashboard.cache_ttl().as_secs()
        );
        for (name, s) in [("claims", stats.claims), ("summary", stats.summary)] {
            out.push_str(&format!(
                "  {:<8} {} hit(s), {} miss(es), {} entr{}\n",
                name,
                s.hits,
                s.misses,
                s.entries,
                if s.entries == 1 { "y" } else { "ies" }
            ));
        }
        out
    }
}

pub fn run(_args: ShellArgs, global: &GlobalOpts) -> Result<()> {
    let dashboard = open_dashboard(global)?;
    let mut session = Session::new(dashboard, global.status, global.format);

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        for line in stdin.lock().lines() {
            let line = line.into_diagnostic()?;
            if session.execute_line(&line) == Flow::Quit {
                break;
            }
        }
        return Ok(());
    }

    if !global.quiet {
        println!(
            "{} Type 'help' for commands, 'quit' to leave.",
            style("Claims Assistant").bold()
        );
    }

    loop {
        let line: String = match Input::new()
            .with_prompt(format!("cca [{}]", session.filter()))
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // closed input ends the session
            Err(_) => break,
        };
        if session.execute_line(&line) == Flow::Quit {
            break;
        }
    }
    Ok(())
}

fn print_help() {
    for (usage, description) in HELP {
        println!("  {:<40} {}", style(usage).cyan(), description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::claim::ClaimStatus;
    use crate::core::completion::{CompletionError, CompletionService};
    use crate::core::dashboard::DashboardSettings;
    use crate::core::store::SqliteStore;
    use rusqlite::Connection;
    use std::sync::Arc;

    struct Canned;

    impl CompletionService for Canned {
        fn complete(
            &self,
            _model: &str,
            _prompt: &str,
        ) -> std::result::Result<String, CompletionError> {
            Ok("CLM-1 first.".to_string())
        }
    }

    fn session() -> Session<crate::core::cache::SystemClock> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE AI_ENRICHED_CLAIMS (
                CLAIM_ID TEXT, CLAIM_DATE TEXT, DIAGNOSIS_DESC TEXT, CLAIM_AMOUNT REAL,
                CLAIM_STATUS TEXT, SENTIMENT_SCORE REAL, SENTIMENT_LABEL TEXT,
                PROVIDER_NOTES TEXT, PATIENT_FEEDBACK TEXT, NOTES_SUMMARY TEXT,
                CARE_RECOMMENDATION TEXT);
             INSERT INTO AI_ENRICHED_CLAIMS VALUES
                ('CLM-1', '2024-03-02', 'Asthma', 120.0, 'DENIED', -0.6, 'Negative',
                 'notes', 'feedback', 'summary', 'recommendation'),
                ('CLM-2', '2024-03-01', 'Flu', 80.5, 'APPROVED', 0.4, 'Positive',
                 NULL, NULL, NULL, NULL);",
        )
        .unwrap();

        let dashboard = Dashboard::new(
            Arc::new(SqliteStore::from_connection(conn)),
            Arc::new(Canned),
            DashboardSettings::default(),
        );
        Session::new(dashboard, StatusFilter::All, OutputFormat::Tsv)
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  "), Ok(ShellCommand::Empty));
        assert_eq!(parse_line("Overview"), Ok(ShellCommand::Overview));
        assert_eq!(
            parse_line("status denied"),
            Ok(ShellCommand::Status(Some(StatusFilter::Only(ClaimStatus::Denied))))
        );
        assert_eq!(parse_line("status"), Ok(ShellCommand::Status(None)));
        assert_eq!(
            parse_line("show  CLM-1 "),
            Ok(ShellCommand::Show("CLM-1".to_string()))
        );
        assert_eq!(
            parse_line("ask Which is most urgent?"),
            Ok(ShellCommand::Ask("Which is most urgent?".to_string()))
        );
        assert_eq!(parse_line("ask"), Ok(ShellCommand::Ask(String::new())));
        assert_eq!(parse_line("exit"), Ok(ShellCommand::Quit));
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("show").is_err());
        assert!(parse_line("status REJECTED").is_err());
        assert!(parse_line("frobnicate").unwrap_err().contains("frobnicate"));
    }

    #[test]
    fn test_status_persists_between_lines() {
        let mut session = session();
        assert_eq!(session.execute_line("status pending"), Flow::Continue);
        assert_eq!(session.filter(), StatusFilter::Only(ClaimStatus::Pending));

        // invalid filters leave the previous one in place
        session.execute_line("status bogus");
        assert_eq!(session.filter(), StatusFilter::Only(ClaimStatus::Pending));
    }

    #[test]
    fn test_repeated_views_hit_the_cache() {
        let mut session = session();
        session.execute_line("overview");
        session.execute_line("claims");
        session.execute_line("show clm-1");

        let stats = session.dashboard().cache_stats();
        assert_eq!(stats.claims.misses, 1);
        assert_eq!(stats.claims.hits, 2);
        assert_eq!(stats.claims.entries, 1);

        session.execute_line("status DENIED");
        session.execute_line("claims");
        assert_eq!(session.dashboard().cache_stats().claims.entries, 2);
    }

    #[test]
    fn test_failures_do_not_end_the_session() {
        let mut session = session();
        assert_eq!(session.execute_line("show CLM-404"), Flow::Continue);
        assert_eq!(session.execute_line("ask"), Flow::Continue);
        assert_eq!(session.execute_line("quit"), Flow::Quit);
    }

    #[test]
    fn test_cache_report() {
        let mut session = session();
        session.execute_line("sentiment");
        let report = session.cache_report();
        assert!(report.starts_with("Cache window: 300s\n"));
        assert!(report.contains("claims   0 hit(s), 1 miss(es), 1 entry"));
        assert!(report.contains("summary  0 hit(s), 1 miss(es), 1 entry"));
    }
}
