//! `cca ask` command - free-text questions about the selected claims

use console::style;
use miette::Result;

use crate::cli::commands::utils::{open_dashboard, to_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::prompt::{is_blank, AskOutcome, EXAMPLE_QUESTIONS};

#[derive(clap::Args, Debug, Default)]
pub struct AskArgs {
    /// The question; multiple words are joined with spaces
    pub question: Vec<String>,

    /// List example questions instead of asking
    #[arg(long)]
    pub examples: bool,
}

pub fn run(args: AskArgs, global: &GlobalOpts) -> Result<()> {
    if args.examples {
        print_examples();
        return Ok(());
    }

    let question = args.question.join(" ");
    // blank questions never need the warehouse
    let outcome = if is_blank(&question) {
        AskOutcome::empty_question()
    } else {
        open_dashboard(global)?.ask(global.status, &question)
    };

    if global.format == OutputFormat::Json {
        println!("{}", to_json(&outcome_json(&outcome))?);
    } else {
        report(&outcome);
    }
    Ok(())
}

/// Print an outcome: answers to stdout, warnings and failures to stderr
pub fn report(outcome: &AskOutcome) {
    match outcome {
        AskOutcome::Warning(message) => {
            eprintln!("{} {}", style("!").yellow(), message);
        }
        AskOutcome::Answer(answer) => {
            println!("{}", answer);
        }
        AskOutcome::Failed { error, hint } => {
            eprintln!("{} {}", style("✗").red(), error);
            eprintln!("{} {}", style("Tip:").cyan(), hint);
        }
    }
}

pub fn print_examples() {
    println!("{}", style("Example questions").bold());
    for question in EXAMPLE_QUESTIONS {
        println!("  {} {}", style("•").dim(), question);
    }
}

fn outcome_json(outcome: &AskOutcome) -> serde_json::Value {
    match outcome {
        AskOutcome::Warning(message) => serde_json::json!({ "warning": message }),
        AskOutcome::Answer(answer) => serde_json::json!({ "answer": answer }),
        AskOutcome::Failed { error, hint } => serde_json::json!({ "error": error, "hint": hint }),
    }
}
