//! Free-text questions about the current claims
//!
//! A question is answered by embedding a bounded slice of the loaded result
//! set in a fixed prompt and handing it to a [`CompletionService`]. Failures
//! never escape as errors: the caller always gets an [`AskOutcome`] it can
//! display.

use tabled::{builder::Builder, settings::Style};
use thiserror::Error;

use crate::core::claim::Claim;
use crate::core::completion::CompletionService;

/// Model used for completions unless configured otherwise
pub const DEFAULT_MODEL: &str = "mistral-large2";

/// Maximum number of claims embedded in a prompt by default
pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

/// Shown when a completion or the data it needs fails
pub const REMEDIATION_HINT: &str = "Make sure Cortex is enabled in your Snowflake region \
     and the CORTEX_USER database role is granted.";

/// Shown when the loaded claims do not decode
pub const SCHEMA_HINT: &str =
    "Check that the claims table matches the AI-enriched claims layout.";

/// Suggested questions offered to the user
pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "Which denied claims seem most urgent and why?",
    "Which patients seem most frustrated based on their feedback?",
    "Summarize the overall health trends in these claims.",
    "What are the most common reasons for claim denials?",
    "Which approved claims might need a follow-up soon?",
];

/// Columns of each claim that are shown to the model
pub const CONTEXT_COLUMNS: [&str; 6] = [
    "CLAIM_ID",
    "CLAIM_STATUS",
    "DIAGNOSIS_DESC",
    "CLAIM_AMOUNT",
    "SENTIMENT_LABEL",
    "NOTES_SUMMARY",
];

/// A blank question was submitted
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Please enter a question first.")]
pub struct EmptyQuestion;

/// What to show the user after asking a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Nothing was sent; tell the user why
    Warning(String),
    /// The model's answer
    Answer(String),
    /// The call failed; show the error with a fixed hint
    Failed { error: String, hint: &'static str },
}

impl AskOutcome {
    pub fn empty_question() -> Self {
        AskOutcome::Warning(EmptyQuestion.to_string())
    }

    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::failed_with(error, REMEDIATION_HINT)
    }

    pub fn failed_with(error: impl std::fmt::Display, hint: &'static str) -> Self {
        AskOutcome::Failed {
            error: error.to_string(),
            hint,
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, AskOutcome::Answer(_))
    }
}

/// True when `question` has no visible characters
pub fn is_blank(question: &str) -> bool {
    question.trim().is_empty()
}

/// Builds prompts from claims and dispatches them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptComposer {
    model: String,
    context_limit: usize,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_CONTEXT_LIMIT)
    }
}

impl PromptComposer {
    pub fn new(model: impl Into<String>, context_limit: usize) -> Self {
        Self {
            model: model.into(),
            context_limit,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn context_limit(&self) -> usize {
        self.context_limit
    }

    /// Compose the full prompt for `question` over the first claims of `claims`
    ///
    /// The question is embedded verbatim. Escaping for transport is the
    /// completion backend's job.
    pub fn compose(&self, claims: &[Claim], question: &str) -> Result<String, EmptyQuestion> {
        if is_blank(question) {
            return Err(EmptyQuestion);
        }

        let limit = self.context_limit.min(claims.len());
        let context = render_context(&claims[..limit]);

        Ok(format!(
            "You are a healthcare claims analyst AI assistant.\n\
             Here is a summary of the current claims dataset:\n\
             \n\
             {context}\n\
             \n\
             Answer the following question clearly, concisely, and in plain English:\n\
             {question}\n\
             \n\
             Be specific and reference claim IDs where relevant."
        ))
    }

    /// Compose and send `question`; never fails
    pub fn ask(
        &self,
        service: &dyn CompletionService,
        claims: &[Claim],
        question: &str,
    ) -> AskOutcome {
        let prompt = match self.compose(claims, question) {
            Ok(prompt) => prompt,
            Err(_) => return AskOutcome::empty_question(),
        };

        match service.complete(&self.model, &prompt) {
            Ok(answer) => AskOutcome::Answer(answer),
            Err(err) => {
                tracing::debug!(error = %err, "completion failed");
                AskOutcome::failed(err)
            }
        }
    }
}

/// Render claims as a borderless text table of the context columns
pub fn render_context(claims: &[Claim]) -> String {
    let mut builder = Builder::default();
    builder.push_record(CONTEXT_COLUMNS);

    for claim in claims {
        builder.push_record([
            claim.claim_id.clone(),
            claim.claim_status.to_string(),
            claim.diagnosis_desc.clone(),
            format!("{:.2}", claim.claim_amount),
            claim.sentiment_label.to_string(),
            claim.notes_summary.clone(),
        ]);
    }

    builder.build().with(Style::blank()).to_string()
}
