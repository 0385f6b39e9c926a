//! External text-completion backends
//!
//! Two transports are supported:
//! - `WarehouseCompletion` calls the warehouse's completion function through
//!   a generated `SELECT` statement, with every argument rendered by
//!   [`quote_literal`]
//! - `HttpCompletion` posts an OpenAI-style chat request to an HTTP endpoint
//!
//! Each call is attempted once. Retrying is left to the user.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::core::sql::{quote_literal, QualifiedName};
use crate::core::store::{DataStore, StoreError};

/// Warehouse function used for completions unless configured otherwise
pub const DEFAULT_COMPLETE_FUNCTION: &str = "SNOWFLAKE.CORTEX.COMPLETE";

/// Result column of the generated completion statement
const ANSWER_COLUMN: &str = "ANSWER";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a completion backend
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Completion request failed: {0}")]
    Http(String),

    #[error("Completion service returned no answer")]
    EmptyAnswer,
}

/// Something that turns a prompt into generated text
pub trait CompletionService: Send + Sync {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}

/// Render the statement that asks the warehouse for a completion
pub fn complete_statement(function: &QualifiedName, model: &str, prompt: &str) -> String {
    format!(
        "SELECT {}({}, {}) AS {}",
        function,
        quote_literal(model),
        quote_literal(prompt),
        ANSWER_COLUMN
    )
}

/// Completion through a warehouse SQL function
pub struct WarehouseCompletion {
    store: Arc<dyn DataStore>,
    function: QualifiedName,
}

impl WarehouseCompletion {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self::with_function(store, QualifiedName::from_static(DEFAULT_COMPLETE_FUNCTION))
    }

    pub fn with_function(store: Arc<dyn DataStore>, function: QualifiedName) -> Self {
        Self { store, function }
    }
}

impl CompletionService for WarehouseCompletion {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let sql = complete_statement(&self.function, model, prompt);
        tracing::info!(
            model,
            function = %self.function,
            prompt_len = prompt.len(),
            "requesting warehouse completion"
        );

        let rows = self.store.run_query(&sql)?;
        rows.first()
            .and_then(|row| row.get(ANSWER_COLUMN))
            .filter(|value| !value.is_null())
            .map(|value| value.to_string())
            .ok_or(CompletionError::EmptyAnswer)
    }
}

/// Completion through an OpenAI-compatible chat endpoint
pub struct HttpCompletion {
    endpoint: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl HttpCompletion {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
            agent: ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .build(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn request_body(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
    })
}

fn first_answer(response: ChatResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::EmptyAnswer)
}

impl CompletionService for HttpCompletion {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        tracing::info!(
            model,
            endpoint = %self.endpoint,
            prompt_len = prompt.len(),
            "requesting http completion"
        );

        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let response: ChatResponse = request
            .send_json(request_body(model, prompt))
            .map_err(|err| CompletionError::Http(err.to_string()))?
            .into_json()
            .map_err(|err| CompletionError::Http(err.to_string()))?;

        first_answer(response)
    }
}
