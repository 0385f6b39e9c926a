//! A dashboard session: warehouse, caches and question answering wired together
//!
//! One `Dashboard` lives for the whole process. Every view asks it for data
//! and it decides whether the warehouse has to be queried again.

use std::sync::Arc;
use std::time::Duration;

use crate::core::cache::{CacheStats, Clock, ResultCache, SystemClock, DEFAULT_TTL};
use crate::core::claim::{Claim, ClaimError, StatusFilter, StatusSummary};
use crate::core::completion::{CompletionService, HttpCompletion, WarehouseCompletion};
use crate::core::config::{CompletionBackend, Config, ConfigError};
use crate::core::prompt::{is_blank, AskOutcome, PromptComposer, SCHEMA_HINT};
use crate::core::query::{default_table, load_claims, load_summary};
use crate::core::sql::QualifiedName;
use crate::core::stats::{aggregate, ClaimsOverview};
use crate::core::store::DataStore;

/// Tunables for a dashboard session
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub table: QualifiedName,
    pub cache_ttl: Duration,
    pub composer: PromptComposer,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            table: default_table(),
            cache_ttl: DEFAULT_TTL,
            composer: PromptComposer::default(),
        }
    }
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            table: config.table()?,
            cache_ttl: config.cache_ttl(),
            composer: PromptComposer::new(config.model(), config.context_limit()),
        })
    }
}

/// Build the completion backend selected by `config`
pub fn completion_from_config(
    config: &Config,
    store: Arc<dyn DataStore>,
) -> Result<Arc<dyn CompletionService>, ConfigError> {
    match config.completion_backend() {
        CompletionBackend::Warehouse => Ok(Arc::new(WarehouseCompletion::with_function(
            store,
            config.completion_function()?,
        ))),
        CompletionBackend::Http => {
            let endpoint = config
                .completion
                .endpoint
                .clone()
                .ok_or(ConfigError::MissingEndpoint)?;
            let api_key = std::env::var(config.api_key_env()).ok();
            let completion = HttpCompletion::new(endpoint, api_key);
            tracing::debug!(endpoint = completion.endpoint(), "using http completion");
            Ok(Arc::new(completion))
        }
    }
}

/// Cache statistics for both cached queries
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DashboardCacheStats {
    pub claims: CacheStats,
    pub summary: CacheStats,
}

pub struct Dashboard<C: Clock = SystemClock> {
    store: Arc<dyn DataStore>,
    completion: Arc<dyn CompletionService>,
    table: QualifiedName,
    composer: PromptComposer,
    claims: ResultCache<StatusFilter, Vec<Claim>, C>,
    summary: ResultCache<(), Vec<StatusSummary>, C>,
}

impl Dashboard<SystemClock> {
    pub fn new(
        store: Arc<dyn DataStore>,
        completion: Arc<dyn CompletionService>,
        settings: DashboardSettings,
    ) -> Self {
        Self::with_clock(store, completion, settings, SystemClock)
    }
}

impl<C: Clock + Clone> Dashboard<C> {
    pub fn with_clock(
        store: Arc<dyn DataStore>,
        completion: Arc<dyn CompletionService>,
        settings: DashboardSettings,
        clock: C,
    ) -> Self {
        Self {
            store,
            completion,
            table: settings.table,
            composer: settings.composer,
            claims: ResultCache::with_clock(settings.cache_ttl, clock.clone()),
            summary: ResultCache::with_clock(settings.cache_ttl, clock),
        }
    }
}

impl<C: Clock> Dashboard<C> {
    pub fn table(&self) -> &QualifiedName {
        &self.table
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Claims for `filter`, newest first
    pub fn claims(&self, filter: StatusFilter) -> Result<Arc<Vec<Claim>>, ClaimError> {
        self.claims.get_or_try_insert_with(filter, || {
            load_claims(self.store.as_ref(), &self.table, filter)
        })
    }

    /// Per-status summary over the whole table
    pub fn summary(&self) -> Result<Arc<Vec<StatusSummary>>, ClaimError> {
        self.summary
            .get_or_try_insert_with((), || load_summary(self.store.as_ref(), &self.table))
    }

    pub fn overview(&self, filter: StatusFilter) -> Result<ClaimsOverview, ClaimError> {
        Ok(aggregate(&self.claims(filter)?))
    }

    /// One claim of the current filter by ID (case-insensitive)
    pub fn find_claim(&self, filter: StatusFilter, id: &str) -> Result<Option<Claim>, ClaimError> {
        let claims = self.claims(filter)?;
        Ok(claims
            .iter()
            .find(|c| c.claim_id.eq_ignore_ascii_case(id.trim()))
            .cloned())
    }

    /// Answer `question` about the claims matching `filter`
    ///
    /// Blank questions are rejected before anything is loaded; load and
    /// completion failures come back as [`AskOutcome::Failed`].
    pub fn ask(&self, filter: StatusFilter, question: &str) -> AskOutcome {
        if is_blank(question) {
            return AskOutcome::empty_question();
        }

        match self.claims(filter) {
            Ok(claims) => self.composer.ask(self.completion.as_ref(), &claims, question),
            Err(err) => {
                tracing::debug!(error = %err, "could not load claims for question");
                match err {
                    ClaimError::Integrity { .. } => AskOutcome::failed_with(err, SCHEMA_HINT),
                    ClaimError::Fetch(_) => AskOutcome::failed(err),
                }
            }
        }
    }

    pub fn cache_stats(&self) -> DashboardCacheStats {
        DashboardCacheStats {
            claims: self.claims.stats(),
            summary: self.summary.stats(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        self.claims.ttl()
    }
}
