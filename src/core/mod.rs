//! Core module - claims data access, caching, statistics and prompting

pub mod cache;
pub mod claim;
pub mod completion;
pub mod config;
pub mod dashboard;
pub mod prompt;
pub mod query;
pub mod sql;
pub mod stats;
pub mod store;

pub use cache::{CacheStats, Clock, ManualClock, ResultCache, SystemClock};
pub use claim::{Claim, ClaimError, ClaimStatus, SentimentLabel, StatusFilter, StatusSummary};
pub use completion::{CompletionError, CompletionService, HttpCompletion, WarehouseCompletion};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardSettings};
pub use prompt::{AskOutcome, PromptComposer};
pub use sql::QualifiedName;
pub use stats::{aggregate, ClaimsOverview};
pub use store::{DataStore, Row, SqliteStore, StoreError, Value};
