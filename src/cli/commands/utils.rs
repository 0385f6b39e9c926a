//! Shared utilities for CLI commands

use miette::Result;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::core::claim::ClaimError;
use crate::core::dashboard::{completion_from_config, Dashboard, DashboardSettings};
use crate::core::prompt::SCHEMA_HINT;
use crate::core::store::{DataStore, SqliteStore};
use crate::core::Config;

/// Load configuration with command-line overrides applied
pub fn load_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    if let Some(database) = &global.database {
        config.database = Some(database.clone());
    }
    config
}

/// Open the warehouse and build the session every view reads from
pub fn open_dashboard(global: &GlobalOpts) -> Result<Dashboard> {
    let config = load_config(global);
    let settings =
        DashboardSettings::from_config(&config).map_err(|e| miette::miette!("{}", e))?;

    let path = config.database();
    let store: Arc<dyn DataStore> =
        Arc::new(SqliteStore::open(&path).map_err(|e| miette::miette!("{}", e))?);
    let completion = completion_from_config(&config, Arc::clone(&store))
        .map_err(|e| miette::miette!("{}", e))?;

    let dashboard = Dashboard::new(store, completion, settings);
    tracing::debug!(
        database = %path.display(),
        table = %dashboard.table(),
        model = dashboard.composer().model(),
        context_limit = dashboard.composer().context_limit(),
        "dashboard opened"
    );
    Ok(dashboard)
}

/// Convert a load failure into a diagnostic
pub fn load_error(err: ClaimError) -> miette::Report {
    match &err {
        ClaimError::Integrity { .. } => miette::miette!(help = SCHEMA_HINT, "{}", err),
        ClaimError::Fetch(_) => miette::miette!("{}", err),
    }
}

/// Serialize `value` as pretty JSON
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| miette::miette!("{}", e))
}

/// Serialize `value` as YAML
pub fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_yml::to_string(value).map_err(|e| miette::miette!("{}", e))
}
