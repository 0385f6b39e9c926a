//! Query construction and row decoding for the claims table

use crate::core::claim::{Claim, ClaimError, StatusFilter, StatusSummary};
use crate::core::sql::{quote_literal, QualifiedName};
use crate::core::store::DataStore;

/// Default warehouse table holding the enriched claims
pub const CLAIMS_TABLE: &str = "AI_ENRICHED_CLAIMS";

/// Default table name as a validated identifier
pub fn default_table() -> QualifiedName {
    QualifiedName::from_static(CLAIMS_TABLE)
}

/// Build the claims query for `filter`, newest claims first
pub fn claims_query(table: &QualifiedName, filter: StatusFilter) -> String {
    let mut sql = format!("SELECT {} FROM {}", Claim::COLUMNS.join(", "), table);

    if let StatusFilter::Only(status) = filter {
        sql.push_str(" WHERE CLAIM_STATUS = ");
        sql.push_str(&quote_literal(status.as_str()));
    }

    sql.push_str(" ORDER BY CLAIM_DATE DESC");
    sql
}

/// Build the per-status summary query
pub fn summary_query(table: &QualifiedName) -> String {
    format!(
        "SELECT CLAIM_STATUS, COUNT(*) AS TOTAL_CLAIMS, SUM(CLAIM_AMOUNT) AS TOTAL_AMOUNT, \
         AVG(SENTIMENT_SCORE) AS AVG_SENTIMENT FROM {} GROUP BY CLAIM_STATUS ORDER BY CLAIM_STATUS",
        table
    )
}

/// Fetch and decode the claims matching `filter`
pub fn load_claims(
    store: &dyn DataStore,
    table: &QualifiedName,
    filter: StatusFilter,
) -> Result<Vec<Claim>, ClaimError> {
    let sql = claims_query(table, filter);
    tracing::debug!(%filter, %sql, "loading claims");

    store
        .run_query(&sql)?
        .iter()
        .enumerate()
        .map(|(row, r)| Claim::from_row(r).map_err(|source| ClaimError::Integrity { row, source }))
        .collect()
}

/// Fetch and decode the per-status summary
pub fn load_summary(
    store: &dyn DataStore,
    table: &QualifiedName,
) -> Result<Vec<StatusSummary>, ClaimError> {
    let sql = summary_query(table);
    tracing::debug!(%sql, "loading summary statistics");

    store
        .run_query(&sql)?
        .iter()
        .enumerate()
        .map(|(row, r)| {
            StatusSummary::from_row(r).map_err(|source| ClaimError::Integrity { row, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::claim::fixtures::{claim, row};
    use crate::core::claim::{ClaimStatus, FieldError, SentimentLabel};
    use crate::core::store::{Row, StoreError};
    use std::sync::Mutex;

    /// Records every query and answers with canned rows
    struct FakeStore {
        rows: Vec<Row>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                rows,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl DataStore for FakeStore {
        fn run_query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
            self.seen.lock().unwrap().push(sql.to_string());
            Ok(self.rows.clone())
        }
    }

    #[test]
    fn test_claims_query_all_has_no_where_clause() {
        let sql = claims_query(&default_table(), StatusFilter::All);
        assert!(!sql.contains("WHERE"));
        assert!(sql.starts_with("SELECT CLAIM_ID, CLAIM_DATE,"));
        assert!(sql.contains("FROM AI_ENRICHED_CLAIMS"));
        assert!(sql.ends_with(" ORDER BY CLAIM_DATE DESC"));
    }

    #[test]
    fn test_claims_query_restricts_to_exactly_one_status() {
        for status in ClaimStatus::ALL {
            let sql = claims_query(&default_table(), StatusFilter::Only(status));
            let clause = format!(" WHERE CLAIM_STATUS = '{}' ORDER BY", status.as_str());
            assert!(sql.contains(&clause), "{sql}");
            assert_eq!(sql.matches("WHERE").count(), 1);
            for other in ClaimStatus::ALL.iter().filter(|s| **s != status) {
                assert!(!sql.contains(other.as_str()));
            }
        }
    }

    #[test]
    fn test_claims_query_uses_configured_table() {
        let table: QualifiedName = "CORTEX_DEMO.HEALTHCARE.AI_ENRICHED_CLAIMS".parse().unwrap();
        let sql = claims_query(&table, StatusFilter::All);
        assert!(sql.contains("FROM CORTEX_DEMO.HEALTHCARE.AI_ENRICHED_CLAIMS ORDER BY"));
    }

    #[test]
    fn test_summary_query_shape() {
        let sql = summary_query(&default_table());
        for column in StatusSummary::COLUMNS {
            assert!(sql.contains(column), "{column} missing from {sql}");
        }
        assert!(sql.contains("GROUP BY CLAIM_STATUS"));
        assert!(sql.ends_with("ORDER BY CLAIM_STATUS"));
    }

    #[test]
    fn test_load_claims_decodes_rows_through_store() {
        let c1 = claim("C1", ClaimStatus::Denied, -0.5, SentimentLabel::Negative);
        let c2 = claim("C2", ClaimStatus::Denied, 0.1, SentimentLabel::Neutral);
        let store = FakeStore::new(vec![row(&c1), row(&c2)]);

        let claims = load_claims(&store, &default_table(), ClaimStatus::Denied.into()).unwrap();
        assert_eq!(claims, vec![c1, c2]);

        let seen = store.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("WHERE CLAIM_STATUS = 'DENIED'"));
    }

    #[test]
    fn test_load_claims_reports_integrity_errors_with_row() {
        let good = claim("C1", ClaimStatus::Approved, 0.5, SentimentLabel::Positive);
        let bad = row(&good).with("SENTIMENT_LABEL", "Furious");
        let store = FakeStore::new(vec![row(&good), bad]);

        let err = load_claims(&store, &default_table(), StatusFilter::All).unwrap_err();
        match err {
            ClaimError::Integrity { row, source } => {
                assert_eq!(row, 1);
                assert!(matches!(source, FieldError::Invalid { column: "SENTIMENT_LABEL", .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_summary() {
        let store = FakeStore::new(vec![Row::default()
            .with("CLAIM_STATUS", "APPROVED")
            .with("TOTAL_CLAIMS", 3i64)
            .with("TOTAL_AMOUNT", 900.0)
            .with("AVG_SENTIMENT", 0.4)]);

        let summary = load_summary(&store, &default_table()).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].claim_status, ClaimStatus::Approved);
        assert_eq!(summary[0].total_claims, 3);
    }
}
