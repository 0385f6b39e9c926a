//! Claim record and the categorical values that describe it
//!
//! Claims are produced upstream (sentiment, summary and recommendation are
//! already filled in by the warehouse) and are only ever read here.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::core::store::{Row, StoreError, Value};

/// Adjudication status of a claim
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimStatus {
    Approved,
    Denied,
    Pending,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [
        ClaimStatus::Approved,
        ClaimStatus::Denied,
        ClaimStatus::Pending,
    ];

    /// Warehouse spelling of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Denied => "DENIED",
            ClaimStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "APPROVED" => Ok(ClaimStatus::Approved),
            "DENIED" => Ok(ClaimStatus::Denied),
            "PENDING" => Ok(ClaimStatus::Pending),
            _ => Err(format!("Unknown claim status: {}", s)),
        }
    }
}

/// Categorical sentiment derived upstream from the sentiment score
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize,
)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "neutral" => Ok(SentimentLabel::Neutral),
            "negative" => Ok(SentimentLabel::Negative),
            _ => Err(format!("Unknown sentiment label: {}", s)),
        }
    }
}

/// Which claims to load: everything, or a single status
///
/// This is the only user-controlled input that reaches the claims query, and
/// it can only ever be one of four values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ClaimStatus),
}

impl StatusFilter {
    /// The four options offered to the user, in display order
    pub const OPTIONS: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Only(ClaimStatus::Approved),
        StatusFilter::Only(ClaimStatus::Denied),
        StatusFilter::Only(ClaimStatus::Pending),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Only(status) => status.as_str(),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            return Ok(StatusFilter::All);
        }
        s.parse::<ClaimStatus>()
            .map(StatusFilter::Only)
            .map_err(|_| {
                format!(
                    "Unknown status filter: {} (expected ALL, APPROVED, DENIED or PENDING)",
                    s
                )
            })
    }
}

impl From<ClaimStatus> for StatusFilter {
    fn from(status: ClaimStatus) -> Self {
        StatusFilter::Only(status)
    }
}

/// One AI-enriched claim as stored in the warehouse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claim {
    pub claim_id: String,
    pub claim_date: NaiveDate,
    pub diagnosis_desc: String,
    pub claim_amount: f64,
    pub claim_status: ClaimStatus,
    /// Upstream score in -1.0..=1.0
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub provider_notes: String,
    pub patient_feedback: String,
    pub notes_summary: String,
    pub care_recommendation: String,
}

impl Claim {
    /// Warehouse column names, in select order
    pub const COLUMNS: [&'static str; 11] = [
        "CLAIM_ID",
        "CLAIM_DATE",
        "DIAGNOSIS_DESC",
        "CLAIM_AMOUNT",
        "CLAIM_STATUS",
        "SENTIMENT_SCORE",
        "SENTIMENT_LABEL",
        "PROVIDER_NOTES",
        "PATIENT_FEEDBACK",
        "NOTES_SUMMARY",
        "CARE_RECOMMENDATION",
    ];

    /// Decode a warehouse row
    pub fn from_row(row: &Row) -> Result<Self, FieldError> {
        Ok(Self {
            claim_id: required_text(row, "CLAIM_ID")?,
            claim_date: required_date(row, "CLAIM_DATE")?,
            diagnosis_desc: optional_text(row, "DIAGNOSIS_DESC")?,
            claim_amount: required_f64(row, "CLAIM_AMOUNT")?,
            claim_status: required_parsed(row, "CLAIM_STATUS")?,
            sentiment_score: required_f64(row, "SENTIMENT_SCORE")?,
            sentiment_label: required_parsed(row, "SENTIMENT_LABEL")?,
            provider_notes: optional_text(row, "PROVIDER_NOTES")?,
            patient_feedback: optional_text(row, "PATIENT_FEEDBACK")?,
            notes_summary: optional_text(row, "NOTES_SUMMARY")?,
            care_recommendation: optional_text(row, "CARE_RECOMMENDATION")?,
        })
    }
}

/// Per-status totals from the warehouse summary query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    pub claim_status: ClaimStatus,
    pub total_claims: u64,
    pub total_amount: f64,
    pub avg_sentiment: f64,
}

impl StatusSummary {
    pub const COLUMNS: [&'static str; 4] =
        ["CLAIM_STATUS", "TOTAL_CLAIMS", "TOTAL_AMOUNT", "AVG_SENTIMENT"];

    pub fn from_row(row: &Row) -> Result<Self, FieldError> {
        let total_claims = present(row, "TOTAL_CLAIMS")?;
        let total_claims = total_claims
            .as_i64()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| invalid("TOTAL_CLAIMS", total_claims))?;

        Ok(Self {
            claim_status: required_parsed(row, "CLAIM_STATUS")?,
            total_claims,
            // SUM/AVG are NULL only when every input is NULL
            total_amount: optional_f64(row, "TOTAL_AMOUNT")?.unwrap_or(0.0),
            avg_sentiment: optional_f64(row, "AVG_SENTIMENT")?.unwrap_or(0.0),
        })
    }
}

/// A single column that does not satisfy the claims schema
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("missing column {0}")]
    Missing(&'static str),

    #[error("column {0} is NULL")]
    Null(&'static str),

    #[error("column {column} has invalid value '{value}'")]
    Invalid { column: &'static str, value: String },
}

/// Errors from loading claims or summaries
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Failed to fetch claims: {0}")]
    Fetch(#[from] StoreError),

    #[error("Claims data does not match the expected schema (row {row}): {source}")]
    Integrity {
        row: usize,
        #[source]
        source: FieldError,
    },
}

fn present<'r>(row: &'r Row, column: &'static str) -> Result<&'r Value, FieldError> {
    row.get(column).ok_or(FieldError::Missing(column))
}

fn invalid(column: &'static str, value: &Value) -> FieldError {
    FieldError::Invalid {
        column,
        value: value.to_string(),
    }
}

fn required_text(row: &Row, column: &'static str) -> Result<String, FieldError> {
    match present(row, column)? {
        Value::Null => Err(FieldError::Null(column)),
        other => Ok(other.to_string()),
    }
}

fn optional_text(row: &Row, column: &'static str) -> Result<String, FieldError> {
    match present(row, column)? {
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

fn required_f64(row: &Row, column: &'static str) -> Result<f64, FieldError> {
    optional_f64(row, column)?.ok_or(FieldError::Null(column))
}

fn optional_f64(row: &Row, column: &'static str) -> Result<Option<f64>, FieldError> {
    let value = present(row, column)?;
    if value.is_null() {
        return Ok(None);
    }
    match value.as_f64() {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(invalid(column, value)),
    }
}

fn required_parsed<T: std::str::FromStr>(row: &Row, column: &'static str) -> Result<T, FieldError> {
    let value = present(row, column)?;
    let text = value.as_str().ok_or_else(|| match value {
        Value::Null => FieldError::Null(column),
        other => invalid(column, other),
    })?;
    text.parse().map_err(|_| invalid(column, value))
}

fn required_date(row: &Row, column: &'static str) -> Result<NaiveDate, FieldError> {
    let value = present(row, column)?;
    let text = match value {
        Value::Null => return Err(FieldError::Null(column)),
        Value::Text(s) => s.trim(),
        other => return Err(invalid(column, other)),
    };

    parse_date(text).ok_or_else(|| invalid(column, value))
}

/// Accepts a plain date or a timestamp (the date part is kept)
fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A claim with plausible defaults for tests
    pub fn claim(id: &str, status: ClaimStatus, score: f64, label: SentimentLabel) -> Claim {
        Claim {
            claim_id: id.to_string(),
            claim_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            diagnosis_desc: "Type 2 diabetes follow-up".to_string(),
            claim_amount: 250.0,
            claim_status: status,
            sentiment_score: score,
            sentiment_label: label,
            provider_notes: "Patient reports improved glucose control.".to_string(),
            patient_feedback: "Staff were helpful.".to_string(),
            notes_summary: "Stable diabetes, continue metformin.".to_string(),
            care_recommendation: "Recheck A1C in three months.".to_string(),
        }
    }

    /// The warehouse row that decodes into `claim`
    pub fn row(claim: &Claim) -> Row {
        Row::default()
            .with("CLAIM_ID", claim.claim_id.as_str())
            .with("CLAIM_DATE", claim.claim_date.format("%Y-%m-%d").to_string())
            .with("DIAGNOSIS_DESC", claim.diagnosis_desc.as_str())
            .with("CLAIM_AMOUNT", claim.claim_amount)
            .with("CLAIM_STATUS", claim.claim_status.as_str())
            .with("SENTIMENT_SCORE", claim.sentiment_score)
            .with("SENTIMENT_LABEL", claim.sentiment_label.as_str())
            .with("PROVIDER_NOTES", claim.provider_notes.as_str())
            .with("PATIENT_FEEDBACK", claim.patient_feedback.as_str())
            .with("NOTES_SUMMARY", claim.notes_summary.as_str())
            .with("CARE_RECOMMENDATION", claim.care_recommendation.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{claim, row};
    use super::*;

    #[test]
    fn test_status_filter_parse() {
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "denied".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(ClaimStatus::Denied)
        );
        assert!("DENIED' OR 1=1 --".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_status_filter_options_round_trip() {
        for option in StatusFilter::OPTIONS {
            assert_eq!(option.as_str().parse::<StatusFilter>().unwrap(), option);
        }
    }

    #[test]
    fn test_sentiment_label_parse_is_case_insensitive() {
        assert_eq!("NEGATIVE".parse::<SentimentLabel>().unwrap(), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::Negative.to_string(), "Negative");
        assert!("angry".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn test_claim_from_row() {
        let expected = claim("C1", ClaimStatus::Denied, -0.6, SentimentLabel::Negative);
        let decoded = Claim::from_row(&row(&expected)).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_claim_from_row_accepts_timestamps_and_integer_amounts() {
        let base = claim("C2", ClaimStatus::Approved, 0.4, SentimentLabel::Positive);
        let r = row(&base)
            .with("CLAIM_DATE", "2024-03-01 08:30:00")
            .with("CLAIM_AMOUNT", 250i64);
        let decoded = Claim::from_row(&r).unwrap();
        assert_eq!(decoded.claim_date, base.claim_date);
        assert_eq!(decoded.claim_amount, 250.0);
    }

    #[test]
    fn test_claim_from_row_null_free_text_is_empty() {
        let base = claim("C3", ClaimStatus::Pending, 0.0, SentimentLabel::Neutral);
        let r = row(&base).with("PATIENT_FEEDBACK", Value::Null);
        assert_eq!(Claim::from_row(&r).unwrap().patient_feedback, "");
    }

    #[test]
    fn test_claim_from_row_missing_column() {
        let mut r = Row::default();
        r.push("CLAIM_ID", "C4");
        assert_eq!(Claim::from_row(&r), Err(FieldError::Missing("CLAIM_DATE")));
    }

    #[test]
    fn test_claim_from_row_unknown_status() {
        let base = claim("C5", ClaimStatus::Pending, 0.0, SentimentLabel::Neutral);
        let r = row(&base).with("CLAIM_STATUS", "APPEALED");
        assert!(matches!(
            Claim::from_row(&r),
            Err(FieldError::Invalid { column: "CLAIM_STATUS", .. })
        ));
    }

    #[test]
    fn test_claim_from_row_null_score() {
        let base = claim("C6", ClaimStatus::Pending, 0.0, SentimentLabel::Neutral);
        let r = row(&base).with("SENTIMENT_SCORE", Value::Null);
        assert_eq!(Claim::from_row(&r), Err(FieldError::Null("SENTIMENT_SCORE")));
    }

    #[test]
    fn test_status_summary_from_row() {
        let r = Row::default()
            .with("CLAIM_STATUS", "DENIED")
            .with("TOTAL_CLAIMS", 4i64)
            .with("TOTAL_AMOUNT", 1200.5)
            .with("AVG_SENTIMENT", -0.25);
        let summary = StatusSummary::from_row(&r).unwrap();
        assert_eq!(summary.claim_status, ClaimStatus::Denied);
        assert_eq!(summary.total_claims, 4);
        assert_eq!(summary.total_amount, 1200.5);
        assert_eq!(summary.avg_sentiment, -0.25);
    }
}
