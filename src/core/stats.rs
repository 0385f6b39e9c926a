//! Aggregate statistics over a loaded result set

use serde::Serialize;

use crate::core::claim::{Claim, ClaimStatus, SentimentLabel};

/// Headline metrics for the current result set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClaimsOverview {
    pub total: usize,
    pub approved: usize,
    pub denied: usize,
    pub pending: usize,
    /// Mean sentiment score, 0.0 for an empty result set
    pub mean_sentiment: f64,
    /// Claims labelled `Negative`
    pub negative: usize,
}

impl ClaimsOverview {
    pub fn count(&self, status: ClaimStatus) -> usize {
        match status {
            ClaimStatus::Approved => self.approved,
            ClaimStatus::Denied => self.denied,
            ClaimStatus::Pending => self.pending,
        }
    }
}

/// Compute headline metrics for `claims`
pub fn aggregate(claims: &[Claim]) -> ClaimsOverview {
    let mut overview = ClaimsOverview {
        total: claims.len(),
        ..Default::default()
    };

    let mut score_sum = 0.0;
    for claim in claims {
        match claim.claim_status {
            ClaimStatus::Approved => overview.approved += 1,
            ClaimStatus::Denied => overview.denied += 1,
            ClaimStatus::Pending => overview.pending += 1,
        }
        if claim.sentiment_label == SentimentLabel::Negative {
            overview.negative += 1;
        }
        score_sum += claim.sentiment_score;
    }

    if !claims.is_empty() {
        overview.mean_sentiment = score_sum / claims.len() as f64;
    }

    overview
}

/// Number of claims carrying one sentiment label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: SentimentLabel,
    pub count: usize,
}

/// Label frequencies, most common first; labels that never occur are omitted
pub fn sentiment_distribution(claims: &[Claim]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ]
    .into_iter()
    .map(|label| LabelCount {
        label,
        count: claims.iter().filter(|c| c.sentiment_label == label).count(),
    })
    .filter(|lc| lc.count > 0)
    .collect();

    // Stable sort keeps Positive/Neutral/Negative order on ties
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Claims ordered from most negative to most positive score
pub fn by_sentiment(claims: &[Claim]) -> Vec<&Claim> {
    let mut sorted: Vec<&Claim> = claims.iter().collect();
    sorted.sort_by(|a, b| a.sentiment_score.total_cmp(&b.sentiment_score));
    sorted
}
