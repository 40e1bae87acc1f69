use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, Phase};

use super::candidate::Candidate;

/// Aggregate snapshot of the election, readable by anyone at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionStatus {
    pub name: String,
    pub phase: Phase,
    #[serde(with = "ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub end_time: DateTime<Utc>,
    pub total_voters: u64,
    pub total_candidates: u64,
    pub votes_cast: u64,
    pub results_available: bool,
}

/// The declared winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    pub votes: u64,
}

/// Published election results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResults {
    /// `None` if no candidate received a single vote.
    pub winner: Option<Winner>,
    pub total_votes: u64,
}

/// Scan candidates in ascending id order and return the one with strictly the
/// most votes. Ties go to the lowest id; zero votes never win.
pub fn find_winner<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Option<&'a Candidate> {
    let mut winner = None;
    let mut max_votes = 0;
    for candidate in candidates {
        if candidate.vote_count > max_votes {
            max_votes = candidate.vote_count;
            winner = Some(candidate);
        }
    }
    winner
}
