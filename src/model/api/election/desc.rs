use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{Address, CandidateId, Phase},
    election::Election,
};

/// An API-friendly description of the election as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDescription {
    pub name: String,
    pub commissioner: Address,
    pub phase: Phase,
    #[serde(with = "ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub end_time: DateTime<Utc>,
    pub total_voters: u64,
    pub total_candidates: u64,
    pub total_votes_cast: u64,
    pub results_published: bool,
    pub winning_candidate_id: Option<CandidateId>,
}

impl From<&Election> for ElectionDescription {
    fn from(election: &Election) -> Self {
        Self {
            name: election.name().to_string(),
            commissioner: election.commissioner(),
            phase: election.phase(),
            start_time: election.start_time(),
            end_time: election.end_time(),
            total_voters: election.total_voters(),
            total_candidates: election.total_candidates(),
            total_votes_cast: election.total_votes_cast(),
            results_published: election.results_published(),
            winning_candidate_id: election.winning_candidate_id(),
        }
    }
}
