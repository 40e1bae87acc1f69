use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::CandidateId;

/// A nominated candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    pub manifesto: String,
    pub vote_count: u64,
    /// Cleared permanently by deactivation; inactive candidates cannot receive votes.
    pub is_active: bool,
    #[serde(with = "ts_seconds")]
    pub nomination_time: DateTime<Utc>,
}
