use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{Address, CandidateId};

/// A registered voter. Registration is permanent; voting happens at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub is_registered: bool,
    pub has_voted: bool,
    pub voted_candidate_id: Option<CandidateId>,
    #[serde(with = "ts_seconds")]
    pub registration_time: DateTime<Utc>,
    pub national_id: String,
}

impl Voter {
    pub(crate) fn new(national_id: String, registration_time: DateTime<Utc>) -> Self {
        Self {
            is_registered: true,
            has_voted: false,
            voted_candidate_id: None,
            registration_time,
            national_id,
        }
    }
}

/// A voter together with the address it belongs to, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRecord {
    pub address: Address,
    #[serde(flatten)]
    pub voter: Voter,
}
