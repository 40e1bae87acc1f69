use serde::{Deserialize, Serialize};

use crate::model::common::{Address, CandidateId, Phase};

/// Request to deploy the election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub name: String,
    pub duration_in_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRegistration {
    pub address: Address,
    pub national_id: String,
}

/// Parallel lists of addresses and national IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchVoterRegistration {
    pub addresses: Vec<Address>,
    pub national_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateNomination {
    pub name: String,
    pub party: String,
    #[serde(default)]
    pub manifesto: String,
}

/// Reference to a candidate, both as a request (casting a vote) and a
/// response (nominating a candidate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRef {
    pub candidate_id: CandidateId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionerTransfer {
    pub new_commissioner: Address,
}

/// Response to a yes/no query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub value: bool,
}

/// Response to a vote count query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub votes: u64,
}

/// Response to a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseChange {
    pub new_phase: Phase,
}
