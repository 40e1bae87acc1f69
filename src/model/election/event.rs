use chrono::{serde::ts_seconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{Address, CandidateId, Phase};

/// Observable record of a successful state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElectionEvent {
    #[serde(rename_all = "camelCase")]
    ElectionCreated {
        name: String,
        commissioner: Address,
        #[serde(with = "ts_seconds")]
        start_time: DateTime<Utc>,
        #[serde(with = "ts_seconds")]
        end_time: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    VoterRegistered {
        voter: Address,
        national_id: String,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    CandidateNominated {
        candidate_id: CandidateId,
        name: String,
        party: String,
        manifesto: String,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    CandidateDeactivated {
        candidate_id: CandidateId,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    PhaseChanged {
        new_phase: Phase,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    VoteCast {
        voter: Address,
        candidate_id: CandidateId,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    VoterStatusUpdated {
        voter: Address,
        has_voted: bool,
    },
    #[serde(rename_all = "camelCase")]
    ResultsDeclared {
        winning_candidate_id: Option<CandidateId>,
        total_votes: u64,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    EmergencyStop {
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    CommissionerTransferred {
        previous: Address,
        new: Address,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

impl ElectionEvent {
    /// The voter whose record this event changed, if any.
    pub fn touched_voter(&self) -> Option<Address> {
        match self {
            Self::VoterRegistered { voter, .. } | Self::VoteCast { voter, .. } => Some(*voter),
            _ => None,
        }
    }

    /// The candidate whose record this event changed, if any.
    pub fn touched_candidate(&self) -> Option<CandidateId> {
        match self {
            Self::CandidateNominated { candidate_id, .. }
            | Self::CandidateDeactivated { candidate_id, .. }
            | Self::VoteCast { candidate_id, .. } => Some(*candidate_id),
            _ => None,
        }
    }
}

/// An event together with its position in the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: ElectionEvent,
}
