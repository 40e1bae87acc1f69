use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{caller_context, AuthToken},
            election::{ElectionDescription, VoteCount},
        },
        common::CandidateId,
        election::{Candidate, ElectionDump, ElectionResults, ElectionStatus, EventRecord},
        ledger::ElectionLedger,
    },
};

/// Events returned by one page of the log when no limit is given.
pub const DEFAULT_EVENT_PAGE: usize = 100;
/// Upper bound on the size of one page of the log.
pub const MAX_EVENT_PAGE: usize = 1000;

pub fn routes() -> Vec<Route> {
    routes![
        election,
        status,
        candidates,
        candidate,
        candidate_votes,
        results,
        events,
        dump,
    ]
}

#[get("/election")]
pub async fn election(ledger: &State<ElectionLedger>) -> Result<Json<ElectionDescription>> {
    let description = ledger
        .read(|election| ElectionDescription::from(election))
        .await?;
    Ok(Json(description))
}

#[get("/election/status")]
pub async fn status(ledger: &State<ElectionLedger>) -> Result<Json<ElectionStatus>> {
    Ok(Json(ledger.read(|election| election.status()).await?))
}

#[get("/election/candidates")]
pub async fn candidates(ledger: &State<ElectionLedger>) -> Result<Json<Vec<Candidate>>> {
    let candidates = ledger
        .read(|election| election.candidates().to_vec())
        .await?;
    Ok(Json(candidates))
}

#[get("/election/candidates/<candidate_id>")]
pub async fn candidate(
    candidate_id: CandidateId,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Candidate>> {
    let candidate = ledger
        .read(|election| election.candidate(candidate_id).cloned())
        .await??;
    Ok(Json(candidate))
}

/// Anonymous callers are allowed, but only see counts once results are out.
#[get("/election/candidates/<candidate_id>/votes")]
pub async fn candidate_votes(
    token: Option<AuthToken>,
    candidate_id: CandidateId,
    ledger: &State<ElectionLedger>,
) -> Result<Json<VoteCount>> {
    let ctx = caller_context(token);
    let votes = ledger
        .read(|election| election.candidate_vote_count(&ctx, candidate_id))
        .await??;
    Ok(Json(VoteCount { votes }))
}

#[get("/election/results")]
pub async fn results(ledger: &State<ElectionLedger>) -> Result<Json<ElectionResults>> {
    Ok(Json(ledger.read(|election| election.results()).await??))
}

#[get("/election/events?<since>&<limit>")]
pub async fn events(
    since: Option<u64>,
    limit: Option<usize>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Vec<EventRecord>>> {
    let since = since.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_EVENT_PAGE).min(MAX_EVENT_PAGE);
    let page = ledger
        .read(|election| election.events_since(since, limit).to_vec())
        .await?;
    Ok(Json(page))
}

/// Everything needed to independently verify the election.
#[get("/election/dump")]
pub async fn dump(ledger: &State<ElectionLedger>) -> Result<Json<ElectionDump>> {
    let dump = ledger
        .read(|election| ElectionDump::from(election))
        .await?;
    Ok(Json(dump))
}
