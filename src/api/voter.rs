use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            election::{CandidateRef, Flag},
        },
        common::Address,
        election::Voter,
        ledger::ElectionLedger,
    },
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, get_voter, is_registered, has_voted]
}

#[post("/election/votes", data = "<vote>", format = "json")]
pub async fn cast_vote(
    token: AuthToken,
    vote: Json<CandidateRef>,
    ledger: &State<ElectionLedger>,
) -> Result<()> {
    let ctx = token.context();
    let candidate_id = vote.candidate_id;
    ledger
        .execute(|election| election.cast_vote(&ctx, candidate_id))
        .await
}

/// A voter's full record, visible to the voter themselves and the commissioner.
#[get("/election/voters/<address>")]
pub async fn get_voter(
    token: AuthToken,
    address: Address,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Voter>> {
    let ctx = token.context();
    let voter = ledger
        .read(|election| election.voter(&ctx, &address).cloned())
        .await??;
    Ok(Json(voter))
}

#[get("/election/voters/<address>/registered")]
pub async fn is_registered(address: Address, ledger: &State<ElectionLedger>) -> Result<Json<Flag>> {
    let value = ledger
        .read(|election| election.is_registered_voter(&address))
        .await?;
    Ok(Json(Flag { value }))
}

#[get("/election/voters/<address>/voted")]
pub async fn has_voted(address: Address, ledger: &State<ElectionLedger>) -> Result<Json<Flag>> {
    let value = ledger
        .read(|election| election.has_voter_voted(&address))
        .await?;
    Ok(Json(Flag { value }))
}
