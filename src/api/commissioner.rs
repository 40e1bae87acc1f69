use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::AuthToken,
            election::{
                BatchVoterRegistration, CandidateNomination, CandidateRef, CommissionerTransfer,
                ElectionDescription, ElectionSpec, PhaseChange, VoterRegistration,
            },
        },
        common::CandidateId,
        ledger::ElectionLedger,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        deploy,
        register_voter,
        batch_register_voters,
        nominate_candidate,
        deactivate_candidate,
        next_phase,
        emergency_stop,
        transfer_commissioner,
    ]
}

#[post("/election", data = "<spec>", format = "json")]
pub async fn deploy(
    token: AuthToken,
    spec: Json<ElectionSpec>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<ElectionDescription>> {
    let ElectionSpec {
        name,
        duration_in_days,
    } = spec.0;
    ledger
        .deploy(&token.context(), name, duration_in_days)
        .await?;
    let description = ledger
        .read(|election| ElectionDescription::from(election))
        .await?;
    Ok(Json(description))
}

#[post("/election/voters", data = "<registration>", format = "json")]
pub async fn register_voter(
    token: AuthToken,
    registration: Json<VoterRegistration>,
    ledger: &State<ElectionLedger>,
) -> Result<()> {
    let ctx = token.context();
    let VoterRegistration {
        address,
        national_id,
    } = registration.0;
    ledger
        .execute(|election| election.register_voter(&ctx, address, national_id))
        .await
}

#[post("/election/voters/batch", data = "<batch>", format = "json")]
pub async fn batch_register_voters(
    token: AuthToken,
    batch: Json<BatchVoterRegistration>,
    ledger: &State<ElectionLedger>,
) -> Result<()> {
    let ctx = token.context();
    let BatchVoterRegistration {
        addresses,
        national_ids,
    } = batch.0;
    ledger
        .execute(|election| election.batch_register_voters(&ctx, addresses, national_ids))
        .await
}

#[post("/election/candidates", data = "<nomination>", format = "json")]
pub async fn nominate_candidate(
    token: AuthToken,
    nomination: Json<CandidateNomination>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<CandidateRef>> {
    let ctx = token.context();
    let CandidateNomination {
        name,
        party,
        manifesto,
    } = nomination.0;
    let candidate_id = ledger
        .execute(|election| election.nominate_candidate(&ctx, name, party, manifesto))
        .await?;
    Ok(Json(CandidateRef { candidate_id }))
}

#[post("/election/candidates/<candidate_id>/deactivate")]
pub async fn deactivate_candidate(
    token: AuthToken,
    candidate_id: CandidateId,
    ledger: &State<ElectionLedger>,
) -> Result<()> {
    let ctx = token.context();
    ledger
        .execute(|election| election.deactivate_candidate(&ctx, candidate_id))
        .await
}

#[post("/election/phase/next")]
pub async fn next_phase(
    token: AuthToken,
    ledger: &State<ElectionLedger>,
) -> Result<Json<PhaseChange>> {
    let ctx = token.context();
    let new_phase = ledger
        .execute(|election| election.move_to_next_phase(&ctx))
        .await?;
    info!("Election moved to phase {new_phase}");
    Ok(Json(PhaseChange { new_phase }))
}

#[post("/election/emergency-stop")]
pub async fn emergency_stop(token: AuthToken, ledger: &State<ElectionLedger>) -> Result<()> {
    let ctx = token.context();
    ledger
        .execute(|election| election.emergency_stop(&ctx))
        .await?;
    warn!("Election stopped early by {}", ctx.caller);
    Ok(())
}

#[put("/election/commissioner", data = "<transfer>", format = "json")]
pub async fn transfer_commissioner(
    token: AuthToken,
    transfer: Json<CommissionerTransfer>,
    ledger: &State<ElectionLedger>,
) -> Result<()> {
    let ctx = token.context();
    let new = transfer.new_commissioner;
    ledger
        .execute(|election| election.transfer_commissioner(&ctx, new))
        .await?;
    info!("Commissioner role passed from {} to {new}", ctx.caller);
    Ok(())
}
