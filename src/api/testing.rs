//! Request helpers shared by the endpoint tests.

use rocket::{
    http::{ContentType, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::serde_json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::model::{
    account::{AccountAddress, AccountCredentials, NewAccount},
    api::election::{CandidateNomination, CandidateRef, ElectionDescription, ElectionSpec},
    common::{Address, CandidateId},
};

pub const COMMISSIONER_PASSWORD: &str = "commissioner password";
pub const VOTER_PASSWORD: &str = "voter password";

/// POST `body` as JSON and check the response status.
pub async fn post_expect_status<'c, T: Serialize>(
    client: &'c Client,
    uri: String,
    body: &T,
    status: Status,
) -> LocalResponse<'c> {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(serde_json::to_string(body).unwrap())
        .dispatch()
        .await;
    assert_eq!(response.status(), status);
    response
}

/// GET and check the response status.
pub async fn get_expect_status<'c>(client: &'c Client, uri: String, status: Status) -> LocalResponse<'c> {
    let response = client.get(uri).dispatch().await;
    assert_eq!(response.status(), status);
    response
}

/// Decode a JSON response body.
pub async fn json<T: DeserializeOwned>(response: LocalResponse<'_>) -> T {
    serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
}

pub async fn create_account(client: &Client, password: &str) -> Address {
    let request = NewAccount {
        password: password.to_string(),
    };
    let response = post_expect_status(
        client,
        uri!(crate::api::auth::create_account).to_string(),
        &request,
        Status::Ok,
    )
    .await;
    json::<AccountAddress>(response).await.address
}

pub async fn login(client: &Client, address: Address, password: &str) {
    let credentials = AccountCredentials {
        address,
        password: password.to_string(),
    };
    post_expect_status(
        client,
        uri!(crate::api::auth::authenticate).to_string(),
        &credentials,
        Status::Ok,
    )
    .await;
}

pub async fn logout(client: &Client) {
    let response = client.delete(uri!(crate::api::auth::logout)).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}

pub async fn description(client: &Client) -> ElectionDescription {
    let response = get_expect_status(
        client,
        uri!(crate::api::public::election).to_string(),
        Status::Ok,
    )
    .await;
    json(response).await
}

/// Create a commissioner account, log in as it, and deploy the example election.
pub async fn deploy_example(client: &Client) -> ElectionDescription {
    let commissioner = create_account(client, COMMISSIONER_PASSWORD).await;
    login(client, commissioner, COMMISSIONER_PASSWORD).await;
    let response = post_expect_status(
        client,
        uri!(crate::api::commissioner::deploy).to_string(),
        &ElectionSpec::example(),
        Status::Ok,
    )
    .await;
    json(response).await
}

pub async fn login_commissioner(client: &Client) {
    let commissioner = description(client).await.commissioner;
    login(client, commissioner, COMMISSIONER_PASSWORD).await;
}

/// Create `count` voter accounts and register them. Requires the commissioner to be logged in.
pub async fn register_voters(client: &Client, count: usize) -> Vec<Address> {
    let mut voters = Vec::with_capacity(count);
    for _ in 0..count {
        voters.push(create_account(client, VOTER_PASSWORD).await);
    }
    let ids = voters
        .iter()
        .map(|voter| format!("NID-{voter}"))
        .collect::<Vec<_>>();
    let batch = crate::model::api::election::BatchVoterRegistration {
        addresses: voters.clone(),
        national_ids: ids,
    };
    post_expect_status(
        client,
        uri!(crate::api::commissioner::batch_register_voters).to_string(),
        &batch,
        Status::Ok,
    )
    .await;
    voters
}

pub async fn nominate(client: &Client, party: &str) -> CandidateId {
    let response = post_expect_status(
        client,
        uri!(crate::api::commissioner::nominate_candidate).to_string(),
        &CandidateNomination::example(party),
        Status::Ok,
    )
    .await;
    json::<CandidateRef>(response).await.candidate_id
}

pub async fn next_phase_expect_status(client: &Client, status: Status) {
    let response = client
        .post(uri!(crate::api::commissioner::next_phase))
        .dispatch()
        .await;
    assert_eq!(response.status(), status);
}

pub async fn next_phase(client: &Client) {
    next_phase_expect_status(client, Status::Ok).await
}

/// Log in as `voter` and vote for `candidate`, checking the response status.
pub async fn vote_as(client: &Client, voter: Address, candidate: CandidateId, status: Status) {
    login(client, voter, VOTER_PASSWORD).await;
    post_expect_status(
        client,
        uri!(crate::api::voter::cast_vote).to_string(),
        &CandidateRef {
            candidate_id: candidate,
        },
        status,
    )
    .await;
}

/// Take the deployed example election to the Voting phase with `voters` registered
/// voters and one candidate per party. Leaves the commissioner logged in.
pub async fn open_voting(client: &Client, voters: usize, parties: &[&str]) -> (Vec<Address>, Vec<CandidateId>) {
    let voters = register_voters(client, voters).await;
    next_phase(client).await;
    let mut candidates = Vec::with_capacity(parties.len());
    for party in parties {
        candidates.push(nominate(client, party).await);
    }
    next_phase(client).await;
    (voters, candidates)
}
