use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        account::{Account, AccountAddress, AccountCredentials, NewAccount},
        api::auth::{AuthToken, AUTH_TOKEN_COOKIE},
        ledger::ElectionLedger,
    },
};

pub fn routes() -> Vec<Route> {
    routes![create_account, authenticate, logout]
}

#[post("/accounts", data = "<request>", format = "json")]
pub async fn create_account(
    request: Json<NewAccount>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<AccountAddress>> {
    let account = Account::try_from(request.0)?;
    ledger.store().insert_account(&account).await?;
    info!("Created account {}", account.address);
    Ok(Json(AccountAddress {
        address: account.address,
    }))
}

#[post("/auth", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AccountCredentials>,
    ledger: &State<ElectionLedger>,
    config: &State<Config>,
) -> Result<()> {
    let account = ledger
        .store()
        .find_account(&credentials.address)
        .await?
        .filter(|account| account.verify_password(&credentials.password))
        .ok_or_else(|| {
            Error::Status(
                Status::Unauthorized,
                "No account found with the provided address and password combination."
                    .to_string(),
            )
        })?;

    let token = AuthToken::new(&account);
    cookies.add(token.into_cookie(config)?);

    Ok(())
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
