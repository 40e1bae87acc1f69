use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::try_outcome,
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    account::Account, common::Address, election::CallContext, ledger::ElectionLedger,
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token proving that the bearer controls an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(rename = "sub")]
    pub address: Address,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given account.
    pub fn new(account: &Account) -> Self {
        Self {
            address: account.address,
        }
    }

    /// The context for a call made by this token's account, right now.
    pub fn context(&self) -> CallContext {
        CallContext::new(self.address)
    }

    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Result<Cookie<'static>, Error> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;

        Ok(Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish())
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

fn unauthenticated(reason: &str) -> Outcome<AuthToken, Error> {
    Outcome::Failure((
        Status::Unauthorized,
        Error::Status(Status::Unauthorized, reason.to_string()),
    ))
}

/// Context for a call from whoever is on the other end of a request: the
/// logged-in account if there is one, else the null identity.
pub fn caller_context(token: Option<AuthToken>) -> CallContext {
    token
        .map(|token| token.context())
        .unwrap_or_else(CallContext::anonymous)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and check that its account exists.
    ///
    /// Fails with 401 Unauthorized if not. Routes that also serve anonymous
    /// callers should take an `Option<AuthToken>` instead.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = try_outcome!(req.guard::<&State<Config>>().await.map_failure(|(status, _)| {
            (status, Error::Status(status, "Config is not managed".to_string()))
        }));

        let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) else {
            return unauthenticated("Not logged in");
        };
        let token = match Self::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(_) => return unauthenticated("Invalid or expired login"),
        };

        // Check the account actually exists.
        let ledger = try_outcome!(req.guard::<&State<ElectionLedger>>().await.map_failure(
            |(status, _)| (status, Error::Status(status, "Ledger is not managed".to_string()))
        ));
        match ledger.store().find_account(&token.address).await {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => unauthenticated("No such account"),
            Err(e) => Outcome::Failure((Status::InternalServerError, e)),
        }
    }
}
