use rocket::{http::Status, Catcher, Request, Route};

use crate::error::Error;

mod auth;
mod commissioner;
mod public;
mod voter;

#[cfg(test)]
pub(crate) mod testing;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(commissioner::routes());
    routes.extend(voter::routes());
    routes.extend(public::routes());
    routes
}

/// Failed guards and unmatched requests still get a JSON error body.
pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> Error {
    let reason = status.reason().unwrap_or("Unknown error").to_string();
    Error::Status(status, reason)
}
