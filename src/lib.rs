#[macro_use]
extern crate rocket;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, LedgerFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

/// Assemble the server, configured from `Rocket.toml` and the environment.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(LedgerFairing)
}

/// A server backed by the given store, with a fixed test configuration.
#[cfg(test)]
pub(crate) async fn rocket_for_store(store: model::store::MemoryStore) -> Rocket<Build> {
    use rocket::figment::Figment;

    let figment = Figment::from(rocket::Config::debug_default())
        .merge(("jwt_secret", "test secret, do not use"))
        .merge(("auth_ttl", 3600))
        .merge(("log_level", "off"));
    let ledger = model::ledger::ElectionLedger::open(store)
        .await
        .unwrap();

    rocket::custom(figment)
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .manage(ledger)
}
