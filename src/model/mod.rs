pub mod account;
pub mod api;
pub mod common;
pub mod election;
pub mod ledger;
pub mod mongodb;
pub mod store;
