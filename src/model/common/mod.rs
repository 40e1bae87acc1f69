//! Types shared between the engine, the database and the API.

mod address;
mod phase;

pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use phase::Phase;

/// Sequential candidate identifier, starting at 1.
pub type CandidateId = u64;
