use chrono::{DateTime, SubsecRound, Utc};

use crate::model::common::Address;

/// Who is calling, and when.
///
/// Times are whole seconds, so every recorded timestamp survives a trip
/// through JSON or the database unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub now: DateTime<Utc>,
}

impl CallContext {
    /// A call made by `caller` at the current time.
    pub fn new(caller: Address) -> Self {
        Self::at(caller, Utc::now())
    }

    /// A call made by `caller` at the given time.
    pub fn at(caller: Address, now: DateTime<Utc>) -> Self {
        Self {
            caller,
            now: now.trunc_subsecs(0),
        }
    }

    /// A call made without any identity.
    pub fn anonymous() -> Self {
        Self::new(Address::ZERO)
    }
}
