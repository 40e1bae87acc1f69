use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use mongodb::bson::Bson;
use rand::RngCore;
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes in an [`Address`].
pub const ADDRESS_LENGTH: usize = 20;

/// The identity of a caller: a 20-byte account address, written as `0x`
/// followed by 40 hex digits.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The null identity. Anonymous callers act as this address.
    pub const ZERO: Address = Address([0; ADDRESS_LENGTH]);

    /// Generate a fresh random address.
    pub fn random() -> Self {
        let mut bytes = [0; ADDRESS_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Is this the null identity?
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Errors when parsing an [`Address`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be {} hex digits, got {0}", ADDRESS_LENGTH * 2)]
    Length(usize),
    #[error("address is not valid hex: {0}")]
    Hex(#[from] data_encoding::DecodeError),
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(AddressError::Length(digits.len()));
        }
        let decoded = HEXLOWER_PERMISSIVE.decode(digits.as_bytes())?;
        let mut bytes = [0; ADDRESS_LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", HEXLOWER.encode(&self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({self})")
    }
}

impl From<Address> for Bson {
    fn from(address: Address) -> Self {
        Bson::String(address.to_string())
    }
}

impl<'a> FromParam<'a> for Address {
    type Error = AddressError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

impl UriDisplay<Path> for Address {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(self.to_string())
    }
}

impl_from_uri_param_identity!([Path] Address);
