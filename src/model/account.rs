use argon2::Config;
use rand::Rng;
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::common::Address;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Request to open a new account. The address is chosen by the server.
#[derive(Clone, Deserialize, Serialize)]
pub struct NewAccount {
    pub password: String,
}

/// Raw login credentials, received from a user. These are never stored directly,
/// since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct AccountCredentials {
    pub address: Address,
    pub password: String,
}

/// Response to creating an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAddress {
    pub address: Address,
}

/// An identity that can log in and act as a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: Address,
    pub password_hash: String,
}

impl Account {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

impl TryFrom<NewAccount> for Account {
    type Error = Error;

    /// Create an account at a fresh random address by hashing the password.
    fn try_from(request: NewAccount) -> Result<Self, Self::Error> {
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::Status(
                Status::BadRequest,
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        // 16 bytes is the recommended salt length for Argon2.
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let password_hash =
            argon2::hash_encoded(request.password.as_bytes(), &salt, &Config::default())?;
        Ok(Self {
            address: Address::random(),
            password_hash,
        })
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl NewAccount {
        pub fn example() -> Self {
            Self {
                password: "correct horse battery".into(),
            }
        }

        pub fn short() -> Self {
            Self {
                password: "hunter2".into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let account = Account::try_from(NewAccount::example()).unwrap();
        assert!(!account.address.is_zero());
        assert!(account.password_hash.starts_with("$argon2"));
        assert!(account.verify_password("correct horse battery"));
        assert!(!account.verify_password("correct horse"));

        // Fresh address and salt each time.
        let other = Account::try_from(NewAccount::example()).unwrap();
        assert_ne!(account.address, other.address);
        assert_ne!(account.password_hash, other.password_hash);
    }

    #[test]
    fn short_password_rejected() {
        let result = Account::try_from(NewAccount::short());
        assert!(matches!(result, Err(Error::Status(status, _)) if status == Status::BadRequest));
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        let account = Account {
            address: Address::random(),
            password_hash: "not a hash".to_string(),
        };
        assert!(!account.verify_password("anything"));
    }
}
