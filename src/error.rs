use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{status, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::election::{ElectionError, SnapshotError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Election(#[from] ElectionError),
    #[error("Stored election is inconsistent: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// Shorthand for a 404.
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("Not found: {what}"))
    }

    /// The HTTP status this error should be reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Election(err) => match err {
                ElectionError::InvalidParameter(_) => Status::BadRequest,
                ElectionError::Unauthorized(_) => Status::Forbidden,
                ElectionError::WrongPhase { .. }
                | ElectionError::AlreadyRegistered(_)
                | ElectionError::DuplicateNationalId(_)
                | ElectionError::AlreadyVoted(_) => Status::Conflict,
                ElectionError::NotFound(_) | ElectionError::NotAvailable(_) => Status::NotFound,
                ElectionError::InvalidCandidate(_) => Status::UnprocessableEntity,
                ElectionError::PreconditionFailed(_) => Status::PreconditionFailed,
            },
            Self::Snapshot(_) | Self::Db(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Status(status, _) => *status,
        }
    }

    /// Machine-readable error kind, as reported in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Election(err) => err.kind(),
            Self::Snapshot(_) | Self::Db(_) | Self::Argon2(_) => "Internal",
            Self::Jwt(_) => "Unauthenticated",
            Self::Status(status, _) => match status.code {
                400 => "InvalidParameter",
                401 => "Unauthenticated",
                403 => "Unauthorized",
                404 => "NotFound",
                409 => "Conflict",
                412 => "PreconditionFailed",
                422 => "InvalidCandidate",
                500..=599 => "Internal",
                _ => "Error",
            },
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub reason: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let reason = if status.code >= 500 {
            // Don't leak internals to the client.
            error!("{self}");
            "Internal server error".to_string()
        } else {
            debug!("{self}");
            self.to_string()
        };
        let body = ErrorBody {
            error: self.kind().to_string(),
            reason,
        };
        status::Custom(status, Json(body)).respond_to(req)
    }
}
