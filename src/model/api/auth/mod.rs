mod token;

pub use token::{caller_context, AuthToken, AUTH_TOKEN_COOKIE};
