use thiserror::Error;

use cineverse_store::StoreError;

/// Authentication failures. Login failures never distinguish "no such
/// user" from "wrong password", so usernames cannot be enumerated.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already taken")]
    UsernameTaken,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username and password must be non-empty")]
    InvalidInput,

    #[error(transparent)]
    Store(#[from] StoreError),
}
