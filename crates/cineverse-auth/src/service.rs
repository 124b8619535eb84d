//! The auth service: register / login / authenticate over the users table.
//!
//! Credential lifecycle: Anonymous → Registered → Authenticated(session)
//! → Anonymous (logout, or deletion of the underlying user).

use tracing::info;

use cineverse_crypto::{hash_password, verify_password};
use cineverse_store::UserStore;
use cineverse_types::User;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::verifier::{CredentialVerifier, SignedTokenVerifier};

pub struct AuthService<V: CredentialVerifier = SignedTokenVerifier> {
    users: UserStore,
    verifier: V,
    ignore_username_case: bool,
}

impl AuthService<SignedTokenVerifier> {
    /// Open the users table under the configured data directory with the
    /// default stateless token verifier.
    pub fn open(config: &AuthConfig) -> Result<Self, AuthError> {
        let users = UserStore::open(&config.data_dir)?;
        Ok(Self::with_verifier(
            users,
            SignedTokenVerifier::new(config.session_secret.as_bytes()),
            config,
        ))
    }
}

impl<V: CredentialVerifier> AuthService<V> {
    pub fn with_verifier(users: UserStore, verifier: V, config: &AuthConfig) -> Self {
        Self {
            users,
            verifier,
            ignore_username_case: config.ignore_username_case,
        }
    }

    /// Create an account. The duplicate check and the insert run as one
    /// store critical section; a lost race surfaces as `UsernameTaken`.
    pub fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AuthError::InvalidInput);
        }

        let digest = hash_password(password);
        match self
            .users
            .create_unique(username, &digest, self.ignore_username_case)?
        {
            Some(user) => {
                info!(username = %user.username, "user registered");
                Ok(user)
            }
            None => Err(AuthError::UsernameTaken),
        }
    }

    /// Verify credentials and issue a session credential bound to the
    /// user's id.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_by_username(username, self.ignore_username_case)?;

        // Unknown user and wrong password take the same exit.
        let Some(user) = user else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        info!(username = %user.username, "login succeeded");
        Ok(self.verifier.issue(user.id))
    }

    /// Resolve a credential to its current user. The user record is
    /// re-read on every call, so a user deleted after issuance resolves to
    /// anonymous rather than a stale identity. Malformed or tampered
    /// credentials are anonymous, not errors.
    pub fn authenticate(&self, credential: &str) -> Result<Option<User>, AuthError> {
        let Some(user_id) = self.verifier.verify(credential) else {
            return Ok(None);
        };
        Ok(self.users.find_by_id(user_id)?)
    }

    /// Invalidate a credential where the verifier supports it.
    pub fn logout(&self, credential: &str) -> bool {
        self.verifier.revoke(credential)
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }
}
