//! Credential verifier capability.
//!
//! Two interchangeable strategies assert "this credential belongs to user
//! N": a stateless signed token (default, nothing held server-side) and a
//! server-held opaque session map. Both plug into `AuthService` through
//! the same trait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use cineverse_crypto::TokenSigner;

pub trait CredentialVerifier: Send + Sync {
    /// Issue a credential bound to the given user id.
    fn issue(&self, user_id: i64) -> String;

    /// Recover the user id a credential was issued for, or `None` for a
    /// credential that is malformed, tampered with, or unknown.
    fn verify(&self, credential: &str) -> Option<i64>;

    /// Invalidate a credential. Returns whether anything was revoked.
    fn revoke(&self, credential: &str) -> bool;
}

/// Stateless variant: the credential is a signed token carrying its own
/// proof of authenticity.
pub struct SignedTokenVerifier {
    signer: TokenSigner,
}

impl SignedTokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            signer: TokenSigner::new(secret),
        }
    }
}

impl CredentialVerifier for SignedTokenVerifier {
    fn issue(&self, user_id: i64) -> String {
        self.signer.mint(user_id)
    }

    fn verify(&self, credential: &str) -> Option<i64> {
        self.signer.verify(credential)
    }

    /// Signed tokens cannot be revoked individually; they stay valid until
    /// the signing key rotates.
    fn revoke(&self, _credential: &str) -> bool {
        false
    }
}

/// Server-held variant: opaque random session ids mapped to user ids.
/// The map is injected state with an explicit lifecycle, not a process
/// global.
#[derive(Default)]
pub struct SessionMapVerifier {
    sessions: Mutex<HashMap<String, i64>>,
}

impl SessionMapVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all sessions (teardown / key-rotation equivalent).
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn active_sessions(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, i64>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialVerifier for SessionMapVerifier {
    fn issue(&self, user_id: i64) -> String {
        let session_id = hex::encode(rand::random::<[u8; 32]>());
        self.lock().insert(session_id.clone(), user_id);
        session_id
    }

    fn verify(&self, credential: &str) -> Option<i64> {
        self.lock().get(credential).copied()
    }

    fn revoke(&self, credential: &str) -> bool {
        self.lock().remove(credential).is_some()
    }
}
