//! Error types for webhook signature verification.
//!
//! Failures fall into two tiers:
//! - input errors (bad key text, bad signature, tampered body) which anyone
//!   sending a request can trigger and which verification reports as `false`
//! - configuration errors, which are returned as [`VerifyError`] so an
//!   operator can tell a misconfigured deployment from a forged request

use rsa::pkcs8::{spki, ObjectIdentifier};
use thiserror::Error;

use crate::webhook::pem::ChunkSplitError;

/// Why a raw public key could not be turned into an RSA verifying key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("public key could not be formatted as PEM: {0}")]
    Format(#[from] ChunkSplitError),

    #[error("public key is not a valid RSA SubjectPublicKeyInfo: {0}")]
    Malformed(#[from] spki::Error),

    #[error("unsupported public key algorithm: {0}")]
    UnsupportedAlgorithm(ObjectIdentifier),

    #[error("unsupported RSA key size: {0} bits")]
    UnsupportedKeySize(usize),
}

impl KeyError {
    /// Whether the failure comes from the key text itself rather than from a
    /// key of the wrong kind being configured.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            KeyError::UnsupportedAlgorithm(_) | KeyError::UnsupportedKeySize(_)
        )
    }
}

/// Verification failed for a reason other than "the signature does not match".
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("webhook body has no JSON representation: {0}")]
    Serialize(#[from] serde_json::Error),
}
