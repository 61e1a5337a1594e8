//! Postal webhook signature verification.
//!
//! Postal signs every webhook body with its RSA key. This library checks that
//! signature so a webhook receiver can reject forged requests:
//!
//! ```text
//! raw key → PEM → RSA public key ┐
//!                                ├→ RSA/SHA-1 verify → bool
//! body → canonical JSON bytes  ──┘
//! ```
//!
//! The `postal-verify` binary wraps the same routine for checking captured
//! webhooks from the command line.

pub mod config;
pub mod error;
pub mod webhook;

// Re-export commonly used types
pub use config::Config;
pub use error::{KeyError, VerifyError};
pub use webhook::{
    canonicalize, is_signature_verification_enabled, verify_postal_signature,
    verify_postal_signature_async, PostalVerifier,
};
