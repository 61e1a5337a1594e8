//! Postal webhook authentication.
//!
//! This module verifies that a webhook body was signed by Postal:
//! - `pem`: rebuilds Postal's bare base64 key into a PEM envelope
//! - `canonical`: re-encodes the body to the exact bytes Postal signed
//! - `signature`: RSA/SHA-1 verification over those bytes
//!
//! Routing, header extraction and rejecting unauthenticated requests are
//! left to the caller.

pub mod canonical;
pub mod pem;
pub mod signature;

pub use canonical::{canonical_bytes, canonicalize};
pub use pem::{chunk_split, format_public_key, ChunkSplitError};
pub use signature::{
    is_signature_verification_enabled, verify_postal_signature, verify_postal_signature_async,
    PostalVerifier, MAX_KEY_BITS,
};
