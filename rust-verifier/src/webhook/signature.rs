//! Postal webhook signature verification.
//!
//! Postal signs each webhook body with RSA (PKCS#1 v1.5, SHA-1) and sends the
//! base64 signature in the `X-Postal-Signature` header. The matching public
//! key is shown in Postal's web UI as bare base64.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs1::RsaPublicKey as Pkcs1PublicKey;
use rsa::pkcs8::der::{Decode, Document};
use rsa::pkcs8::{spki, SubjectPublicKeyInfoRef};
use rsa::signature::Verifier;
use rsa::{BigUint, RsaPublicKey};
use serde::Serialize;
use sha1::Sha1;
use tracing::{error, warn};

use crate::error::{KeyError, VerifyError};
use crate::webhook::canonical::canonical_bytes;
use crate::webhook::pem::format_public_key;

/// Largest RSA modulus accepted, in bits.
pub const MAX_KEY_BITS: usize = 16384;

/// An RSA/SHA-1 verifier for one Postal public key.
///
/// Parse the configured key once and share the verifier across requests; it
/// holds no mutable state.
#[derive(Debug, Clone)]
pub struct PostalVerifier {
    key: VerifyingKey<Sha1>,
}

impl PostalVerifier {
    /// Build a verifier from Postal's raw base64 public key (no PEM headers).
    pub fn from_raw_key(raw: &str) -> Result<Self, KeyError> {
        let pem = format_public_key(raw)?;
        let (_label, document) = Document::from_pem(&pem).map_err(spki::Error::from)?;
        let info = SubjectPublicKeyInfoRef::from_der(document.as_bytes()).map_err(spki::Error::from)?;

        if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
            return Err(KeyError::UnsupportedAlgorithm(info.algorithm.oid));
        }

        let key_bytes = info
            .subject_public_key
            .as_bytes()
            .ok_or(spki::Error::KeyMalformed)?;
        let components = Pkcs1PublicKey::from_der(key_bytes).map_err(spki::Error::from)?;
        let n = BigUint::from_bytes_be(components.modulus.as_bytes());
        let e = BigUint::from_bytes_be(components.public_exponent.as_bytes());

        let bits = n.bits();
        if bits > MAX_KEY_BITS {
            return Err(KeyError::UnsupportedKeySize(bits));
        }

        let public_key = RsaPublicKey::new_with_max_size(n, e, MAX_KEY_BITS)
            .map_err(|_| spki::Error::KeyMalformed)?;

        Ok(Self {
            key: VerifyingKey::<Sha1>::new(public_key),
        })
    }

    /// Verify `signature` over the canonical encoding of `body`.
    ///
    /// Returns `Ok(false)` for any signature that does not match, including
    /// signatures that are not valid base64.
    pub fn verify<T: Serialize + ?Sized>(&self, body: &T, signature: &str) -> Result<bool, VerifyError> {
        let canonical = canonical_bytes(body)?;
        Ok(self.verify_canonical(&canonical, signature))
    }

    /// Verify `signature` over bytes that are already in canonical form.
    pub fn verify_canonical(&self, canonical: &[u8], signature: &str) -> bool {
        let raw_signature = match STANDARD.decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, signature_length = signature.len(), "postal_signature_invalid_base64");
                return false;
            }
        };

        let signature = match Signature::try_from(raw_signature.as_slice()) {
            Ok(sig) => sig,
            Err(_) => {
                warn!(signature_bytes = raw_signature.len(), "postal_signature_malformed");
                return false;
            }
        };

        match self.key.verify(canonical, &signature) {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    body_length = canonical.len(),
                    signature_bytes = raw_signature.len(),
                    "postal_signature_mismatch"
                );
                false
            }
        }
    }
}

/// Verify a Postal webhook signature.
///
/// # Arguments
///
/// * `body` - The webhook body as received, e.g. a parsed `serde_json::Value`
/// * `signature` - The base64 value of the `X-Postal-Signature` header
/// * `public_key` - Postal's public key as bare base64
///
/// # Returns
///
/// `Ok(true)` if the signature is valid, `Ok(false)` if it is not or if any
/// input is malformed. `Err` is reserved for configuration problems: a key
/// for an algorithm other than RSA, or a body that cannot be encoded as JSON.
pub fn verify_postal_signature<T: Serialize + ?Sized>(
    body: &T,
    signature: &str,
    public_key: &str,
) -> Result<bool, VerifyError> {
    let verifier = match PostalVerifier::from_raw_key(public_key) {
        Ok(v) => v,
        Err(KeyError::Format(e)) => {
            warn!(error = %e, "postal_public_key_missing");
            return Ok(false);
        }
        Err(e) if e.is_input_error() => {
            warn!(error = %e, key_length = public_key.len(), "postal_public_key_malformed");
            return Ok(false);
        }
        Err(e) => {
            error!(error = %e, "postal_public_key_unsupported");
            return Err(e.into());
        }
    };

    verifier.verify(body, signature).map_err(|e| {
        error!(error = %e, "postal_body_unserializable");
        e
    })
}

/// Async form of [`verify_postal_signature`] for uniformly async handlers.
///
/// The work is a short CPU-bound computation and runs inline.
pub async fn verify_postal_signature_async<T: Serialize + ?Sized>(
    body: &T,
    signature: &str,
    public_key: &str,
) -> Result<bool, VerifyError> {
    verify_postal_signature(body, signature, public_key)
}

/// Whether a Postal public key has been configured at all.
///
/// A blank or absent key is an operator problem, reported by the caller as a
/// configuration error before any request is checked. It is distinct from the
/// `false` that [`verify_postal_signature`] gives a forged request.
pub fn is_signature_verification_enabled(public_key: &Option<String>) -> bool {
    public_key
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}
