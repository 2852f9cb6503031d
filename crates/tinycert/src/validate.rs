//! Single-certificate validation: time window plus detached signature.
//!
//! Validation never mutates the caller's certificate. The signature check
//! operates on the canonical encoding of an independent, signature-cleared
//! copy (see [`crate::codec::signing_bytes`]), so the bytes verified here
//! are exactly the bytes the issuer signed.
//!
//! Every check is pure given a fixed clock value; the wall-clock entry point
//! is a thin wrapper over [`validate_certificate_at`].

use chrono::Utc;
use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};

use crate::cert::{Certificate, TimeBound, PUBLIC_KEY_LEN};
use crate::codec::{signing_bytes, CodecConfig};
use crate::error::ValidationError;

/// Validates `cert` against `issuer_public_key` at the current wall-clock
/// time.
///
/// # Errors
///
/// Returns [`ValidationError::NotYetValid`] or [`ValidationError::Expired`]
/// on a time-window violation, [`ValidationError::BadSignature`] if the
/// detached signature is missing, malformed, or fails verification, and
/// [`ValidationError::Encode`] if the signature-less canonical form cannot
/// be produced.
pub fn validate_certificate(
    cert: &Certificate,
    issuer_public_key: &[u8; PUBLIC_KEY_LEN],
    config: &CodecConfig,
) -> Result<(), ValidationError> {
    validate_certificate_at(cert, issuer_public_key, config, Utc::now().timestamp())
}

/// Validates `cert` against `issuer_public_key` at the fixed instant `now`
/// (seconds since epoch).
///
/// Checks run in order: `not_before`, `not_after`, then the signature over
/// the canonical signature-cleared encoding. Unconstrained bounds (or an
/// absent validity window) never fail the time checks.
///
/// # Errors
///
/// See [`validate_certificate`].
pub fn validate_certificate_at(
    cert: &Certificate,
    issuer_public_key: &[u8; PUBLIC_KEY_LEN],
    config: &CodecConfig,
    now: i64,
) -> Result<(), ValidationError> {
    if let Some(validity) = &cert.validity {
        if let TimeBound::At(not_before) = validity.not_before {
            if now < not_before {
                return Err(ValidationError::NotYetValid { now, not_before });
            }
        }
        if let TimeBound::At(not_after) = validity.not_after {
            if now > not_after {
                return Err(ValidationError::Expired { now, not_after });
            }
        }
    }

    let Some(signature_bytes) = cert.signature.as_deref() else {
        return Err(bad_signature(cert));
    };
    let signature = Signature::from_slice(signature_bytes).map_err(|_| bad_signature(cert))?;
    let verifying_key =
        VerifyingKey::from_bytes(issuer_public_key).map_err(|_| bad_signature(cert))?;

    let message = signing_bytes(cert, config)?;
    verifying_key
        .verify(&message, &signature)
        .map_err(|_| bad_signature(cert))
}

fn bad_signature(cert: &Certificate) -> ValidationError {
    ValidationError::BadSignature {
        subject: cert.subject.clone(),
    }
}
