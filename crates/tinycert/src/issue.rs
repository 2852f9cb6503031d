//! Certificate issuance.
//!
//! [`CertificateBuilder`] assembles the signed fields of a certificate and
//! produces the detached signature in one step, either self-signed (roots)
//! or signed by an issuing certificate's key (intermediates and leaves).
//! The signature covers the canonical signature-cleared encoding, so a
//! builder-produced certificate always verifies against the key that signed
//! it under the same codec configuration.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use thiserror::Error;
use tracing::debug;

use crate::cert::{Certificate, Extension, TimeBound, Validity};
use crate::codec::{signing_bytes, CodecConfig};
use crate::error::EncodeError;

/// Errors raised while issuing a certificate.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The provided signing key does not match the issuing certificate's
    /// embedded public key, so the result could never validate.
    #[error("signing key does not match the public key of issuer {subject:?}")]
    IssuerKeyMismatch {
        /// Subject of the issuing certificate.
        subject: String,
    },

    /// The signature-less canonical form could not be produced.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Builder for issuing signed certificates.
///
/// Field setters consume and return the builder; a terminal call
/// ([`self_signed`](Self::self_signed) or [`issued_by`](Self::issued_by))
/// signs and yields the finished [`Certificate`].
#[derive(Debug, Clone)]
pub struct CertificateBuilder {
    serial_number: u64,
    subject: String,
    validity: Option<Validity>,
    extensions: Vec<Extension>,
}

impl CertificateBuilder {
    /// Starts a builder for `subject` with serial number `0`, no validity
    /// window, and no extensions.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            serial_number: 0,
            subject: subject.into(),
            validity: None,
            extensions: Vec::new(),
        }
    }

    /// Sets the issuer-assigned serial number.
    #[must_use]
    pub fn serial_number(mut self, serial_number: u64) -> Self {
        self.serial_number = serial_number;
        self
    }

    /// Sets the validity window.
    #[must_use]
    pub fn validity(mut self, validity: Validity) -> Self {
        self.validity = Some(validity);
        self
    }

    /// Sets the validity window from two bounds.
    #[must_use]
    pub fn valid_between(self, not_before: TimeBound, not_after: TimeBound) -> Self {
        self.validity(Validity::new(not_before, not_after))
    }

    /// Appends an extension. Order is preserved and signed.
    #[must_use]
    pub fn extension(mut self, oid: u64, critical: bool, value: Vec<u8>) -> Self {
        self.extensions.push(Extension {
            oid,
            critical,
            value,
        });
        self
    }

    /// Issues a self-signed certificate: the subject's own key signs, and
    /// the certificate names itself as issuer.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::Encode`] if the canonical form cannot be
    /// produced.
    pub fn self_signed(
        self,
        key: &SigningKey,
        config: &CodecConfig,
    ) -> Result<Certificate, IssueError> {
        let issuer = self.subject.clone();
        self.finish(issuer, key, key.verifying_key(), config)
    }

    /// Issues a certificate for `subject_key`, signed by `issuer`'s key.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::IssuerKeyMismatch`] if `issuer_key` is not the
    /// key embedded in `issuer`, and [`IssueError::Encode`] if the canonical
    /// form cannot be produced.
    pub fn issued_by(
        self,
        issuer: &Certificate,
        issuer_key: &SigningKey,
        subject_key: &VerifyingKey,
        config: &CodecConfig,
    ) -> Result<Certificate, IssueError> {
        if issuer_key.verifying_key().to_bytes() != issuer.public_key {
            return Err(IssueError::IssuerKeyMismatch {
                subject: issuer.subject.clone(),
            });
        }
        self.finish(issuer.subject.clone(), issuer_key, *subject_key, config)
    }

    fn finish(
        self,
        issuer: String,
        signing_key: &SigningKey,
        subject_key: VerifyingKey,
        config: &CodecConfig,
    ) -> Result<Certificate, IssueError> {
        let mut cert = Certificate {
            serial_number: self.serial_number,
            issuer,
            validity: self.validity,
            subject: self.subject,
            public_key: subject_key.to_bytes(),
            extensions: self.extensions,
            signature: None,
        };
        let message = signing_bytes(&cert, config)?;
        let signature = signing_key.sign(&message);
        cert.signature = Some(signature.to_bytes().to_vec());
        debug!(subject = %cert.subject, issuer = %cert.issuer, "issued certificate");
        Ok(cert)
    }
}

/// Generates a fresh Ed25519 signing key from the operating system's
/// entropy source.
#[must_use]
pub fn generate_signing_key() -> SigningKey {
    SigningKey::generate(&mut rand::rngs::OsRng)
}
