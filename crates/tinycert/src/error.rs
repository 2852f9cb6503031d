//! Error taxonomy for encoding, decoding, and trust validation.
//!
//! Every failure is returned to the caller as a typed value; nothing is
//! recovered internally. Validation is a pure decision function — retrying a
//! cryptographic or temporal failure without new input cannot succeed, so
//! callers are expected to reject the presented identity on any error.

use thiserror::Error;

/// Errors raised while producing the canonical byte form of a certificate.
///
/// For well-formed in-memory values these are rare: the CBOR writer targets
/// an in-memory buffer, so the realistic failure modes are the structural
/// bounds enforced by [`CodecConfig`](crate::codec::CodecConfig).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The certificate carries more extensions than the configured bound.
    #[error("certificate has {count} extensions, exceeding the configured maximum of {max}")]
    TooManyExtensions {
        /// Number of extensions on the certificate.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A variable-length field exceeds the configured bound.
    #[error("{field} is {len} bytes, exceeding the configured maximum of {max}")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Actual byte length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The CBOR writer failed.
    #[error("CBOR serialization failed: {0}")]
    Cbor(#[from] ciborium::ser::Error<std::io::Error>),
}

/// Errors raised while decoding wire bytes into a certificate.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input is not well-formed CBOR (malformed or truncated).
    #[error("malformed CBOR: {0}")]
    Malformed(#[from] ciborium::de::Error<std::io::Error>),

    /// A field decoded to a different CBOR type than the format requires.
    #[error("{field} must encode as {expected}, found {found}")]
    UnexpectedType {
        /// Field name.
        field: &'static str,
        /// Expected CBOR type.
        expected: &'static str,
        /// CBOR type actually found.
        found: &'static str,
    },

    /// A fixed-arity structure decoded with the wrong number of elements.
    #[error("{field} must encode as {expected} elements, got {got}")]
    WrongArity {
        /// Structure name.
        field: &'static str,
        /// Expected arity.
        expected: &'static str,
        /// Actual element count.
        got: usize,
    },

    /// An integer field does not fit its declared width.
    #[error("{field} is out of range for its integer width")]
    IntegerOutOfRange {
        /// Field name.
        field: &'static str,
    },

    /// The public key is not exactly 32 bytes.
    #[error("public key must be 32 bytes, got {got}")]
    InvalidKeyLength {
        /// Actual key length.
        got: usize,
    },

    /// The encoded certificate carries more extensions than the configured
    /// bound.
    #[error("certificate has {count} extensions, exceeding the configured maximum of {max}")]
    TooManyExtensions {
        /// Number of encoded extensions.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A variable-length field exceeds the configured bound.
    #[error("{field} is {len} bytes, exceeding the configured maximum of {max}")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Actual byte length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The input decoded successfully but is not the canonical encoding of
    /// the decoded value (non-minimal integers, indefinite lengths, or
    /// trailing bytes).
    #[error("input is not a canonical certificate encoding")]
    NonCanonical,

    /// The decoded certificate could not be re-encoded for the canonical
    /// byte comparison.
    #[error("canonical re-encoding failed: {0}")]
    Canonicalize(#[source] EncodeError),
}

/// Why a bundle failed chain reconstruction as ambiguous.
///
/// Chain reconstruction requires each subject and issuer identifier to
/// appear at most once per role in the bundle and exactly one candidate for
/// each structural position; any other shape is rejected rather than
/// resolved by iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmbiguityReason {
    /// Two bundle certificates share a subject identifier.
    #[error("duplicate subject {subject:?} in bundle")]
    DuplicateSubject {
        /// The repeated subject.
        subject: String,
    },

    /// Two bundle certificates name the same issuer.
    #[error("duplicate issuer {issuer:?} in bundle")]
    DuplicateIssuer {
        /// The repeated issuer.
        issuer: String,
    },

    /// More than one certificate qualifies as the leaf.
    #[error("{count} certificates qualify as leaf")]
    MultipleLeaves {
        /// Number of leaf candidates.
        count: usize,
    },

    /// More than one intermediate has no resolvable issuer in the bundle.
    #[error("{count} intermediates qualify as chain top")]
    MultipleChainTops {
        /// Number of chain-top candidates.
        count: usize,
    },
}

/// Errors raised by single-certificate and chain validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The current time is earlier than the certificate's `not_before`.
    #[error("certificate is not yet valid: now {now} < not_before {not_before}")]
    NotYetValid {
        /// Validation time, seconds since epoch.
        now: i64,
        /// Lower validity bound, seconds since epoch.
        not_before: i64,
    },

    /// The current time is later than the certificate's `not_after`.
    #[error("certificate has expired: now {now} > not_after {not_after}")]
    Expired {
        /// Validation time, seconds since epoch.
        now: i64,
        /// Upper validity bound, seconds since epoch.
        not_after: i64,
    },

    /// The signature is missing, malformed, or does not verify against the
    /// issuer key.
    #[error("signature verification failed for {subject:?}")]
    BadSignature {
        /// Subject of the certificate that failed verification.
        subject: String,
    },

    /// The signature-less canonical form could not be produced.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The certificate's issuer is not a trust anchor in the pool.
    #[error("issuer {issuer:?} is not a known trust anchor")]
    UnknownIssuer {
        /// The unrecognized issuer identifier.
        issuer: String,
    },

    /// A pooled root failed validation against its own key.
    ///
    /// Roots are re-checked on every use, so an expired or corrupted trust
    /// anchor is rejected even though it is nominally trusted.
    #[error("trust anchor {subject:?} failed self-validation: {source}")]
    UntrustworthyRoot {
        /// Subject of the failing root.
        subject: String,
        /// The underlying validation failure.
        source: Box<ValidationError>,
    },

    /// The bundle contains no certificate that qualifies as a leaf.
    #[error("bundle contains no leaf certificate")]
    NoLeaf,

    /// Chain reconstruction found more than one way to read the bundle.
    #[error("ambiguous certificate chain: {reason}")]
    AmbiguousChain {
        /// What made the chain ambiguous.
        reason: AmbiguityReason,
    },

    /// An intermediate failed validation against its in-bundle issuer.
    #[error("broken chain at intermediate {subject:?}: {source}")]
    BrokenChain {
        /// Subject of the failing intermediate.
        subject: String,
        /// The underlying validation failure.
        source: Box<ValidationError>,
    },

    /// Every intermediate resolved an issuer inside the bundle, so the chain
    /// is self-contained and never reaches a pooled trust anchor.
    #[error("intermediate chain has no link to a trust anchor")]
    NoTrustAnchor,

    /// The leaf's issuer is absent from the bundle and direct pool
    /// validation failed too.
    #[error("no issuer for leaf {subject:?} in bundle and pool validation failed: {source}")]
    UntrustedLeaf {
        /// Subject of the leaf.
        subject: String,
        /// The pool validation failure.
        source: Box<ValidationError>,
    },
}
