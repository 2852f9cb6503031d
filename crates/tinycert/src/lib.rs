//! Compact binary certificates with Ed25519 trust chains.
//!
//! `tinycert` implements a minimal certificate format for constrained
//! environments: a handful of fields, a canonical CBOR wire form, detached
//! Ed25519 signatures, and chain validation against a pool of trust
//! anchors. It is deliberately not X.509 — no ASN.1, no algorithm agility,
//! no revocation machinery.
//!
//! # Layers
//!
//! * [`Certificate`] and friends ([`cert`]) — the plain data model;
//! * [`encode`]/[`decode`] ([`codec`]) — canonical, deterministic CBOR;
//! * [`validate_certificate`] ([`validate`]) — time window plus signature
//!   for a single certificate against a known issuer key;
//! * [`CertPool`] ([`pool`]) — trust anchors, direct validation, and
//!   unordered-bundle chain reconstruction;
//! * [`CertificateBuilder`] ([`issue`]) — issuing signed certificates.
//!
//! # Example
//!
//! ```
//! use tinycert::{CertPool, CertificateBuilder, CodecConfig, Validity};
//!
//! let config = CodecConfig::default();
//! let root_key = tinycert::generate_signing_key();
//! let root = CertificateBuilder::new("root")
//!     .serial_number(1)
//!     .self_signed(&root_key, &config)?;
//!
//! let leaf_key = tinycert::generate_signing_key();
//! let leaf = CertificateBuilder::new("device-1")
//!     .serial_number(2)
//!     .validity(Validity::between(0, 4_000_000_000))
//!     .issued_by(&root, &root_key, &leaf_key.verifying_key(), &config)?;
//!
//! let pool = CertPool::new([root]);
//! pool.validate(&leaf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cert;
pub mod codec;
pub mod error;
pub mod issue;
pub mod pool;
pub mod validate;

pub use cert::{Certificate, Extension, TimeBound, Validity, PUBLIC_KEY_LEN, SIGNATURE_LEN};
pub use codec::{decode, encode, signing_bytes, CodecConfig};
pub use error::{AmbiguityReason, DecodeError, EncodeError, ValidationError};
pub use issue::{generate_signing_key, CertificateBuilder, IssueError};
pub use pool::CertPool;
pub use validate::{validate_certificate, validate_certificate_at};
