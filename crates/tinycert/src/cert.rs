//! Certificate data model.
//!
//! A [`Certificate`] binds a subject identifier to raw Ed25519 key material,
//! optionally constrained by a [`Validity`] window and annotated with opaque
//! [`Extension`] blobs. Certificates are plain data: fields are public and no
//! invariant is enforced at construction time. The trust engine treats a
//! certificate as meaningful only after it validates against its issuer's
//! key, and any field mutation after signing invalidates the signature.
//!
//! The derived `Clone` is the deep-copy operation the validator relies on:
//! every owned field (`String`, `Vec`) is copied by value, so a clone can be
//! stripped of its signature without touching the caller's certificate.
//!
//! The `serde` derives provide a human-readable diagnostic form with
//! hex-encoded byte fields. This form is *not* the canonical wire encoding;
//! see [`crate::codec`] for that.

use serde::{Deserialize, Serialize};

/// Length of a raw Ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// One bound of a validity window.
///
/// The wire format uses `0` as a sentinel for "ignore this bound"; the model
/// keeps the two cases apart at the type level. `At` must never hold `0` —
/// build bounds with [`TimeBound::from_epoch`], which maps the sentinel to
/// `Unconstrained`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBound {
    /// The bound is not constrained and never fails a time check.
    Unconstrained,
    /// A concrete instant, seconds since the Unix epoch.
    At(i64),
}

impl TimeBound {
    /// Builds a bound from wire-level epoch seconds, mapping the `0`
    /// sentinel to `Unconstrained`.
    #[must_use]
    pub const fn from_epoch(secs: i64) -> Self {
        if secs == 0 {
            Self::Unconstrained
        } else {
            Self::At(secs)
        }
    }

    /// The wire-level representation of this bound: epoch seconds, with `0`
    /// standing for `Unconstrained`.
    #[must_use]
    pub const fn epoch(self) -> i64 {
        match self {
            Self::Unconstrained => 0,
            Self::At(secs) => secs,
        }
    }

    /// Whether this bound is the unconstrained sentinel.
    #[must_use]
    pub const fn is_unconstrained(self) -> bool {
        matches!(self, Self::Unconstrained)
    }
}

/// Time-constrained validity of a certificate.
///
/// Either bound may be unconstrained; a certificate with no [`Validity`] at
/// all is unconstrained on both bounds. A meaningful window has
/// `not_before <= not_after`, but this is not enforced structurally — time
/// checks simply fail for any `now` outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    /// Earliest instant at which the certificate is valid.
    pub not_before: TimeBound,
    /// Latest instant at which the certificate is valid.
    pub not_after: TimeBound,
}

impl Validity {
    /// A window unconstrained on both bounds.
    pub const UNCONSTRAINED: Self = Self {
        not_before: TimeBound::Unconstrained,
        not_after: TimeBound::Unconstrained,
    };

    /// Builds a validity window from two bounds.
    #[must_use]
    pub const fn new(not_before: TimeBound, not_after: TimeBound) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// Builds a validity window from wire-level epoch seconds (`0` =
    /// unconstrained).
    #[must_use]
    pub const fn between(not_before: i64, not_after: i64) -> Self {
        Self {
            not_before: TimeBound::from_epoch(not_before),
            not_after: TimeBound::from_epoch(not_after),
        }
    }
}

/// An opaque certificate extension: numeric OID, criticality flag, and an
/// uninterpreted byte payload.
///
/// Extension order is preserved because it is part of the canonical encoding
/// and therefore of the signature. Rejecting certificates that carry an
/// *unrecognized* critical extension is the format's stated intent but is
/// deliberately not enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Numeric object identifier.
    pub oid: u64,
    /// Whether a consumer that does not understand this extension should
    /// reject the certificate.
    pub critical: bool,
    /// Opaque payload.
    #[serde(with = "hex_vec")]
    pub value: Vec<u8>,
}

/// A compact binary certificate.
///
/// `issuer` names the certificate that signed this one; a self-signed root
/// has `issuer == subject`. `serial_number` uniqueness is an issuer concern
/// and is not enforced by this library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Issuer-assigned serial number.
    pub serial_number: u64,
    /// Identifier of the certificate that signed this one.
    pub issuer: String,
    /// Optional validity window; `None` is unconstrained on both bounds.
    pub validity: Option<Validity>,
    /// Identifier of the entity this certificate vouches for.
    pub subject: String,
    /// Raw Ed25519 public key of the subject.
    #[serde(with = "hex_array")]
    pub public_key: [u8; PUBLIC_KEY_LEN],
    /// Ordered, opaque extensions.
    pub extensions: Vec<Extension>,
    /// Detached Ed25519 signature by the issuer; `None` until signed.
    #[serde(with = "hex_opt")]
    pub signature: Option<Vec<u8>>,
}

impl Certificate {
    /// Raw public key bytes of the subject, for use by an external
    /// secure-channel or identity layer.
    #[must_use]
    pub const fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// Whether the certificate names itself as issuer.
    #[must_use]
    pub fn is_self_signed(&self) -> bool {
        self.issuer == self.subject
    }
}

/// Serde helper for hex encoding of fixed-size key bytes.
mod hex_array {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::PUBLIC_KEY_LEN;

    pub fn serialize<S>(bytes: &[u8; PUBLIC_KEY_LEN], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; PUBLIC_KEY_LEN], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        <[u8; PUBLIC_KEY_LEN]>::try_from(bytes)
            .map_err(|b: Vec<u8>| serde::de::Error::custom(format!("expected 32 bytes, got {}", b.len())))
    }
}

/// Serde helper for hex encoding of byte vectors.
mod hex_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        hex::encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for hex encoding of optional byte vectors.
mod hex_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bytes.as_deref().map(hex::encode).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| hex::decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_certificate() -> Certificate {
        Certificate {
            serial_number: 7,
            issuer: "root.example".to_string(),
            validity: Some(Validity::between(1_700_000_000, 1_800_000_000)),
            subject: "leaf.example".to_string(),
            public_key: [0x42; PUBLIC_KEY_LEN],
            extensions: vec![Extension {
                oid: 12,
                critical: true,
                value: vec![0xDE, 0xAD],
            }],
            signature: Some(vec![0x11; SIGNATURE_LEN]),
        }
    }

    #[test]
    fn time_bound_maps_zero_to_unconstrained() {
        assert_eq!(TimeBound::from_epoch(0), TimeBound::Unconstrained);
        assert_eq!(TimeBound::from_epoch(42), TimeBound::At(42));
        assert_eq!(TimeBound::from_epoch(-3), TimeBound::At(-3));
        assert_eq!(TimeBound::Unconstrained.epoch(), 0);
        assert_eq!(TimeBound::At(42).epoch(), 42);
        assert!(TimeBound::Unconstrained.is_unconstrained());
        assert!(!TimeBound::At(1).is_unconstrained());
    }

    #[test]
    fn validity_between_uses_sentinel_zero() {
        let validity = Validity::between(0, 99);
        assert_eq!(validity.not_before, TimeBound::Unconstrained);
        assert_eq!(validity.not_after, TimeBound::At(99));
        assert_eq!(Validity::between(0, 0), Validity::UNCONSTRAINED);
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let original = make_certificate();
        let mut copy = original.clone();

        copy.signature = None;
        copy.public_key[0] ^= 0xFF;
        copy.extensions[0].value.push(0xBE);
        copy.subject.push_str(".evil");

        assert_eq!(original.signature.as_deref(), Some(&[0x11; 64][..]));
        assert_eq!(original.public_key[0], 0x42);
        assert_eq!(original.extensions[0].value, vec![0xDE, 0xAD]);
        assert_eq!(original.subject, "leaf.example");
    }

    #[test]
    fn self_signed_detection() {
        let mut cert = make_certificate();
        assert!(!cert.is_self_signed());
        cert.issuer = cert.subject.clone();
        assert!(cert.is_self_signed());
    }

    #[test]
    fn diagnostic_serde_form_round_trips_with_hex_fields() {
        let cert = make_certificate();
        let json = serde_json::to_value(&cert).unwrap();

        // Byte fields render as hex strings, not integer arrays.
        assert_eq!(json["public_key"], hex::encode([0x42; PUBLIC_KEY_LEN]));
        assert_eq!(json["extensions"][0]["value"], "dead");
        assert_eq!(json["signature"], hex::encode([0x11; SIGNATURE_LEN]));

        let back: Certificate = serde_json::from_value(json).unwrap();
        assert_eq!(back, cert);
    }

    #[test]
    fn diagnostic_serde_form_handles_unsigned_certificates() {
        let mut cert = make_certificate();
        cert.signature = None;
        let json = serde_json::to_string(&cert).unwrap();
        let back: Certificate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.signature, None);
    }
}
