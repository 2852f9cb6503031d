//! Trust pool and certificate-chain validation.
//!
//! A [`CertPool`] owns a set of trusted root certificates, keyed by subject.
//! Roots are normally self-signed and are re-validated against their own key
//! on every use, so an expired or corrupted anchor is rejected even though
//! it is nominally trusted.
//!
//! Bundle validation reconstructs an issuance chain of unknown depth from an
//! unordered set of certificates. This is a linked-list reconstruction over
//! two hash indexes, not a general graph search: each subject and issuer
//! identifier may appear at most once per role in the bundle, and any
//! ambiguity (duplicate identifiers, multiple leaves, multiple chain tops)
//! is rejected outright rather than resolved by iteration order.
//!
//! The pool is read-only after construction, so sharing `&CertPool` across
//! threads requires no locking. Validation borrows from the caller's bundle
//! and from the pool; it never mutates either.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, warn};

use crate::cert::Certificate;
use crate::codec::CodecConfig;
use crate::error::{AmbiguityReason, ValidationError};
use crate::validate::validate_certificate_at;

/// A pool of trusted root certificates, keyed by subject.
#[derive(Debug, Clone, Default)]
pub struct CertPool {
    roots: HashMap<String, Certificate>,
    config: CodecConfig,
}

impl CertPool {
    /// Builds a pool from a set of trust anchors with the default codec
    /// configuration.
    ///
    /// Later roots replace earlier ones that share a subject.
    #[must_use]
    pub fn new(roots: impl IntoIterator<Item = Certificate>) -> Self {
        Self::with_config(roots, CodecConfig::default())
    }

    /// Builds a pool with an explicit codec configuration, used for every
    /// canonical re-encoding during validation.
    #[must_use]
    pub fn with_config(roots: impl IntoIterator<Item = Certificate>, config: CodecConfig) -> Self {
        let roots = roots
            .into_iter()
            .map(|cert| (cert.subject.clone(), cert))
            .collect();
        Self { roots, config }
    }

    /// Number of trust anchors in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the pool holds no trust anchors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether the pool holds an anchor for `subject`.
    #[must_use]
    pub fn contains(&self, subject: &str) -> bool {
        self.roots.contains_key(subject)
    }

    /// Validates `cert` directly against the pool at the current wall-clock
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownIssuer`] if `cert.issuer` is not a
    /// pooled subject, [`ValidationError::UntrustworthyRoot`] if the anchor
    /// fails validation against its own key, or the underlying
    /// single-certificate error for `cert` itself.
    pub fn validate(&self, cert: &Certificate) -> Result<(), ValidationError> {
        self.validate_at(cert, Utc::now().timestamp())
    }

    /// Validates `cert` directly against the pool at the fixed instant
    /// `now` (seconds since epoch).
    ///
    /// # Errors
    ///
    /// See [`CertPool::validate`].
    pub fn validate_at(&self, cert: &Certificate, now: i64) -> Result<(), ValidationError> {
        let Some(root) = self.roots.get(&cert.issuer) else {
            return Err(ValidationError::UnknownIssuer {
                issuer: cert.issuer.clone(),
            });
        };

        // Re-check the anchor's own window and self-signature on every use.
        if let Err(source) = validate_certificate_at(root, &root.public_key, &self.config, now) {
            warn!(
                subject = %root.subject,
                error = %source,
                "trust anchor failed self-validation"
            );
            return Err(ValidationError::UntrustworthyRoot {
                subject: root.subject.clone(),
                source: Box::new(source),
            });
        }

        validate_certificate_at(cert, &root.public_key, &self.config, now)
    }

    /// Validates an unordered bundle of certificates at the current
    /// wall-clock time and returns the leaf (client) certificate.
    ///
    /// # Errors
    ///
    /// See [`CertPool::validate_bundle_at`].
    pub fn validate_bundle<'a>(
        &self,
        bundle: &'a [Certificate],
    ) -> Result<&'a Certificate, ValidationError> {
        self.validate_bundle_at(bundle, Utc::now().timestamp())
    }

    /// Validates an unordered bundle at the fixed instant `now` and returns
    /// the leaf certificate, borrowed from `bundle`.
    ///
    /// The bundle must form a single issuance chain: a leaf, zero or more
    /// intermediates, and a chain top whose issuer is a pooled anchor. A
    /// bundle consisting of just the leaf is accepted when the leaf's issuer
    /// is pooled directly.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoLeaf`] if nothing qualifies as leaf,
    /// [`ValidationError::AmbiguousChain`] on duplicate identifiers or
    /// multiple leaf/chain-top candidates, [`ValidationError::BrokenChain`]
    /// if an intermediate fails validation against its in-bundle issuer,
    /// [`ValidationError::NoTrustAnchor`] if the chain is self-contained,
    /// [`ValidationError::UntrustedLeaf`] if the leaf has no in-bundle
    /// issuer and direct pool validation fails, and any error from
    /// [`CertPool::validate_at`] for the chain top.
    pub fn validate_bundle_at<'a>(
        &self,
        bundle: &'a [Certificate],
        now: i64,
    ) -> Result<&'a Certificate, ValidationError> {
        let mut issuer_index: HashMap<&str, &Certificate> = HashMap::with_capacity(bundle.len());
        let mut subject_index: HashMap<&str, &Certificate> = HashMap::with_capacity(bundle.len());
        for cert in bundle {
            if issuer_index.insert(cert.issuer.as_str(), cert).is_some() {
                return Err(ambiguous(AmbiguityReason::DuplicateIssuer {
                    issuer: cert.issuer.clone(),
                }));
            }
            if subject_index.insert(cert.subject.as_str(), cert).is_some() {
                return Err(ambiguous(AmbiguityReason::DuplicateSubject {
                    subject: cert.subject.clone(),
                }));
            }
        }

        // A certificate that issued somebody in the bundle is an
        // intermediate; anything else is a leaf candidate.
        let mut leaf = None;
        let mut leaf_count = 0_usize;
        let mut intermediates = Vec::new();
        for cert in bundle {
            if issuer_index.contains_key(cert.subject.as_str()) {
                intermediates.push(cert);
            } else {
                leaf_count += 1;
                leaf = Some(cert);
            }
        }
        let leaf = match (leaf, leaf_count) {
            (Some(leaf), 1) => leaf,
            (None, _) => return Err(ValidationError::NoLeaf),
            (_, count) => return Err(ambiguous(AmbiguityReason::MultipleLeaves { count })),
        };

        match subject_index.get(leaf.issuer.as_str()) {
            Some(leaf_issuer) => {
                validate_certificate_at(leaf, &leaf_issuer.public_key, &self.config, now)?;
            }
            None => {
                // The leaf may be trusted by the pool directly, with no
                // intermediate chain at all.
                return match self.validate_at(leaf, now) {
                    Ok(()) => {
                        debug!(leaf = %leaf.subject, "leaf validated directly against pool");
                        Ok(leaf)
                    }
                    Err(source) => Err(ValidationError::UntrustedLeaf {
                        subject: leaf.subject.clone(),
                        source: Box::new(source),
                    }),
                };
            }
        }

        // Walk the intermediates; exactly one must have no in-bundle issuer
        // and anchors the chain to the pool.
        let mut chain_top = None;
        let mut top_count = 0_usize;
        for cert in &intermediates {
            match subject_index.get(cert.issuer.as_str()) {
                Some(issuer_cert) => {
                    validate_certificate_at(cert, &issuer_cert.public_key, &self.config, now)
                        .map_err(|source| ValidationError::BrokenChain {
                            subject: cert.subject.clone(),
                            source: Box::new(source),
                        })?;
                }
                None => {
                    top_count += 1;
                    chain_top = Some(*cert);
                }
            }
        }
        let chain_top = match (chain_top, top_count) {
            (Some(top), 1) => top,
            (None, _) => return Err(ValidationError::NoTrustAnchor),
            (_, count) => return Err(ambiguous(AmbiguityReason::MultipleChainTops { count })),
        };

        self.validate_at(chain_top, now)?;
        debug!(
            leaf = %leaf.subject,
            chain_top = %chain_top.subject,
            intermediates = intermediates.len(),
            "validated certificate bundle"
        );
        Ok(leaf)
    }
}

fn ambiguous(reason: AmbiguityReason) -> ValidationError {
    ValidationError::AmbiguousChain { reason }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;

    use super::*;
    use crate::cert::Validity;
    use crate::issue::CertificateBuilder;

    const NOW: i64 = 1_750_000_000;

    fn key(fill: u8) -> SigningKey {
        SigningKey::from_bytes(&[fill; 32])
    }

    fn root(subject: &str, signing_key: &SigningKey) -> Certificate {
        CertificateBuilder::new(subject)
            .serial_number(1)
            .validity(Validity::between(NOW - 1000, NOW + 1000))
            .self_signed(signing_key, &CodecConfig::default())
            .unwrap()
    }

    fn issued(
        subject: &str,
        issuer: &Certificate,
        issuer_key: &SigningKey,
        subject_key: &SigningKey,
    ) -> Certificate {
        CertificateBuilder::new(subject)
            .serial_number(2)
            .validity(Validity::between(NOW - 1000, NOW + 1000))
            .issued_by(
                issuer,
                issuer_key,
                &subject_key.verifying_key(),
                &CodecConfig::default(),
            )
            .unwrap()
    }

    #[test]
    fn validates_directly_issued_certificate() {
        let root_key = key(0x01);
        let root_cert = root("root", &root_key);
        let leaf = issued("leaf", &root_cert, &root_key, &key(0x02));

        let pool = CertPool::new([root_cert]);
        pool.validate_at(&leaf, NOW).unwrap();
    }

    #[test]
    fn rejects_unknown_issuer() {
        let pool = CertPool::new([root("root", &key(0x01))]);
        let stranger_key = key(0x03);
        let stranger_root = root("stranger", &stranger_key);
        let leaf = issued("leaf", &stranger_root, &stranger_key, &key(0x02));

        let err = pool.validate_at(&leaf, NOW).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownIssuer { issuer } if issuer == "stranger"
        ));
    }

    #[test]
    fn rejects_corrupted_trust_anchor() {
        let root_key = key(0x01);
        let mut root_cert = root("root", &root_key);
        let leaf = issued("leaf", &root_cert, &root_key, &key(0x02));

        // Corrupt the pooled anchor's own signature.
        if let Some(signature) = root_cert.signature.as_mut() {
            signature[0] ^= 0xFF;
        }
        let pool = CertPool::new([root_cert]);

        let err = pool.validate_at(&leaf, NOW).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UntrustworthyRoot { subject, .. } if subject == "root"
        ));
    }

    #[test]
    fn rejects_expired_trust_anchor() {
        let root_key = key(0x01);
        let root_cert = CertificateBuilder::new("root")
            .validity(Validity::between(NOW - 1000, NOW - 1))
            .self_signed(&root_key, &CodecConfig::default())
            .unwrap();
        let leaf = issued("leaf", &root_cert, &root_key, &key(0x02));

        let pool = CertPool::new([root_cert]);
        let err = pool.validate_at(&leaf, NOW).unwrap_err();
        assert!(matches!(err, ValidationError::UntrustworthyRoot { .. }));
    }

    #[test]
    fn pool_replaces_roots_sharing_a_subject() {
        let old = root("root", &key(0x01));
        let new_key = key(0x09);
        let new = root("root", &new_key);
        let pool = CertPool::new([old, new]);
        assert_eq!(pool.len(), 1);

        let leaf = issued("leaf", &root("root", &new_key), &new_key, &key(0x02));
        pool.validate_at(&leaf, NOW).unwrap();
    }

    #[test]
    fn bundle_three_level_chain_returns_leaf() {
        let root_key = key(0x01);
        let intermediate_key = key(0x02);
        let leaf_key = key(0x03);

        let root_cert = root("root", &root_key);
        let intermediate = issued("intermediate", &root_cert, &root_key, &intermediate_key);
        let leaf = issued("leaf", &intermediate, &intermediate_key, &leaf_key);

        let pool = CertPool::new([root_cert]);

        // Bundle order must not matter.
        let forward = vec![intermediate.clone(), leaf.clone()];
        let reverse = vec![leaf.clone(), intermediate.clone()];
        assert_eq!(pool.validate_bundle_at(&forward, NOW).unwrap().subject, "leaf");
        assert_eq!(pool.validate_bundle_at(&reverse, NOW).unwrap().subject, "leaf");
    }

    #[test]
    fn bundle_deep_chain_returns_leaf() {
        let root_key = key(0x01);
        let k1 = key(0x02);
        let k2 = key(0x03);
        let k3 = key(0x04);
        let leaf_key = key(0x05);

        let root_cert = root("root", &root_key);
        let i1 = issued("i1", &root_cert, &root_key, &k1);
        let i2 = issued("i2", &i1, &k1, &k2);
        let i3 = issued("i3", &i2, &k2, &k3);
        let leaf = issued("leaf", &i3, &k3, &leaf_key);

        let pool = CertPool::new([root_cert]);
        let bundle = vec![i3, leaf, i1, i2];
        assert_eq!(pool.validate_bundle_at(&bundle, NOW).unwrap().subject, "leaf");
    }

    #[test]
    fn bundle_direct_trust_path() {
        let root_key = key(0x01);
        let root_cert = root("root", &root_key);
        let leaf = issued("leaf", &root_cert, &root_key, &key(0x02));

        let pool = CertPool::new([root_cert]);
        let bundle = vec![leaf];
        assert_eq!(pool.validate_bundle_at(&bundle, NOW).unwrap().subject, "leaf");
    }

    #[test]
    fn bundle_missing_anchor_fails() {
        // A chain rooted outside the pool.
        let outsider_key = key(0x08);
        let outsider_root = root("outsider", &outsider_key);
        let intermediate_key = key(0x02);
        let intermediate = issued("intermediate", &outsider_root, &outsider_key, &intermediate_key);
        let leaf = issued("leaf", &intermediate, &intermediate_key, &key(0x03));

        let pool = CertPool::new([root("root", &key(0x01))]);
        let err = pool
            .validate_bundle_at(&[intermediate, leaf], NOW)
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownIssuer { .. }));
    }

    #[test]
    fn bundle_including_the_root_is_ambiguous() {
        // A self-signed root names itself as issuer, so including it in the
        // bundle always collides with the certificate it issued.
        let root_key = key(0x01);
        let intermediate_key = key(0x02);
        let root_cert = root("root", &root_key);
        let intermediate = issued("intermediate", &root_cert, &root_key, &intermediate_key);
        let leaf = issued("leaf", &intermediate, &intermediate_key, &key(0x03));

        let pool = CertPool::new([root_cert.clone()]);
        let err = pool
            .validate_bundle_at(&[root_cert, intermediate, leaf], NOW)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::AmbiguousChain {
                reason: AmbiguityReason::DuplicateIssuer { issuer }
            } if issuer == "root"
        ));
    }

    #[test]
    fn bundle_untrusted_lone_leaf_composes_pool_error() {
        let stranger_key = key(0x08);
        let stranger_root = root("stranger", &stranger_key);
        let leaf = issued("leaf", &stranger_root, &stranger_key, &key(0x02));

        let pool = CertPool::new([root("root", &key(0x01))]);
        let err = pool.validate_bundle_at(&[leaf], NOW).unwrap_err();
        match err {
            ValidationError::UntrustedLeaf { subject, source } => {
                assert_eq!(subject, "leaf");
                assert!(matches!(*source, ValidationError::UnknownIssuer { .. }));
            }
            other => panic!("expected UntrustedLeaf, got {other:?}"),
        }
    }

    #[test]
    fn bundle_broken_link_is_reported() {
        let root_key = key(0x01);
        let intermediate_key = key(0x02);
        let root_cert = root("root", &root_key);
        let mut intermediate = issued("intermediate", &root_cert, &root_key, &intermediate_key);
        let leaf = issued("leaf", &intermediate, &intermediate_key, &key(0x03));

        // The tampered intermediate claims i1 as issuer but was actually
        // signed by the root.
        let i1 = issued("i1", &root_cert, &root_key, &key(0x04));
        intermediate.issuer = "i1".to_string();

        let err = CertPool::new([root_cert])
            .validate_bundle_at(&[i1, intermediate, leaf], NOW)
            .unwrap_err();
        assert!(matches!(err, ValidationError::BrokenChain { .. }));
    }

    #[test]
    fn bundle_empty_has_no_leaf() {
        let pool = CertPool::new([root("root", &key(0x01))]);
        let err = pool.validate_bundle_at(&[], NOW).unwrap_err();
        assert!(matches!(err, ValidationError::NoLeaf));
    }

    #[test]
    fn bundle_two_leaves_is_ambiguous() {
        let root_key = key(0x01);
        let root_cert = root("root", &root_key);
        let leaf_a = issued("leaf-a", &root_cert, &root_key, &key(0x02));
        let leaf_b = issued("leaf-b", &root_cert, &root_key, &key(0x03));

        // Both certificates name "root" as issuer, which already collides in
        // the issuer index.
        let pool = CertPool::new([root_cert]);
        let err = pool.validate_bundle_at(&[leaf_a, leaf_b], NOW).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::AmbiguousChain {
                reason: AmbiguityReason::DuplicateIssuer { .. }
            }
        ));
    }

    #[test]
    fn bundle_disjoint_chains_are_ambiguous() {
        let root_key = key(0x01);
        let root_cert = root("root", &root_key);
        let ka = key(0x02);
        let kb = key(0x04);
        let ia = issued("ia", &root_cert, &root_key, &ka);
        let leaf_a = issued("leaf-a", &ia, &ka, &key(0x03));

        let other_key = key(0x06);
        let other_root = root("other", &other_key);
        let ib = issued("ib", &other_root, &other_key, &kb);
        let leaf_b = issued("leaf-b", &ib, &kb, &key(0x05));

        let pool = CertPool::new([root_cert]);
        let err = pool
            .validate_bundle_at(&[ia, leaf_a, ib, leaf_b], NOW)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::AmbiguousChain {
                reason: AmbiguityReason::MultipleLeaves { count: 2 }
            }
        ));
    }

    #[test]
    fn bundle_duplicate_subject_is_ambiguous() {
        let root_key = key(0x01);
        let root_cert = root("root", &root_key);
        let intermediate_key = key(0x02);
        let intermediate = issued("intermediate", &root_cert, &root_key, &intermediate_key);
        let leaf = issued("leaf", &intermediate, &intermediate_key, &key(0x03));
        let mut doppelganger = issued("leaf", &intermediate, &intermediate_key, &key(0x04));
        doppelganger.issuer = "elsewhere".to_string();

        let pool = CertPool::new([root_cert]);
        let err = pool
            .validate_bundle_at(&[intermediate, leaf, doppelganger], NOW)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::AmbiguousChain {
                reason: AmbiguityReason::DuplicateSubject { .. }
            }
        ));
    }
}
