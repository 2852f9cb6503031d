//! Canonical CBOR encoding and decoding of certificates.
//!
//! # Wire Form
//!
//! A certificate encodes as a definite-length CBOR array of 6 or 7 elements
//! in fixed field order:
//!
//! ```text
//! [serial_number, issuer, validity?, subject, public_key, extensions, signature]
//! ```
//!
//! * integers use minimal-width encoding, strings and byte strings are
//!   length-prefixed, and no field is encoded as a map — the encoding is
//!   sensitive to field order by construction;
//! * `validity`, when absent, is omitted entirely (arity 6), never encoded
//!   as a null placeholder; when present it is the pair
//!   `[not_before, not_after]` of epoch seconds with `0` meaning
//!   "unconstrained";
//! * each extension is the triple `[oid, critical, value]`;
//! * an unsigned certificate encodes its signature as CBOR null.
//!
//! Two certificates with field-for-field-equal values always produce
//! byte-identical encodings. This matters because the signature is computed
//! over exactly these bytes: [`signing_bytes`] yields the encoding of an
//! independent, signature-cleared copy, and verification must reproduce it
//! bit for bit.
//!
//! All entry points take an explicit, immutable [`CodecConfig`]; there is no
//! process-wide codec state.

use ciborium::value::Value;

use crate::cert::{Certificate, Extension, TimeBound, Validity, PUBLIC_KEY_LEN};
use crate::error::{DecodeError, EncodeError};

/// Immutable codec configuration, passed explicitly to [`encode`] and
/// [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Reject decoded input that is not the canonical encoding of its value
    /// (non-minimal integers, indefinite lengths, trailing bytes).
    pub enforce_canonical: bool,
    /// Maximum number of extensions accepted per certificate.
    pub max_extensions: usize,
    /// Maximum byte length accepted for any variable-length field.
    pub max_blob_len: usize,
}

impl CodecConfig {
    /// Default bound on the number of extensions.
    pub const DEFAULT_MAX_EXTENSIONS: usize = 32;

    /// Default bound on variable-length field size.
    pub const DEFAULT_MAX_BLOB_LEN: usize = 4096;
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            enforce_canonical: true,
            max_extensions: Self::DEFAULT_MAX_EXTENSIONS,
            max_blob_len: Self::DEFAULT_MAX_BLOB_LEN,
        }
    }
}

/// Encodes a certificate into its canonical byte form.
///
/// Deterministic: equal field values in equal order always yield identical
/// bytes.
///
/// # Errors
///
/// Returns [`EncodeError`] if a structural bound from `config` is exceeded
/// or the CBOR writer fails.
pub fn encode(cert: &Certificate, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
    check_limits(cert, config)?;
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&certificate_value(cert), &mut buf)?;
    Ok(buf)
}

/// The exact byte sequence a signature over `cert` is computed on: the
/// canonical encoding of an independent copy with the signature cleared.
///
/// The caller's certificate is never mutated.
///
/// # Errors
///
/// Returns [`EncodeError`] if the copy cannot be encoded.
pub fn signing_bytes(cert: &Certificate, config: &CodecConfig) -> Result<Vec<u8>, EncodeError> {
    let mut unsigned = cert.clone();
    unsigned.signature = None;
    encode(&unsigned, config)
}

/// Decodes a certificate from its canonical byte form.
///
/// Exact inverse of [`encode`] for every value [`encode`] can produce. With
/// `config.enforce_canonical` set, the parsed certificate is re-encoded and
/// required to match the input byte for byte, which rejects non-canonical
/// encodings and trailing garbage in one stroke.
///
/// # Errors
///
/// Returns [`DecodeError`] if the input is malformed, truncated, or
/// structurally inconsistent with the wire form.
pub fn decode(bytes: &[u8], config: &CodecConfig) -> Result<Certificate, DecodeError> {
    let value: Value = ciborium::de::from_reader(bytes)?;
    let cert = certificate_from_value(value, config)?;
    if config.enforce_canonical {
        let reencoded = encode(&cert, config).map_err(DecodeError::Canonicalize)?;
        if reencoded.as_slice() != bytes {
            return Err(DecodeError::NonCanonical);
        }
    }
    Ok(cert)
}

fn check_limits(cert: &Certificate, config: &CodecConfig) -> Result<(), EncodeError> {
    if cert.extensions.len() > config.max_extensions {
        return Err(EncodeError::TooManyExtensions {
            count: cert.extensions.len(),
            max: config.max_extensions,
        });
    }
    check_len("issuer", cert.issuer.len(), config)?;
    check_len("subject", cert.subject.len(), config)?;
    for extension in &cert.extensions {
        check_len("extension value", extension.value.len(), config)?;
    }
    if let Some(signature) = &cert.signature {
        check_len("signature", signature.len(), config)?;
    }
    Ok(())
}

fn check_len(field: &'static str, len: usize, config: &CodecConfig) -> Result<(), EncodeError> {
    if len > config.max_blob_len {
        return Err(EncodeError::FieldTooLong {
            field,
            len,
            max: config.max_blob_len,
        });
    }
    Ok(())
}

fn certificate_value(cert: &Certificate) -> Value {
    let mut fields = Vec::with_capacity(7);
    fields.push(Value::Integer(cert.serial_number.into()));
    fields.push(Value::Text(cert.issuer.clone()));
    if let Some(validity) = &cert.validity {
        fields.push(validity_value(validity));
    }
    fields.push(Value::Text(cert.subject.clone()));
    fields.push(Value::Bytes(cert.public_key.to_vec()));
    fields.push(Value::Array(
        cert.extensions.iter().map(extension_value).collect(),
    ));
    fields.push(match &cert.signature {
        Some(signature) => Value::Bytes(signature.clone()),
        None => Value::Null,
    });
    Value::Array(fields)
}

fn validity_value(validity: &Validity) -> Value {
    Value::Array(vec![
        Value::Integer(validity.not_before.epoch().into()),
        Value::Integer(validity.not_after.epoch().into()),
    ])
}

fn extension_value(extension: &Extension) -> Value {
    Value::Array(vec![
        Value::Integer(extension.oid.into()),
        Value::Bool(extension.critical),
        Value::Bytes(extension.value.clone()),
    ])
}

fn certificate_from_value(value: Value, config: &CodecConfig) -> Result<Certificate, DecodeError> {
    let fields = into_array(value, "certificate")?;
    match fields.len() {
        7 => {
            let [serial, issuer, validity, subject, key, extensions, signature] =
                into_fixed::<7>(fields, "certificate", "6 or 7")?;
            build_certificate(
                serial,
                issuer,
                Some(validity),
                subject,
                key,
                extensions,
                signature,
                config,
            )
        }
        6 => {
            let [serial, issuer, subject, key, extensions, signature] =
                into_fixed::<6>(fields, "certificate", "6 or 7")?;
            build_certificate(serial, issuer, None, subject, key, extensions, signature, config)
        }
        got => Err(DecodeError::WrongArity {
            field: "certificate",
            expected: "6 or 7",
            got,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_certificate(
    serial: Value,
    issuer: Value,
    validity: Option<Value>,
    subject: Value,
    key: Value,
    extensions: Value,
    signature: Value,
    config: &CodecConfig,
) -> Result<Certificate, DecodeError> {
    let serial_number = into_u64(serial, "serial_number")?;
    let issuer = into_text(issuer, "issuer", config)?;
    let validity = validity.map(validity_from_value).transpose()?;
    let subject = into_text(subject, "subject", config)?;

    let key_bytes = into_bytes(key, "public_key", config)?;
    let public_key = <[u8; PUBLIC_KEY_LEN]>::try_from(key_bytes)
        .map_err(|bytes: Vec<u8>| DecodeError::InvalidKeyLength { got: bytes.len() })?;

    let raw_extensions = into_array(extensions, "extensions")?;
    if raw_extensions.len() > config.max_extensions {
        return Err(DecodeError::TooManyExtensions {
            count: raw_extensions.len(),
            max: config.max_extensions,
        });
    }
    let extensions = raw_extensions
        .into_iter()
        .map(|value| extension_from_value(value, config))
        .collect::<Result<Vec<_>, _>>()?;

    let signature = match signature {
        Value::Null => None,
        other => Some(into_bytes(other, "signature", config)?),
    };

    Ok(Certificate {
        serial_number,
        issuer,
        validity,
        subject,
        public_key,
        extensions,
        signature,
    })
}

fn validity_from_value(value: Value) -> Result<Validity, DecodeError> {
    let fields = into_array(value, "validity")?;
    let [not_before, not_after] = into_fixed::<2>(fields, "validity", "2")?;
    Ok(Validity {
        not_before: TimeBound::from_epoch(into_i64(not_before, "not_before")?),
        not_after: TimeBound::from_epoch(into_i64(not_after, "not_after")?),
    })
}

fn extension_from_value(value: Value, config: &CodecConfig) -> Result<Extension, DecodeError> {
    let fields = into_array(value, "extension")?;
    let [oid, critical, payload] = into_fixed::<3>(fields, "extension", "3")?;
    Ok(Extension {
        oid: into_u64(oid, "oid")?,
        critical: match critical {
            Value::Bool(flag) => flag,
            other => {
                return Err(DecodeError::UnexpectedType {
                    field: "critical",
                    expected: "bool",
                    found: kind(&other),
                })
            }
        },
        value: into_bytes(payload, "extension value", config)?,
    })
}

fn into_array(value: Value, field: &'static str) -> Result<Vec<Value>, DecodeError> {
    match value {
        Value::Array(fields) => Ok(fields),
        other => Err(DecodeError::UnexpectedType {
            field,
            expected: "array",
            found: kind(&other),
        }),
    }
}

fn into_fixed<const N: usize>(
    fields: Vec<Value>,
    field: &'static str,
    expected: &'static str,
) -> Result<[Value; N], DecodeError> {
    let got = fields.len();
    <[Value; N]>::try_from(fields).map_err(|_| DecodeError::WrongArity {
        field,
        expected,
        got,
    })
}

fn into_u64(value: Value, field: &'static str) -> Result<u64, DecodeError> {
    match value {
        Value::Integer(n) => {
            u64::try_from(i128::from(n)).map_err(|_| DecodeError::IntegerOutOfRange { field })
        }
        other => Err(DecodeError::UnexpectedType {
            field,
            expected: "unsigned integer",
            found: kind(&other),
        }),
    }
}

fn into_i64(value: Value, field: &'static str) -> Result<i64, DecodeError> {
    match value {
        Value::Integer(n) => {
            i64::try_from(i128::from(n)).map_err(|_| DecodeError::IntegerOutOfRange { field })
        }
        other => Err(DecodeError::UnexpectedType {
            field,
            expected: "integer",
            found: kind(&other),
        }),
    }
}

fn into_text(value: Value, field: &'static str, config: &CodecConfig) -> Result<String, DecodeError> {
    match value {
        Value::Text(text) => {
            if text.len() > config.max_blob_len {
                return Err(DecodeError::FieldTooLong {
                    field,
                    len: text.len(),
                    max: config.max_blob_len,
                });
            }
            Ok(text)
        }
        other => Err(DecodeError::UnexpectedType {
            field,
            expected: "text string",
            found: kind(&other),
        }),
    }
}

fn into_bytes(value: Value, field: &'static str, config: &CodecConfig) -> Result<Vec<u8>, DecodeError> {
    match value {
        Value::Bytes(bytes) => {
            if bytes.len() > config.max_blob_len {
                return Err(DecodeError::FieldTooLong {
                    field,
                    len: bytes.len(),
                    max: config.max_blob_len,
                });
            }
            Ok(bytes)
        }
        other => Err(DecodeError::UnexpectedType {
            field,
            expected: "byte string",
            found: kind(&other),
        }),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "byte string",
        Value::Text(_) => "text string",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Float(_) => "float",
        Value::Tag(..) => "tag",
        _ => "unknown",
    }
}
