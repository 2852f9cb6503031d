//! Fuzz harness for the certificate decoder.
//!
//! Feeds arbitrary byte sequences to `decode` in both canonical-enforcing
//! and relaxed modes, ensuring the decoder never panics on malformed CBOR,
//! truncated input, wrong arities, or oversized fields. Whenever a decode
//! succeeds in canonical mode, re-encoding must reproduce the input bytes
//! exactly.

#![no_main]
use libfuzzer_sys::fuzz_target;
use tinycert::{decode, encode, CodecConfig};

fuzz_target!(|data: &[u8]| {
    let canonical = CodecConfig::default();
    if let Ok(cert) = decode(data, &canonical) {
        // Canonical decode accepts only its own encoding.
        let reencoded = encode(&cert, &canonical).expect("decoded certificate must re-encode");
        assert_eq!(reencoded.as_slice(), data);
    }

    let relaxed = CodecConfig {
        enforce_canonical: false,
        ..CodecConfig::default()
    };
    let _ = decode(data, &relaxed);
});
