//! End-to-end behavior of the protection layer through its public API.
//!
//! Uses a cheap scrypt cost everywhere except the one `#[ignore]`d test that
//! exercises the production parameters.

use nsteg_core::SizeHeader;
use nsteg_crypto::{
    frame_bit_len, BitSequence, CarrierFrame, CipherEnvelope, CryptoError, FixedPassword,
    FrameMode, KdfParams, PasswordBuffer, Protector, Salt, ENVELOPE_OVERHEAD, SALT_SIZE,
};
use proptest::prelude::*;
use secrecy::SecretString;

fn fast() -> Protector {
    Protector::new(KdfParams {
        log_n: 4,
        r: 8,
        p: 1,
    })
}

fn source(pw: &str) -> FixedPassword {
    FixedPassword::new(SecretString::from(pw.to_string()))
}

#[test]
fn five_byte_payload_scenario() {
    let protector = fast();
    let payload = [0x01u8, 0x02, 0x03, 0x04, 0x05];
    let sizes = SizeHeader::new(5, 5);

    let (salt, envelope) = protector
        .protect(&payload, &sizes, "correct horse".into())
        .expect("protect");
    assert_eq!(salt.as_bytes().len(), SALT_SIZE);
    assert_eq!(envelope.len(), 33);
    assert_eq!(envelope.plaintext_len(), Some(5));

    let out = protector
        .unprotect(&envelope, &salt, &sizes, "correct horse".into())
        .expect("unprotect");
    assert_eq!(out, payload);

    assert_eq!(
        protector.unprotect(&envelope, &salt, &sizes, "wrong".into()),
        Err(CryptoError::Authentication)
    );
}

#[test]
#[ignore = "runs scrypt at N=2^18, r=8, p=8 (about 256 MiB per derivation)"]
fn default_cost_roundtrip() {
    let sizes = SizeHeader::new(5, 5);
    let (salt, envelope) =
        nsteg_crypto::protect(b"hello", &sizes, "correct horse".into()).expect("protect");
    let out =
        nsteg_crypto::unprotect(&envelope, &salt, &sizes, "correct horse".into()).expect("unprotect");
    assert_eq!(out, b"hello");
}

#[test]
fn same_inputs_never_repeat_output() {
    let protector = fast();
    let sizes = SizeHeader::uncompressed(4);
    let (salt_a, env_a) = protector.protect(b"same", &sizes, "pw".into()).unwrap();
    let (salt_b, env_b) = protector.protect(b"same", &sizes, "pw".into()).unwrap();

    assert_ne!(salt_a, salt_b);
    assert_ne!(env_a, env_b);
}

#[test]
fn envelope_from_other_protector_cost_fails() {
    let (salt, envelope) = fast()
        .protect(b"data", &SizeHeader::uncompressed(4), "pw".into())
        .unwrap();
    let other = Protector::new(KdfParams {
        log_n: 5,
        r: 8,
        p: 1,
    });
    assert_eq!(
        other.unprotect(&envelope, &salt, &SizeHeader::uncompressed(4), "pw".into()),
        Err(CryptoError::Authentication)
    );
}

#[test]
fn short_envelopes_fail_authentication() {
    let protector = fast();
    let salt = Salt::generate();
    let sizes = SizeHeader::uncompressed(0);
    for len in [0, 1, 11, 12, ENVELOPE_OVERHEAD - 1] {
        let envelope = CipherEnvelope::from_bytes(vec![0u8; len]);
        assert_eq!(
            protector.unprotect(&envelope, &salt, &sizes, "pw".into()),
            Err(CryptoError::Authentication),
            "length {len}"
        );
    }
}

#[test]
fn carrier_frame_end_to_end() {
    let protector = fast();
    let payload = b"compressed payload bytes";
    let sizes = SizeHeader::new(120, payload.len() as u32);

    let frame = CarrierFrame::protect(&protector, payload, sizes, &source("pw")).unwrap();
    let mut bits = frame.to_bits();
    assert_eq!(bits.len() as u64, frame_bit_len(sizes.compressed, FrameMode::Protected));

    // Carrier capacity left over after the frame
    for _ in 0..50 {
        bits.push(true);
    }

    let extracted = CarrierFrame::from_bits(&bits).unwrap();
    assert_eq!(extracted.sizes(), &sizes);
    assert_eq!(extracted.unprotect(&protector, &source("pw")).unwrap(), payload);
    assert_eq!(
        extracted.unprotect(&protector, &source("nope")),
        Err(CryptoError::Authentication)
    );
}

#[test]
fn plain_frame_end_to_end() {
    let payload = b"compressed payload bytes".to_vec();
    let sizes = SizeHeader::new(120, payload.len() as u32);

    let frame = CarrierFrame::plain(sizes, payload.clone()).unwrap();
    let mut bits = frame.to_bits();
    assert_eq!(bits.len() as u64, frame_bit_len(sizes.compressed, FrameMode::Plain));
    bits.push(false);

    let extracted = CarrierFrame::from_bits(&bits).unwrap();
    assert_eq!(extracted.mode(), FrameMode::Plain);
    // Any password, or none at all, reads a plain frame
    assert_eq!(extracted.unprotect(&fast(), &source("anything")).unwrap(), payload);
}

#[test]
fn independent_calls_run_in_parallel() {
    let protector = fast();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0u8..8)
            .map(|i| {
                let protector = &protector;
                scope.spawn(move || {
                    let payload = vec![i; 64 + usize::from(i)];
                    let sizes = SizeHeader::uncompressed(payload.len() as u32);
                    let password = format!("worker-{i}");
                    let (salt, envelope) = protector
                        .protect(&payload, &sizes, password.as_str().into())
                        .unwrap();
                    let out = protector
                        .unprotect(&envelope, &salt, &sizes, password.as_str().into())
                        .unwrap();
                    assert_eq!(out, payload);
                    salt
                })
            })
            .collect();

        let salts: std::collections::HashSet<Salt> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(salts.len(), 8);
    });
}

#[test]
fn password_buffer_moves_into_call() {
    let protector = fast();
    let password = PasswordBuffer::from_bytes(b"bytes, not utf-8 \xff".to_vec());
    let sizes = SizeHeader::uncompressed(1);
    let (salt, envelope) = protector.protect(b"x", &sizes, password).unwrap();

    let again = PasswordBuffer::from_bytes(b"bytes, not utf-8 \xff".to_vec());
    assert_eq!(
        protector.unprotect(&envelope, &salt, &sizes, again).unwrap(),
        b"x"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Any payload round-trips under its own size header and password.
    #[test]
    fn roundtrip(
        payload in prop::collection::vec(any::<u8>(), 0..512),
        uncompressed in any::<u32>(),
        password in "[ -~]{0,24}",
    ) {
        let protector = fast();
        let sizes = SizeHeader::new(uncompressed, payload.len() as u32);

        let (salt, envelope) = protector
            .protect(&payload, &sizes, password.as_str().into())
            .unwrap();
        prop_assert_eq!(envelope.len(), payload.len() + ENVELOPE_OVERHEAD);

        let out = protector
            .unprotect(&envelope, &salt, &sizes, password.as_str().into())
            .unwrap();
        prop_assert_eq!(out, payload);
    }

    /// Flipping any single envelope bit is detected.
    #[test]
    fn single_bit_tamper_detected(
        payload in prop::collection::vec(any::<u8>(), 1..64),
        flip in any::<prop::sample::Index>(),
    ) {
        let protector = fast();
        let sizes = SizeHeader::uncompressed(payload.len() as u32);
        let (salt, envelope) = protector.protect(&payload, &sizes, "pw".into()).unwrap();

        let mut raw = BitSequence::from_bytes(envelope.as_bytes()).into_inner();
        let at = flip.index(raw.len());
        raw[at] ^= 1;
        let tampered = BitSequence::from_bits(raw).unwrap().to_bytes().unwrap();

        prop_assert_eq!(
            protector.unprotect(&CipherEnvelope::from_bytes(tampered), &salt, &sizes, "pw".into()),
            Err(CryptoError::Authentication)
        );
    }

    /// A different low byte in either size field breaks authentication.
    #[test]
    fn size_low_byte_is_bound(
        payload in prop::collection::vec(any::<u8>(), 0..64),
        delta in 1u32..256,
        which_field in any::<bool>(),
    ) {
        let protector = fast();
        let sizes = SizeHeader::uncompressed(payload.len() as u32);
        let (salt, envelope) = protector.protect(&payload, &sizes, "pw".into()).unwrap();

        let mut other = sizes;
        if which_field {
            other.uncompressed ^= delta;
        } else {
            other.compressed ^= delta;
        }

        prop_assert_eq!(
            protector.unprotect(&envelope, &salt, &other, "pw".into()),
            Err(CryptoError::Authentication)
        );
    }
}
