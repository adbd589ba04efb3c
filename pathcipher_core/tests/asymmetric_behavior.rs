//! Observed behavior of the public-key path.
//!
//! The trapdoor unmasks with a digest of the *cipher* bytes while the mask was
//! built from the *seed* bytes, so a matching keypair does not recover the
//! seed. These tests pin that behavior down rather than assume a round trip.

use num_bigint::BigUint;
use pathcipher_core::{
    CipherConfig, CipherError, CombinedCiphertext, Keypair, PrivateKey, decapsulate, decrypt,
    encapsulate, encrypt, encrypt_with_rng, generate, generate_with_rng, seed_to_bytes,
};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

fn deterministic_keypair(tag: u8) -> Keypair {
    let mut rng = ChaCha20Rng::from_seed([tag; 32]);
    generate_with_rng(&mut rng).expect("keygen")
}

#[test]
fn decapsulate_does_not_invert_encapsulate() {
    let pair = deterministic_keypair(0x21);
    let mut recovered = 0;
    for i in 0u32..64 {
        let seed =
            BigUint::from(i) * BigUint::from(0x9E37_79B9_7F4A_7C15u64) + (BigUint::from(1u8) << 70);
        let encapsulation = encapsulate(&seed, &pair.public);
        if decapsulate(&encapsulation.cipher, &pair.private) == seed {
            recovered += 1;
        }
    }
    assert_eq!(recovered, 0, "trapdoor unexpectedly round-tripped");
}

#[test]
fn decapsulate_matches_its_own_definition() {
    // seed_bytes' = cipher ^ SHA-512(cipher || SHA-512(private))
    use sha2::{Digest, Sha512};
    let pair = deterministic_keypair(0x22);
    let cipher = vec![0x10u8, 0x20, 0x30];
    let public = Sha512::digest(pair.private.as_bytes());
    let mut hasher = Sha512::new();
    hasher.update(&cipher);
    hasher.update(public);
    let otp = hasher.finalize();
    let expected: Vec<u8> = cipher.iter().zip(otp.iter()).map(|(c, o)| c ^ o).collect();
    assert_eq!(
        decapsulate(&cipher, &pair.private),
        BigUint::from_bytes_le(&expected)
    );
}

#[test]
fn encapsulation_has_seed_length() {
    let pair = deterministic_keypair(0x23);
    for seed in [0u64, 1, 255, 256, u64::MAX] {
        let seed = BigUint::from(seed);
        assert_eq!(
            encapsulate(&seed, &pair.public).cipher.len(),
            seed_to_bytes(&seed).len()
        );
    }
}

#[test]
fn combined_api_does_not_recover_plaintext() {
    let pair = generate().expect("keygen");
    let message = b"the trapdoor does not round-trip".to_vec();
    for _ in 0..16 {
        let combined = encrypt(&message, &pair.public).expect("encrypt");
        match decrypt(&combined, &pair.private) {
            Ok(plaintext) => assert_ne!(plaintext, message),
            Err(err) => assert!(
                matches!(err, CipherError::InvalidPadding { .. }),
                "unexpected error: {err:?}"
            ),
        }
    }
}

#[test]
fn combined_ciphertext_layout() {
    let mut rng = ChaCha20Rng::from_seed([0x24; 32]);
    let pair = deterministic_keypair(0x25);
    let message = vec![0xAB; 40];
    let bytes =
        encrypt_with_rng(&message, &pair.public, &CipherConfig::default(), &mut rng).unwrap();
    let parsed = CombinedCiphertext::from_bytes(&bytes).unwrap();
    let declared = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    assert_eq!(declared, parsed.encapsulated_seed.len());
    assert_eq!(parsed.envelope.len(), 16 + 48);
    assert_eq!(bytes.len(), 4 + declared + parsed.envelope.len());
}

#[test]
fn truncated_combined_ciphertext_is_framing_error() {
    let pair = deterministic_keypair(0x26);
    let combined = encrypt(b"frame", &pair.public).unwrap();
    let declared = u32::from_le_bytes([combined[0], combined[1], combined[2], combined[3]]) as usize;
    let truncated = &combined[..4 + declared - 1];
    assert!(matches!(
        decrypt(truncated, &pair.private),
        Err(CipherError::MalformedCiphertext { .. })
    ));
}

#[test]
fn private_key_roundtrips_through_bytes() {
    let pair = deterministic_keypair(0x27);
    let restored = Keypair::from_private(PrivateKey::from_bytes(*pair.private.as_bytes()));
    assert_eq!(restored, pair);
}
