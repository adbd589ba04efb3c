//! Chained message cipher and the `IV || blocks` envelope.
//!
//! Block `b` is XORed with the previous emitted ciphertext block (the IV for
//! `b == 0`), run through the solving path for `(seed, b)`, then masked with
//! the one-time pad `PRF(seed + b, N, "OTP")`. Decryption chains against the
//! previous *raw* ciphertext block. There is no authentication: a wrong key or
//! tampered envelope is only detected when the padding byte lands out of range.

use log::debug;
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};

use crate::block::{decrypt_block, encrypt_block};
use crate::config::CipherConfig;
use crate::crypto::CipherError;
use crate::path::SolvingPath;
use crate::rng::{derive_bytes, fill_secure, secure_rng};

pub const OTP_CONTEXT: &str = "OTP";

/// PKCS-style padding: appends `pad_len` bytes of value `pad_len`, where
/// `pad_len` is in `1..=block_size` and always a full block for aligned input.
pub fn pad(message: &[u8], block_size: usize) -> Vec<u8> {
    let pad_len = block_size - message.len() % block_size;
    let mut padded = Vec::with_capacity(message.len() + pad_len);
    padded.extend_from_slice(message);
    padded.resize(message.len() + pad_len, pad_len as u8);
    padded
}

/// Strips the padding described by the final byte.
pub fn unpad(mut padded: Vec<u8>, block_size: usize) -> Result<Vec<u8>, CipherError> {
    let value = *padded.last().ok_or(CipherError::InvalidPadding { value: 0 })?;
    let pad_len = value as usize;
    if pad_len == 0 || pad_len > block_size || pad_len > padded.len() {
        return Err(CipherError::InvalidPadding { value });
    }
    padded.truncate(padded.len() - pad_len);
    Ok(padded)
}

/// One-time mask for block `block_index`.
pub fn block_mask(seed: &BigUint, block_index: u64, block_size: usize) -> Vec<u8> {
    derive_bytes(&(seed + BigUint::from(block_index)), block_size, OTP_CONTEXT)
}

/// Encrypts `message` under `seed` with a fresh random IV and default configuration.
pub fn encrypt_with_seed(message: &[u8], seed: &BigUint) -> Result<Vec<u8>, CipherError> {
    let mut rng = secure_rng();
    encrypt_with_seed_rng(message, seed, &CipherConfig::default(), &mut rng)
}

pub fn encrypt_with_seed_rng<R: CryptoRng + RngCore>(
    message: &[u8],
    seed: &BigUint,
    config: &CipherConfig,
    rng: &mut R,
) -> Result<Vec<u8>, CipherError> {
    let mut iv = vec![0u8; config.block_size()];
    fill_secure(rng, &mut iv)?;
    encrypt_with_iv(message, seed, &iv, config)
}

/// Deterministic variant of [`encrypt_with_seed_rng`] for a caller-chosen IV.
pub fn encrypt_with_iv(
    message: &[u8],
    seed: &BigUint,
    iv: &[u8],
    config: &CipherConfig,
) -> Result<Vec<u8>, CipherError> {
    let block_size = config.block_size();
    if iv.len() != block_size {
        return Err(CipherError::BlockLength {
            expected: block_size,
            found: iv.len(),
        });
    }
    let padded = pad(message, block_size);
    let mut envelope = Vec::with_capacity(block_size + padded.len());
    envelope.extend_from_slice(iv);

    let mut prev = iv.to_vec();
    for (index, chunk) in padded.chunks(block_size).enumerate() {
        let block_index = index as u64;
        let chained: Vec<u8> = chunk.iter().zip(&prev).map(|(m, p)| m ^ p).collect();
        let path = SolvingPath::derive(seed, block_index, config);
        let mut emitted = encrypt_block(&chained, &path)?;
        xor_in_place(&mut emitted, &block_mask(seed, block_index, block_size));
        envelope.extend_from_slice(&emitted);
        prev = emitted;
    }
    debug!(
        "encrypt message_len={} blocks={} block_size={} envelope_len={}",
        message.len(),
        padded.len() / block_size,
        block_size,
        envelope.len()
    );
    Ok(envelope)
}

/// Decrypts an envelope with the default configuration.
pub fn decrypt_with_seed(envelope: &[u8], seed: &BigUint) -> Result<Vec<u8>, CipherError> {
    decrypt_with_seed_config(envelope, seed, &CipherConfig::default())
}

pub fn decrypt_with_seed_config(
    envelope: &[u8],
    seed: &BigUint,
    config: &CipherConfig,
) -> Result<Vec<u8>, CipherError> {
    let block_size = config.block_size();
    if envelope.len() < 2 * block_size || envelope.len() % block_size != 0 {
        return Err(CipherError::InvalidEnvelopeLength {
            length: envelope.len(),
            block_size,
        });
    }
    let (iv, body) = envelope.split_at(block_size);
    let mut plaintext = Vec::with_capacity(body.len());
    let mut prev = iv;
    for (index, raw) in body.chunks(block_size).enumerate() {
        let block_index = index as u64;
        let mut unmasked = raw.to_vec();
        xor_in_place(&mut unmasked, &block_mask(seed, block_index, block_size));
        let path = SolvingPath::derive(seed, block_index, config);
        let mut decoded = decrypt_block(&unmasked, &path)?;
        xor_in_place(&mut decoded, prev);
        plaintext.extend_from_slice(&decoded);
        prev = raw;
    }
    let message = unpad(plaintext, block_size)?;
    debug!(
        "decrypt envelope_len={} blocks={} block_size={} message_len={}",
        envelope.len(),
        body.len() / block_size,
        block_size,
        message.len()
    );
    Ok(message)
}

fn xor_in_place(target: &mut [u8], mask: &[u8]) {
    for (byte, m) in target.iter_mut().zip(mask) {
        *byte ^= m;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn seed(value: u64) -> BigUint {
        BigUint::from(value)
    }

    #[test]
    fn padding_lengths() {
        assert_eq!(pad(b"", 16), vec![16u8; 16]);
        assert_eq!(pad(&[1, 2, 3], 4), vec![1, 2, 3, 1]);
        let aligned = pad(&[7u8; 16], 16);
        assert_eq!(aligned.len(), 32);
        assert!(aligned[16..].iter().all(|b| *b == 16));
    }

    #[test]
    fn unpad_rejects_out_of_range() {
        let mut padded = vec![0u8; 16];
        padded[15] = 0;
        assert!(matches!(
            unpad(padded.clone(), 16),
            Err(CipherError::InvalidPadding { value: 0 })
        ));
        padded[15] = 17;
        assert!(matches!(
            unpad(padded, 16),
            Err(CipherError::InvalidPadding { value: 17 })
        ));
    }

    #[test]
    fn empty_message_vector() {
        let iv = [0u8; 16];
        let envelope = encrypt_with_iv(b"", &seed(0), &iv, &CipherConfig::default()).unwrap();
        assert_eq!(envelope.len(), 32);
        assert_eq!(&envelope[..16], &iv);
        assert!(decrypt_with_seed(&envelope, &seed(0)).unwrap().is_empty());
    }

    #[test]
    fn roundtrip_lengths_zero_through_several_blocks() {
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let config = CipherConfig::default();
        for len in 0..=80usize {
            let message: Vec<u8> = (0..len).map(|i| (i * 13) as u8).collect();
            let envelope = encrypt_with_seed_rng(&message, &seed(31337), &config, &mut rng).unwrap();
            assert_eq!(envelope.len(), 16 * (len / 16 + 2));
            assert_eq!(decrypt_with_seed(&envelope, &seed(31337)).unwrap(), message);
        }
    }

    #[test]
    fn roundtrip_with_custom_block_size() {
        let config = CipherConfig::new(5).unwrap();
        let mut rng = ChaCha20Rng::from_seed([4u8; 32]);
        let message = b"odd block sizes work too";
        let envelope = encrypt_with_seed_rng(message, &seed(8), &config, &mut rng).unwrap();
        assert_eq!(envelope.len() % 5, 0);
        assert_eq!(decrypt_with_seed_config(&envelope, &seed(8), &config).unwrap(), message);
    }

    #[test]
    fn large_seed_roundtrip() {
        let big = BigUint::parse_bytes(b"340282366920938463463374607431768211457", 10).unwrap();
        let envelope = encrypt_with_seed(b"big integer seed", &big).unwrap();
        assert_eq!(decrypt_with_seed(&envelope, &big).unwrap(), b"big integer seed");
    }

    #[test]
    fn fresh_iv_per_encryption() {
        let a = encrypt_with_seed(b"same message", &seed(5)).unwrap();
        let b = encrypt_with_seed(b"same message", &seed(5)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_iv_is_deterministic() {
        let config = CipherConfig::default();
        let iv = [0x42u8; 16];
        let a = encrypt_with_iv(b"deterministic", &seed(6), &iv, &config).unwrap();
        let b = encrypt_with_iv(b"deterministic", &seed(6), &iv, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn block_mask_is_deterministic_and_indexed() {
        assert_eq!(block_mask(&seed(1), 0, 16), block_mask(&seed(1), 0, 16));
        assert_eq!(block_mask(&seed(1), 1, 16), block_mask(&seed(2), 0, 16));
        assert_ne!(block_mask(&seed(1), 0, 16), block_mask(&seed(1), 1, 16));
    }

    #[test]
    fn malformed_envelope_lengths_rejected() {
        for len in [0usize, 15, 16, 17, 33] {
            let err = decrypt_with_seed(&vec![0u8; len], &seed(1)).unwrap_err();
            assert!(
                matches!(err, CipherError::InvalidEnvelopeLength { length, block_size: 16 } if length == len),
                "unexpected error for len {len}: {err:?}"
            );
        }
    }

    #[test]
    fn wrong_iv_length_rejected() {
        let err = encrypt_with_iv(b"x", &seed(1), &[0u8; 8], &CipherConfig::default()).unwrap_err();
        assert!(matches!(err, CipherError::BlockLength { expected: 16, found: 8 }));
    }

    #[test]
    fn tampering_never_returns_original() {
        // 47 bytes: the final block carries a single padding byte.
        let message: Vec<u8> = (0..47u8).map(|i| i.wrapping_mul(29)).collect();
        let iv = [0x11u8; 16];
        let envelope = encrypt_with_iv(&message, &seed(77), &iv, &CipherConfig::default()).unwrap();
        for byte in 0..envelope.len() {
            for bit in [0u8, 3, 7] {
                let mut tampered = envelope.clone();
                tampered[byte] ^= 1 << bit;
                match decrypt_with_seed(&tampered, &seed(77)) {
                    Ok(recovered) => assert_ne!(recovered, message, "flip at {byte}:{bit} went unnoticed"),
                    Err(err) => assert!(matches!(err, CipherError::InvalidPadding { .. })),
                }
            }
        }
    }

    #[test]
    fn wrong_seed_does_not_recover() {
        let envelope = encrypt_with_seed(b"secret", &seed(1)).unwrap();
        match decrypt_with_seed(&envelope, &seed(2)) {
            Ok(recovered) => assert_ne!(recovered, b"secret"),
            Err(err) => assert!(matches!(err, CipherError::InvalidPadding { .. })),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]
        #[test]
        fn message_roundtrip(
            seed_bytes in prop::collection::vec(any::<u8>(), 0..40),
            message in prop::collection::vec(any::<u8>(), 0..100),
            iv in prop::collection::vec(any::<u8>(), 16)
        ) {
            let seed = BigUint::from_bytes_le(&seed_bytes);
            let envelope = encrypt_with_iv(&message, &seed, &iv, &CipherConfig::default()).unwrap();
            prop_assert_eq!(decrypt_with_seed(&envelope, &seed).unwrap(), message);
        }
    }
}
