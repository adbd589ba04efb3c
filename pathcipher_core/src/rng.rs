//! RNG helpers distinguishing the deterministic PRF and the secure system RNG.
//!
//! Every derived value inside the cipher (solving paths, one-time masks) comes
//! from [`derive_bytes`], a SHA-256 counter expansion of the seed and a context
//! label. True entropy from `OsRng` is only used for IVs and for fresh seeds at
//! the asymmetric API boundary, so the deterministic control plane stays
//! clearly separated from the entropy source.

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::crypto::CipherError;

/// Size in bytes of a freshly generated seed.
pub const RANDOM_SEED_BYTES: usize = 32;

const PRF_DIGEST_BYTES: usize = 32;

/// Convenience alias for the OS-backed RNG used for IVs and seed generation.
pub type SecureRng = OsRng;

/// Helper that exposes a secure RNG while documenting intent.
pub fn secure_rng() -> SecureRng {
    OsRng
}

/// Minimal unsigned little-endian encoding of `seed`. Zero encodes as `[0]`.
pub fn seed_to_bytes(seed: &BigUint) -> Vec<u8> {
    seed.to_bytes_le()
}

/// Expands `seed` and `context` into exactly `len` deterministic bytes.
///
/// Block `k` of the stream is `SHA-256(seed_bytes || context || k_le32)`.
pub fn derive_bytes(seed: &BigUint, len: usize, context: &str) -> Vec<u8> {
    let seed_bytes = seed_to_bytes(seed);
    let mut out = Vec::with_capacity(len + PRF_DIGEST_BYTES);
    let mut counter: u32 = 0;
    while out.len() < len {
        let mut hasher = Sha256::new();
        hasher.update(&seed_bytes);
        hasher.update(context.as_bytes());
        hasher.update(counter.to_le_bytes());
        out.extend_from_slice(&hasher.finalize());
        counter = counter.wrapping_add(1);
    }
    out.truncate(len);
    out
}

/// Fills `out` from `rng`, surfacing entropy failures instead of panicking.
pub fn fill_secure<R: CryptoRng + RngCore>(rng: &mut R, out: &mut [u8]) -> Result<(), CipherError> {
    rng.try_fill_bytes(out)
        .map_err(|err| CipherError::RandomSource(err.to_string()))
}

/// Draws a fresh seed from the OS RNG.
pub fn random_seed() -> Result<BigUint, CipherError> {
    let mut rng = secure_rng();
    random_seed_with_rng(&mut rng)
}

/// Draws [`RANDOM_SEED_BYTES`] bytes and reads them as an unsigned little-endian integer.
pub fn random_seed_with_rng<R: CryptoRng + RngCore>(rng: &mut R) -> Result<BigUint, CipherError> {
    let mut bytes = [0u8; RANDOM_SEED_BYTES];
    fill_secure(rng, &mut bytes)?;
    Ok(BigUint::from_bytes_le(&bytes))
}
