use log::debug;
use rand_core::{CryptoRng, RngCore};
use thiserror::Error;

use crate::chain::{decrypt_with_seed_config, encrypt_with_seed_rng};
use crate::config::CipherConfig;
use crate::rng::{random_seed_with_rng, secure_rng};
use crate::trapdoor::{PrivateKey, PublicKey, decapsulate, encapsulate};

/// Width of the little-endian encapsulation length prefix.
pub const ENCAPSULATION_LENGTH_BYTES: usize = 4;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("zero has no multiplicative inverse in GF(256)")]
    InvalidFieldOperand,

    #[error("invalid padding length {value}: ciphertext or key is corrupt or mismatched")]
    InvalidPadding { value: u8 },

    #[error("malformed combined ciphertext: encapsulation declares {declared} bytes, {available} available")]
    MalformedCiphertext { declared: usize, available: usize },

    #[error("envelope length {length} is not a whole number of {block_size}-byte blocks past the IV")]
    InvalidEnvelopeLength { length: usize, block_size: usize },

    #[error("block length mismatch: expected {expected}, found {found}")]
    BlockLength { expected: usize, found: usize },

    #[error("block size {size} outside supported range 1..=255")]
    InvalidBlockSize { size: usize },

    #[error("secure random source unavailable: {0}")]
    RandomSource(String),
}

/// `encapsulation_length (u32 LE) || encapsulated_seed || envelope`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinedCiphertext {
    pub encapsulated_seed: Vec<u8>,
    pub envelope: Vec<u8>,
}

impl CombinedCiphertext {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CipherError> {
        let declared = u32::try_from(self.encapsulated_seed.len()).map_err(|_| {
            CipherError::MalformedCiphertext {
                declared: self.encapsulated_seed.len(),
                available: u32::MAX as usize,
            }
        })?;
        let mut out = Vec::with_capacity(
            ENCAPSULATION_LENGTH_BYTES + self.encapsulated_seed.len() + self.envelope.len(),
        );
        out.extend_from_slice(&declared.to_le_bytes());
        out.extend_from_slice(&self.encapsulated_seed);
        out.extend_from_slice(&self.envelope);
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() < ENCAPSULATION_LENGTH_BYTES {
            return Err(CipherError::MalformedCiphertext {
                declared: ENCAPSULATION_LENGTH_BYTES,
                available: bytes.len(),
            });
        }
        let (prefix, rest) = bytes.split_at(ENCAPSULATION_LENGTH_BYTES);
        let mut len_bytes = [0u8; ENCAPSULATION_LENGTH_BYTES];
        len_bytes.copy_from_slice(prefix);
        let declared = u32::from_le_bytes(len_bytes) as usize;
        if declared > rest.len() {
            return Err(CipherError::MalformedCiphertext {
                declared,
                available: rest.len(),
            });
        }
        let (encapsulated_seed, envelope) = rest.split_at(declared);
        Ok(Self {
            encapsulated_seed: encapsulated_seed.to_vec(),
            envelope: envelope.to_vec(),
        })
    }
}

/// Encrypts `message` for the holder of `public` with a fresh random seed.
pub fn encrypt(message: &[u8], public: &PublicKey) -> Result<Vec<u8>, CipherError> {
    let mut rng = secure_rng();
    encrypt_with_rng(message, public, &CipherConfig::default(), &mut rng)
}

pub fn encrypt_with_rng<R: CryptoRng + RngCore>(
    message: &[u8],
    public: &PublicKey,
    config: &CipherConfig,
    rng: &mut R,
) -> Result<Vec<u8>, CipherError> {
    let seed = random_seed_with_rng(rng)?;
    let encapsulation = encapsulate(&seed, public);
    let envelope = encrypt_with_seed_rng(message, &seed, config, rng)?;
    let combined = CombinedCiphertext {
        encapsulated_seed: encapsulation.cipher,
        envelope,
    };
    let bytes = combined.to_bytes()?;
    debug!(
        "encrypt combined encapsulation_len={} envelope_len={}",
        combined.encapsulated_seed.len(),
        combined.envelope.len()
    );
    Ok(bytes)
}

/// Splits the combined ciphertext, decapsulates the seed and decrypts the envelope.
///
/// The trapdoor does not generally reproduce the encapsulated seed, so this
/// usually fails with [`CipherError::InvalidPadding`] or returns wrong bytes.
pub fn decrypt(combined: &[u8], private: &PrivateKey) -> Result<Vec<u8>, CipherError> {
    decrypt_with_config(combined, private, &CipherConfig::default())
}

pub fn decrypt_with_config(
    combined: &[u8],
    private: &PrivateKey,
    config: &CipherConfig,
) -> Result<Vec<u8>, CipherError> {
    let parsed = CombinedCiphertext::from_bytes(combined)?;
    let seed = decapsulate(&parsed.encapsulated_seed, private);
    debug!(
        "decrypt combined encapsulation_len={} envelope_len={}",
        parsed.encapsulated_seed.len(),
        parsed.envelope.len()
    );
    decrypt_with_seed_config(&parsed.envelope, &seed, config)
}
