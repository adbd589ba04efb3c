//! Hash-based trapdoor binding a seed to a keypair.
//!
//! `encapsulate` masks the seed bytes with `SHA-512(seed_bytes || public)`,
//! while `decapsulate` unmasks with `SHA-512(cipher || SHA-512(private))`.
//! The two masks only agree by coincidence, so decapsulation does not in
//! general recover the encapsulated seed. This mismatch is kept as the
//! construction's observed behavior; it is not a transport for real secrets.

use std::fmt;

use log::debug;
use num_bigint::BigUint;
use rand_core::{CryptoRng, RngCore};
use serde::de::Error as DeError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::CipherError;
use crate::rng::{fill_secure, secure_rng, seed_to_bytes};
use crate::versioning::{KEYPAIR_VERSION, expect_version};

pub const PRIVATE_KEY_BYTES: usize = 32;
pub const PUBLIC_KEY_BYTES: usize = 64;
pub const TRAPDOOR_MASK_BYTES: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_BYTES]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_BYTES]);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_BYTES] {
        &self.0
    }

    /// The public key is the SHA-512 digest of the private key bytes.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(hash512(&[&self.0]))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let mut bytes = [0u8; PUBLIC_KEY_BYTES];
        hex::decode_to_slice(&text, &mut bytes).map_err(D::Error::custom)?;
        Ok(Self(bytes))
    }
}

impl Serialize for PrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut text = String::deserialize(deserializer)?;
        let mut bytes = [0u8; PRIVATE_KEY_BYTES];
        let decoded = hex::decode_to_slice(&text, &mut bytes).map_err(D::Error::custom);
        text.zeroize();
        decoded?;
        Ok(Self(bytes))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keypair {
    pub version: u16,
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl Keypair {
    /// Rebuilds a keypair from stored private key bytes.
    pub fn from_private(private: PrivateKey) -> Self {
        Self {
            version: KEYPAIR_VERSION,
            public: private.public_key(),
            private,
        }
    }
}

impl Serialize for Keypair {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Keypair", 3)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("public", &self.public)?;
        state.serialize_field("private", &self.private)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Keypair {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            version: u16,
            public: PublicKey,
            private: PrivateKey,
        }
        let helper = Helper::deserialize(deserializer)?;
        expect_version::<D::Error>(helper.version, KEYPAIR_VERSION, "Keypair")?;
        Ok(Self {
            version: helper.version,
            public: helper.public,
            private: helper.private,
        })
    }
}

/// Result of [`encapsulate`]. Only `cipher` travels in the combined ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encapsulation {
    pub cipher: Vec<u8>,
    pub otp: [u8; TRAPDOOR_MASK_BYTES],
}

pub fn generate() -> Result<Keypair, CipherError> {
    let mut rng = secure_rng();
    generate_with_rng(&mut rng)
}

pub fn generate_with_rng<R: CryptoRng + RngCore>(rng: &mut R) -> Result<Keypair, CipherError> {
    let mut bytes = [0u8; PRIVATE_KEY_BYTES];
    fill_secure(rng, &mut bytes)?;
    let private = PrivateKey(bytes);
    bytes.zeroize();
    Ok(Keypair::from_private(private))
}

pub fn encapsulate(seed: &BigUint, public: &PublicKey) -> Encapsulation {
    let seed_bytes = seed_to_bytes(seed);
    let otp = hash512(&[&seed_bytes, public.as_bytes()]);
    let cipher = apply_mask(&seed_bytes, &otp);
    debug!("encapsulate seed_len={}", seed_bytes.len());
    Encapsulation { cipher, otp }
}

pub fn decapsulate(cipher: &[u8], private: &PrivateKey) -> BigUint {
    let public = private.public_key();
    let otp = hash512(&[cipher, public.as_bytes()]);
    let seed_bytes = apply_mask(cipher, &otp);
    debug!("decapsulate cipher_len={}", cipher.len());
    BigUint::from_bytes_le(&seed_bytes)
}

/// XORs `data` with `mask`, reusing the mask cyclically past its length.
fn apply_mask(data: &[u8], mask: &[u8; TRAPDOOR_MASK_BYTES]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, byte)| byte ^ mask[i % TRAPDOOR_MASK_BYTES])
        .collect()
}

fn hash512(parts: &[&[u8]]) -> [u8; TRAPDOOR_MASK_BYTES] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; TRAPDOOR_MASK_BYTES];
    out.copy_from_slice(&digest[..TRAPDOOR_MASK_BYTES]);
    out
}
