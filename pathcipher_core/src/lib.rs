//! Core types and primitives for the experimental pathcipher construction.
//!
//! A seed (an arbitrary-precision integer) drives everything: per block, a
//! solving path of four layers is derived from the seed through a SHA-256
//! counter PRF, the layered block transform runs the block through
//! permutation, masking, intra-round diffusion, GF(256) multiplication,
//! substitution, rotation and a chaos map, and the chained mode feeds each
//! emitted block into the next. A SHA-512 trapdoor wraps the seed for the
//! public-key API.
//!
//! The implementation intentionally favors clarity over performance and
//! should **not** be used for production security. It offers no
//! authentication, no constant-time guarantees, and the trapdoor does not in
//! general return the encapsulated seed (see [`trapdoor`]).

pub mod block;
pub mod chain;
pub mod chaos;
pub mod config;
pub mod crypto;
pub mod gf256;
pub mod path;
pub mod rng;
pub mod trapdoor;
pub mod versioning;

pub use crate::block::{decrypt_block, encrypt_block};
pub use crate::chain::{
    block_mask, decrypt_with_seed, decrypt_with_seed_config, encrypt_with_iv, encrypt_with_seed,
    encrypt_with_seed_rng, pad, unpad,
};
pub use crate::config::{CHAOS_ITERATIONS, CipherConfig, DEFAULT_BLOCK_SIZE, LAYER_COUNT};
pub use crate::crypto::{
    CipherError, CombinedCiphertext, decrypt, decrypt_with_config, encrypt, encrypt_with_rng,
};
pub use crate::path::{Layer, SolvingPath};
pub use crate::rng::{SecureRng, derive_bytes, random_seed, secure_rng, seed_to_bytes};
pub use crate::trapdoor::{
    Encapsulation, Keypair, PrivateKey, PublicKey, decapsulate, encapsulate, generate,
    generate_with_rng,
};

/// The seed type: an arbitrary-precision non-negative integer.
pub type Seed = num_bigint::BigUint;
pub use crate::versioning::*;
