//! Solving path: the per-block key schedule.
//!
//! A solving path is pure data derived from `(seed, block_index)`. Layer `l`
//! draws `6N + 256` PRF bytes from `seed + block_index + l` under the
//! `"path"` context and splits them, in order, into the permutation,
//! XOR mask, rotations, chaos seeds, field multipliers and sbox selectors.

use log::trace;
use num_bigint::BigUint;

use crate::config::CipherConfig;
use crate::rng::derive_bytes;

pub const PATH_CONTEXT: &str = "path";

const SBOX_LEN: usize = 256;

/// Parameters of one layer of the block transform for a block of N bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    permutation: Vec<usize>,
    xor_mask: Vec<u8>,
    rotation: Vec<u32>,
    chaos_seed: Vec<u8>,
    field_multiplier: Vec<u8>,
    sbox: [u8; SBOX_LEN],
    inverse_sbox: [u8; SBOX_LEN],
}

impl Layer {
    fn derive(layer_seed: &BigUint, config: &CipherConfig) -> Self {
        let n = config.block_size();
        let material = derive_bytes(layer_seed, config.layer_material_len(), PATH_CONTEXT);
        let (perm_bytes, rest) = material.split_at(n);
        let (xor_mask, rest) = rest.split_at(n);
        let (rotation_bytes, rest) = rest.split_at(n);
        let (chaos_bytes, rest) = rest.split_at(n);
        let (multiplier_bytes, sbox_bytes) = rest.split_at(n);

        let permutation = swap_shuffle(n, perm_bytes);
        let rotation = rotation_bytes.iter().map(|b| 1 + u32::from(b % 7)).collect();
        let chaos_seed = chaos_bytes.iter().map(|&b| nonzero(b)).collect();
        let field_multiplier = multiplier_bytes.iter().map(|&b| nonzero(b)).collect();

        let mut sbox = [0u8; SBOX_LEN];
        for (slot, value) in sbox.iter_mut().zip(swap_shuffle(SBOX_LEN, sbox_bytes)) {
            *slot = value as u8;
        }
        let mut inverse_sbox = [0u8; SBOX_LEN];
        for (index, &value) in sbox.iter().enumerate() {
            inverse_sbox[value as usize] = index as u8;
        }

        Self {
            permutation,
            xor_mask: xor_mask.to_vec(),
            rotation,
            chaos_seed,
            field_multiplier,
            sbox,
            inverse_sbox,
        }
    }

    /// Gather indices: output position `i` reads input position `permutation()[i]`.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    pub fn xor_mask(&self) -> &[u8] {
        &self.xor_mask
    }

    /// Left-rotation amounts, each in `1..=7`.
    pub fn rotation(&self) -> &[u32] {
        &self.rotation
    }

    /// Non-zero per-position chaos seeds, also folded into the diffusion term.
    pub fn chaos_seed(&self) -> &[u8] {
        &self.chaos_seed
    }

    /// Non-zero GF(256) multipliers.
    pub fn field_multiplier(&self) -> &[u8] {
        &self.field_multiplier
    }

    pub fn sbox(&self) -> &[u8; SBOX_LEN] {
        &self.sbox
    }

    /// `inverse_sbox()[sbox()[x]] == x` for every byte `x`.
    pub fn inverse_sbox(&self) -> &[u8; SBOX_LEN] {
        &self.inverse_sbox
    }
}

/// Ordered layers for one block, fully determined by `(seed, block_index)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolvingPath {
    block_size: usize,
    layers: Vec<Layer>,
}

impl SolvingPath {
    pub fn derive(seed: &BigUint, block_index: u64, config: &CipherConfig) -> Self {
        let base = seed + BigUint::from(block_index);
        let layers = (0..config.layers())
            .map(|layer| Layer::derive(&(&base + BigUint::from(layer)), config))
            .collect();
        trace!(
            "derived solving path block_index={} layers={} block_size={}",
            block_index,
            config.layers(),
            config.block_size()
        );
        Self {
            block_size: config.block_size(),
            layers,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

/// Builds a bijection of `0..len` by swapping position `i` with
/// `selectors[i % selectors.len()] % len`, starting from the identity.
fn swap_shuffle(len: usize, selectors: &[u8]) -> Vec<usize> {
    let mut values: Vec<usize> = (0..len).collect();
    if selectors.is_empty() {
        return values;
    }
    for i in 0..len {
        let j = selectors[i % selectors.len()] as usize % len;
        values.swap(i, j);
    }
    values
}

fn nonzero(byte: u8) -> u8 {
    if byte == 0 { 1 } else { byte }
}
