//! Layered block transform over one N-byte block.
//!
//! Each layer evaluates positions strictly left to right: the diffusion term
//! at position `i` is built from the layer's output bytes at `i-1` and `i-2`.
//! On decryption those bytes are the layer's still-encoded input, so the
//! inverse reads the same values the forward pass produced.

use crate::chaos;
use crate::config::CHAOS_ITERATIONS;
use crate::crypto::CipherError;
use crate::gf256;
use crate::path::{Layer, SolvingPath};

/// Runs `block` forward through every layer of `path`, layer 0 first.
pub fn encrypt_block(block: &[u8], path: &SolvingPath) -> Result<Vec<u8>, CipherError> {
    check_len(block, path)?;
    let mut state = block.to_vec();
    for layer in path.layers() {
        state = forward_layer(&state, layer);
    }
    Ok(state)
}

/// Exact inverse of [`encrypt_block`], processing layers in reverse order.
pub fn decrypt_block(block: &[u8], path: &SolvingPath) -> Result<Vec<u8>, CipherError> {
    check_len(block, path)?;
    let mut state = block.to_vec();
    for layer in path.layers().iter().rev() {
        state = backward_layer(&state, layer)?;
    }
    Ok(state)
}

fn check_len(block: &[u8], path: &SolvingPath) -> Result<(), CipherError> {
    if block.len() != path.block_size() {
        return Err(CipherError::BlockLength {
            expected: path.block_size(),
            found: block.len(),
        });
    }
    Ok(())
}

fn forward_layer(input: &[u8], layer: &Layer) -> Vec<u8> {
    let mut output = vec![0u8; input.len()];
    for i in 0..input.len() {
        let chaos_seed = layer.chaos_seed()[i];
        let mut value = input[layer.permutation()[i]] ^ layer.xor_mask()[i];
        value = value.wrapping_add(diffusion(&output, i, chaos_seed));
        value = gf256::mul(value, layer.field_multiplier()[i]);
        value = layer.sbox()[value as usize];
        value = value.rotate_left(layer.rotation()[i]);
        output[i] = chaos::forward(value, chaos_seed, CHAOS_ITERATIONS);
    }
    output
}

fn backward_layer(input: &[u8], layer: &Layer) -> Result<Vec<u8>, CipherError> {
    let mut output = vec![0u8; input.len()];
    for i in 0..input.len() {
        let chaos_seed = layer.chaos_seed()[i];
        let mut value = chaos::backward(input[i], chaos_seed, CHAOS_ITERATIONS);
        value = value.rotate_right(layer.rotation()[i]);
        value = layer.inverse_sbox()[value as usize];
        value = gf256::mul(value, gf256::inv(layer.field_multiplier()[i])?);
        value = value.wrapping_sub(diffusion(input, i, chaos_seed));
        output[layer.permutation()[i]] = value ^ layer.xor_mask()[i];
    }
    Ok(output)
}

/// `(3 * prev1 + prev2) ^ chaos_seed` over the bytes at `i-1` and `i-2` (0 when absent).
fn diffusion(produced: &[u8], i: usize, chaos_seed: u8) -> u8 {
    let prev1 = if i >= 1 { produced[i - 1] } else { 0 };
    let prev2 = if i >= 2 { produced[i - 2] } else { 0 };
    prev1.wrapping_mul(3).wrapping_add(prev2) ^ chaos_seed
}
