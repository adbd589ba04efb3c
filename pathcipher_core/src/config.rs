use crate::crypto::CipherError;

/// Default block size N in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 16;
/// Number of layers in every solving path.
pub const LAYER_COUNT: usize = 4;
/// Iterations of the chaos map applied per byte per layer.
pub const CHAOS_ITERATIONS: u32 = 5;
/// Largest block size whose padding length still fits in one byte.
pub const MAX_BLOCK_SIZE: usize = u8::MAX as usize;

/// Cipher parameters. Only the block size may be overridden; the layer count
/// and chaos iterations are fixed so the solving-path layout stays reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CipherConfig {
    block_size: usize,
}

impl CipherConfig {
    /// Configuration with a non-default block size. Decryption must use the same value.
    pub fn new(block_size: usize) -> Result<Self, CipherError> {
        if !(1..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(CipherError::InvalidBlockSize { size: block_size });
        }
        Ok(Self { block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn layers(&self) -> usize {
        LAYER_COUNT
    }

    pub fn chaos_iterations(&self) -> u32 {
        CHAOS_ITERATIONS
    }

    /// Bytes of PRF output consumed per layer: five N-byte regions plus the sbox region.
    pub fn layer_material_len(&self) -> usize {
        6 * self.block_size + 256
    }
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}
