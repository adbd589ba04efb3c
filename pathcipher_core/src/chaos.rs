//! Seed-parameterized invertible byte map used as the last stage of each layer.

/// Multiplier of the forward map.
const FORWARD_FACTOR: u8 = 5;
/// `5 * 205 == 1 (mod 256)`.
const INVERSE_FACTOR: u8 = 205;

/// Applies `v = ((v ^ seed) * 5 + seed) mod 256` `iterations` times.
pub fn forward(mut value: u8, seed: u8, iterations: u32) -> u8 {
    for _ in 0..iterations {
        value = (value ^ seed)
            .wrapping_mul(FORWARD_FACTOR)
            .wrapping_add(seed);
    }
    value
}

/// Exact inverse of [`forward`] for the same `seed` and `iterations`.
pub fn backward(mut value: u8, seed: u8, iterations: u32) -> u8 {
    for _ in 0..iterations {
        let t = value.wrapping_sub(seed).wrapping_mul(INVERSE_FACTOR);
        value = t ^ seed;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn inverse_factor_is_modular_inverse() {
        assert_eq!(FORWARD_FACTOR.wrapping_mul(INVERSE_FACTOR), 1);
    }

    #[test]
    fn zero_iterations_is_identity() {
        assert_eq!(forward(0xAB, 0x11, 0), 0xAB);
        assert_eq!(backward(0xAB, 0x11, 0), 0xAB);
    }

    #[test]
    fn single_iteration_known_value() {
        // (0x10 ^ 0x03) * 5 + 3 = 0x13 * 5 + 3 = 98
        assert_eq!(forward(0x10, 0x03, 1), 98);
        assert_eq!(backward(98, 0x03, 1), 0x10);
    }

    #[test]
    fn exhaustive_roundtrip_five_iterations() {
        for seed in 0..=255u8 {
            for value in 0..=255u8 {
                assert_eq!(backward(forward(value, seed, 5), seed, 5), value);
            }
        }
    }

    #[test]
    fn forward_is_a_bijection_per_seed() {
        for seed in [1u8, 7, 128, 255] {
            let mut seen = [false; 256];
            for value in 0..=255u8 {
                seen[forward(value, seed, 5) as usize] = true;
            }
            assert!(seen.iter().all(|hit| *hit));
        }
    }

    proptest! {
        #[test]
        fn roundtrip_any_iteration_count(value in any::<u8>(), seed in any::<u8>(), iterations in 0u32..64) {
            prop_assert_eq!(backward(forward(value, seed, iterations), seed, iterations), value);
        }
    }
}
