//! Arithmetic over GF(2^8) with the Rijndael polynomial `x^8 + x^4 + x^3 + x + 1`.

use crate::crypto::CipherError;

/// Low byte of the reduction polynomial (`0x11B & 0xFF`).
const REDUCTION: u8 = 0x1B;

/// Carry-less product of `a` and `b` reduced modulo the Rijndael polynomial.
pub const fn mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= REDUCTION;
        }
        b >>= 1;
        i += 1;
    }
    product
}

/// Multiplicative inverse, computed as `a^254` by 254 sequential multiplications.
///
/// Zero has no inverse and yields [`CipherError::InvalidFieldOperand`].
pub fn inv(a: u8) -> Result<u8, CipherError> {
    if a == 0 {
        return Err(CipherError::InvalidFieldOperand);
    }
    let mut acc = 1u8;
    for _ in 0..254 {
        acc = mul(acc, a);
    }
    Ok(acc)
}
