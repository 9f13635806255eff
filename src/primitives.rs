//! EVM-specific arithmetic layered on top of `ethereum_types::U256` (§4.1).
//!
//! `U256` already gives us wrapping unsigned add/sub/mul/div/rem and
//! bitwise ops; what's missing is the handful of operations the Yellow
//! Paper defines in terms of two's-complement signed 256-bit words.

use ethereum_types::U256;

/// `2^255`, the sign bit of a two's-complement `U256`.
const SIGN_BIT: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

/// `U256::MAX`, i.e. `-1` in two's complement.
fn minus_one() -> U256 {
    U256::MAX
}

/// `i256::MIN`, i.e. `-2^255`.
fn min_value() -> U256 {
    SIGN_BIT
}

/// True if the two's-complement interpretation of `v` is negative.
pub fn is_negative(v: U256) -> bool {
    v & SIGN_BIT == SIGN_BIT
}

/// Two's-complement negation, wrapping modulo 2^256 (`-MIN == MIN`).
pub fn twos_complement(v: U256) -> U256 {
    (!v).overflowing_add(U256::one()).0
}

/// `SLT`: signed less-than.
pub fn slt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

/// `SGT`: signed greater-than.
pub fn sgt(a: U256, b: U256) -> bool {
    slt(b, a)
}

/// `SDIV`: truncated-toward-zero signed division. Division by zero yields
/// zero; `MIN / -1` overflows back to `MIN` (§4.1).
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    if a == min_value() && b == minus_one() {
        return min_value();
    }
    let a_neg = is_negative(a);
    let b_neg = is_negative(b);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b_neg { twos_complement(b) } else { b };
    let result = a_abs / b_abs;
    if a_neg != b_neg {
        twos_complement(result)
    } else {
        result
    }
}

/// `SMOD`: signed remainder, sign follows the dividend. Division by zero
/// yields zero.
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let a_neg = is_negative(a);
    let b_neg = is_negative(b);
    let a_abs = if a_neg { twos_complement(a) } else { a };
    let b_abs = if b_neg { twos_complement(b) } else { b };
    let result = a_abs % b_abs;
    if a_neg {
        twos_complement(result)
    } else {
        result
    }
}

/// `SIGNEXTEND(byte_index, value)`: sign-extend `value` treating it as a
/// signed integer occupying `byte_index + 1` bytes. `byte_index >= 31`
/// leaves `value` unchanged.
pub fn signextend(byte_index: U256, value: U256) -> U256 {
    if byte_index >= U256::from(31) {
        return value;
    }
    let byte_index = byte_index.as_u32() as usize;
    let bit_index = byte_index * 8 + 7;
    let bit = value.bit(bit_index);
    let mask = (U256::one() << (bit_index + 1)) - U256::one();
    if bit {
        value | !mask
    } else {
        value & mask
    }
}

/// `BYTE(i, value)`: the `i`-th byte of `value` counting from the most
/// significant byte, zero if `i >= 32`.
pub fn byte(i: U256, value: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    let i = i.as_u32() as usize;
    U256::from(value.byte(31 - i))
}

/// `SHL`: logical left shift; a shift amount `>= 256` yields zero.
pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.as_u32()
    }
}

/// `SHR`: logical right shift; a shift amount `>= 256` yields zero.
pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.as_u32()
    }
}

/// `SAR`: arithmetic (sign-extending) right shift; a shift amount `>= 256`
/// yields zero for a non-negative value and `U256::MAX` (`-1`) for a
/// negative one.
pub fn sar(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        return if is_negative(value) {
            U256::MAX
        } else {
            U256::zero()
        };
    }
    let shift = shift.as_u32() as usize;
    if !is_negative(value) {
        return value >> shift;
    }
    if shift == 0 {
        return value;
    }
    let shifted = value >> shift;
    let mask = !(U256::MAX >> shift);
    shifted | mask
}

/// `EXP`: modular exponentiation by squaring, `base^exponent mod 2^256`.
pub fn exp(mut base: U256, mut exponent: U256) -> U256 {
    let mut result = U256::one();
    while !exponent.is_zero() {
        if exponent.bit(0) {
            result = result.overflowing_mul(base).0;
        }
        base = base.overflowing_mul(base).0;
        exponent >>= 1;
    }
    result
}

/// Number of bytes needed to represent `exponent`, used by the `EXP`
/// dynamic-gas formula (`10 * byte_len(exponent)` post-Istanbul).
pub fn byte_len(value: U256) -> u64 {
    let bits = value.bits();
    ((bits + 7) / 8) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdiv_truncates_toward_zero() {
        assert_eq!(sdiv(U256::from(7), U256::from(2)), U256::from(3));
        assert_eq!(sdiv(twos_complement(U256::from(7)), U256::from(2)), twos_complement(U256::from(3)));
    }

    #[test]
    fn sdiv_by_zero_is_zero() {
        assert_eq!(sdiv(U256::from(7), U256::zero()), U256::zero());
    }

    #[test]
    fn sdiv_min_by_minus_one_overflows_to_min() {
        assert_eq!(sdiv(min_value(), minus_one()), min_value());
    }

    #[test]
    fn signextend_sign_extends_negative_byte() {
        let value = U256::from(0xffu64);
        let extended = signextend(U256::zero(), value);
        assert_eq!(extended, U256::MAX);
    }

    #[test]
    fn signextend_leaves_positive_byte_unchanged() {
        let value = U256::from(0x7fu64);
        assert_eq!(signextend(U256::zero(), value), value);
    }

    #[test]
    fn shl_and_shr_saturate_at_256() {
        assert_eq!(shl(U256::from(256), U256::from(1)), U256::zero());
        assert_eq!(shr(U256::from(256), U256::from(1)), U256::zero());
    }

    #[test]
    fn sar_sign_fills_negative_values() {
        let minus_two = twos_complement(U256::from(2));
        assert_eq!(sar(U256::from(1), minus_two), minus_one());
    }

    #[test]
    fn byte_extracts_big_endian_index() {
        let value = U256::from_big_endian(&[0xab; 32]);
        assert_eq!(byte(U256::zero(), value), U256::from(0xab));
        assert_eq!(byte(U256::from(32), value), U256::zero());
    }
}
