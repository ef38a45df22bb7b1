//! Compact target codec.
//!
//! The 32-bit "compact" form is a base-256 float: the top byte is the size
//! in bytes, the low 23 bits are the mantissa and bit 23 is a sign flag.
//!
//! ```text
//! value = mantissa * 256^(size - 3)
//! ```
//!
//! Decoding reports negative and overflowing encodings instead of failing;
//! callers decide what to do with them. Encoding comes in two flavors,
//! truncating and rounding. Which one a retargeting strategy uses is fixed by
//! consensus.

use primitive_types::U256;

/// Bytes in the mantissa.
const OFFSET: usize = 3;

/// Sign bit inside the 24-bit mantissa field.
pub const SIGN_BIT: u32 = 0x0080_0000;

/// Unsigned mantissa mask.
pub const MANTISSA_MASK: u32 = SIGN_BIT - 1;

/// A decoded compact value and its validity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTarget {
    /// The 256-bit value (bits above 256 are lost on overflow).
    pub target: U256,
    /// Sign flag set with a non-zero mantissa.
    pub negative: bool,
    /// The encoded value does not fit in 256 bits.
    pub overflow: bool,
}

impl DecodedTarget {
    /// Non-negative, non-overflowing and non-zero.
    pub fn is_valid(&self) -> bool {
        !self.negative && !self.overflow && !self.target.is_zero()
    }
}

/// Decode a compact value with its negative and overflow flags.
pub fn to_full(bits: u32) -> DecodedTarget {
    let size = (bits >> 24) as usize;
    let mut word = bits & MANTISSA_MASK;

    let target = if size <= OFFSET {
        word >>= 8 * (OFFSET - size);
        U256::from(word)
    } else {
        U256::from(word) << (8 * (size - OFFSET))
    };

    let negative = word != 0 && bits & SIGN_BIT != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    DecodedTarget {
        target,
        negative,
        overflow,
    }
}

/// Decode a compact value, ignoring sign and overflow.
///
/// Retargeting reads stored `bits` that already passed validation, so the
/// flags carry no information there.
#[inline]
pub fn target(bits: u32) -> U256 {
    to_full(bits).target
}

/// Encode with truncation of the bits below the mantissa.
pub fn to_compact(value: U256) -> u32 {
    let mut size = (value.bits() + 7) / 8;
    let mut mantissa = if size <= OFFSET {
        value.low_u32() << (8 * (OFFSET - size))
    } else {
        (value >> (8 * (size - OFFSET))).low_u32()
    };

    // A set sign bit would read back as negative: move to the next size up
    if mantissa & SIGN_BIT != 0 {
        mantissa >>= 8;
        size += 1;
    }
    mantissa | ((size as u32) << 24)
}

/// Encode with round-half-up on the first byte below the mantissa.
///
/// Differs from [`to_compact`] by at most one mantissa step.
pub fn to_compact_rounded(value: U256) -> u32 {
    let mut size = (value.bits() + 7) / 8;
    if size <= OFFSET {
        // Exact: nothing below the mantissa
        return to_compact(value);
    }

    let mut shift = 8 * (size - OFFSET);
    let mut mantissa = (value >> shift).low_u32();
    if mantissa & SIGN_BIT != 0 {
        shift += 8;
        size += 1;
        mantissa = (value >> shift).low_u32();
    }

    let round_byte = (value >> (shift - 8)).low_u32() & 0xff;
    if round_byte >= 0x80 {
        mantissa += 1;
        // Carry into the sign bit; the dropped byte is zero
        if mantissa & SIGN_BIT != 0 {
            mantissa >>= 8;
            size += 1;
        }
    }
    let rounded = mantissa | ((size as u32) << 24);
    // Rounding up from just below 2^256 is not representable
    if to_full(rounded).overflow {
        return to_compact(value);
    }
    rounded
}

/// Expected number of hashes to meet `bits`: `2^256 / (target + 1)`.
///
/// Zero for negative, overflowing or zero targets.
pub fn block_proof(bits: u32) -> U256 {
    let decoded = to_full(bits);
    if !decoded.is_valid() {
        return U256::zero();
    }
    let target = decoded.target;
    // 2^256 does not fit, so compute (2^256 - target - 1) / (target + 1) + 1
    match target.checked_add(U256::one()) {
        Some(divisor) => (!target / divisor) + U256::one(),
        None => U256::one(),
    }
}
