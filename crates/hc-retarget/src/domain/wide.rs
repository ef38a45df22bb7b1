//! 512-bit intermediate arithmetic.
//!
//! A 256-bit target multiplied by a timespan ratio (or by a cubed timespan in
//! the exponential approximation) does not fit in 256 bits. Every retargeting
//! formula therefore runs `target * numerator / denominator` in 512 bits and
//! truncates back afterwards.
//!
//! All operations are checked: overflow yields `None` instead of wrapping.

use primitive_types::{U256, U512};
use std::cmp::Ordering;
use std::fmt;

/// Fixed-width 512-bit unsigned integer.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WideUint(U512);

impl WideUint {
    /// Zero.
    pub fn zero() -> Self {
        Self(U512::zero())
    }

    /// One.
    pub fn one() -> Self {
        Self(U512::one())
    }

    /// Widen a 256-bit value.
    pub fn from_u256(value: U256) -> Self {
        Self(U512::from(value))
    }

    /// Widen a 64-bit value.
    pub fn from_u64(value: u64) -> Self {
        Self(U512::from(value))
    }

    /// True when the value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked multiplication.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        self.0.checked_mul(rhs.0).map(Self)
    }

    /// Checked multiplication by a small factor.
    pub fn checked_mul_u64(self, rhs: u64) -> Option<Self> {
        self.checked_mul(Self::from_u64(rhs))
    }

    /// Checked division; `None` when dividing by zero.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.0.checked_div(rhs.0).map(Self)
    }

    /// `2^exponent`, `None` past 511.
    pub fn pow2(exponent: u32) -> Option<Self> {
        if exponent >= 512 {
            return None;
        }
        Some(Self(U512::one() << exponent as usize))
    }

    /// `value * numerator / denominator` without intermediate overflow.
    ///
    /// `None` when the product overflows 512 bits or the denominator is zero.
    pub fn mul_div(value: U256, numerator: Self, denominator: Self) -> Option<Self> {
        Self::from_u256(value)
            .checked_mul(numerator)?
            .checked_div(denominator)
    }

    /// Low 256 bits; higher bits are discarded.
    pub fn trim256(self) -> U256 {
        let words = self.0 .0;
        U256([words[0], words[1], words[2], words[3]])
    }

    /// Exact narrowing, `None` when any of the upper 256 bits is set.
    pub fn to_u256(self) -> Option<U256> {
        U256::try_from(self.0).ok()
    }

    /// Compare against a 256-bit value.
    pub fn cmp_u256(&self, other: U256) -> Ordering {
        self.0.cmp(&U512::from(other))
    }

    /// Number of significant bits.
    pub fn bits(&self) -> usize {
        self.0.bits()
    }
}

impl PartialOrd for WideUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WideUint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl From<U256> for WideUint {
    fn from(value: U256) -> Self {
        Self::from_u256(value)
    }
}

impl From<u64> for WideUint {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Debug for WideUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WideUint({:#x})", self.0)
    }
}

impl fmt::Display for WideUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
