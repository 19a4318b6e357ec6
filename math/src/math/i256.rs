// SPDX-License-Identifier: MIT

use anchor_lang::prelude::*;
use core::cmp::Ordering;
use core::ops::{Add, Div, Mul, Neg, Rem, Sub};

use primitive_types::U256;

use crate::error::ErrorCode;

/// Signed 256-bit integer stored as a two's complement `U256`, mirroring
/// `int256` semantics: range [-2^255, 2^255 - 1], symmetric overflow checks,
/// and division that truncates toward zero.
///
/// The operators panic on overflow, like the checked arithmetic of the host
/// environment they model; fallible call sites go through the `TryFrom`
/// conversions instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct I256(pub U256);

const SIGN_BIT: U256 = U256([0, 0, 0, 0x8000_0000_0000_0000]);

/// Two's complement negation of raw limbs, with carry propagation.
const fn negated(limbs: [u64; 4]) -> [u64; 4] {
    let (l0, c0) = (!limbs[0]).overflowing_add(1);
    let (l1, c1) = (!limbs[1]).overflowing_add(c0 as u64);
    let (l2, c2) = (!limbs[2]).overflowing_add(c1 as u64);
    let l3 = (!limbs[3]).wrapping_add(c2 as u64);
    [l0, l1, l2, l3]
}

impl I256 {
    pub const ZERO: I256 = I256(U256([0, 0, 0, 0]));
    pub const MIN: I256 = I256(SIGN_BIT);
    pub const MAX: I256 = I256(U256([
        u64::MAX,
        u64::MAX,
        u64::MAX,
        0x7fff_ffff_ffff_ffff,
    ]));

    /// Builds a value from raw two's complement limbs, least significant
    /// first. Used for table constants too large for `from_i128`.
    pub const fn from_limbs(limbs: [u64; 4]) -> Self {
        I256(U256(limbs))
    }

    pub const fn from_i128(value: i128) -> Self {
        let magnitude = value.unsigned_abs();
        let limbs = [magnitude as u64, (magnitude >> 64) as u64, 0, 0];
        if value >= 0 {
            I256(U256(limbs))
        } else {
            I256(U256(negated(limbs)))
        }
    }

    pub fn is_negative(&self) -> bool {
        self.0.bit(255)
    }

    /// Magnitude as an unsigned integer; well defined for `MIN` as well.
    pub fn unsigned_abs(&self) -> U256 {
        if self.is_negative() {
            (!self.0).overflowing_add(U256::one()).0
        } else {
            self.0
        }
    }

    fn from_sign_magnitude(negative: bool, magnitude: U256) -> Self {
        if negative {
            assert!(magnitude <= SIGN_BIT, "I256: overflow");
            I256((!magnitude).overflowing_add(U256::one()).0)
        } else {
            assert!(magnitude <= Self::MAX.0, "I256: overflow");
            I256(magnitude)
        }
    }
}

impl Add for I256 {
    type Output = I256;

    fn add(self, rhs: I256) -> I256 {
        let out = I256(self.0.overflowing_add(rhs.0).0);
        // Wrapping two's complement addition overflows exactly when both
        // operands share a sign and the result does not.
        assert!(
            self.is_negative() != rhs.is_negative() || out.is_negative() == self.is_negative(),
            "I256: overflow"
        );
        out
    }
}

impl Sub for I256 {
    type Output = I256;

    fn sub(self, rhs: I256) -> I256 {
        let out = I256(self.0.overflowing_sub(rhs.0).0);
        assert!(
            self.is_negative() == rhs.is_negative() || out.is_negative() == self.is_negative(),
            "I256: overflow"
        );
        out
    }
}

impl Neg for I256 {
    type Output = I256;

    fn neg(self) -> I256 {
        assert!(self != I256::MIN, "I256: overflow");
        I256((!self.0).overflowing_add(U256::one()).0)
    }
}

impl Mul for I256 {
    type Output = I256;

    fn mul(self, rhs: I256) -> I256 {
        let magnitude = self
            .unsigned_abs()
            .checked_mul(rhs.unsigned_abs())
            .expect("I256: overflow");
        I256::from_sign_magnitude(self.is_negative() != rhs.is_negative(), magnitude)
    }
}

impl Div for I256 {
    type Output = I256;

    fn div(self, rhs: I256) -> I256 {
        assert!(!rhs.0.is_zero(), "I256: division by zero");
        let magnitude = self.unsigned_abs() / rhs.unsigned_abs();
        I256::from_sign_magnitude(self.is_negative() != rhs.is_negative(), magnitude)
    }
}

impl Rem for I256 {
    type Output = I256;

    fn rem(self, rhs: I256) -> I256 {
        assert!(!rhs.0.is_zero(), "I256: division by zero");
        let magnitude = self.unsigned_abs() % rhs.unsigned_abs();
        // the remainder keeps the sign of the dividend
        I256::from_sign_magnitude(self.is_negative(), magnitude)
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipping the sign bit maps the signed order onto the unsigned one.
        (self.0 ^ SIGN_BIT).cmp(&(other.0 ^ SIGN_BIT))
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl TryFrom<U256> for I256 {
    type Error = anchor_lang::error::Error;

    fn try_from(value: U256) -> Result<Self> {
        require!(value <= I256::MAX.0, ErrorCode::Overflow);
        Ok(I256(value))
    }
}

impl TryFrom<I256> for U256 {
    type Error = anchor_lang::error::Error;

    fn try_from(value: I256) -> Result<Self> {
        require!(!value.is_negative(), ErrorCode::Overflow);
        Ok(value.0)
    }
}
