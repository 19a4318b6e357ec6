// SPDX-License-Identifier: MIT

use anchor_lang::prelude::*;
use primitive_types::{U256, U512};

use crate::error::ErrorCode;

/// Checked wrappers over unsigned 256-bit arithmetic.
///
/// The bare `U256` operators panic on overflow; everything here reports an
/// error instead so callers can decide.
pub struct Math;

impl Math {
    pub fn add(a: U256, b: U256) -> Result<U256> {
        let c = a.checked_add(b).ok_or(ErrorCode::Overflow)?;
        Ok(c)
    }

    pub fn sub(a: U256, b: U256) -> Result<U256> {
        require!(b <= a, ErrorCode::Underflow);
        Ok(a - b)
    }

    pub fn mul(a: U256, b: U256) -> Result<U256> {
        let c = a.checked_mul(b).ok_or(ErrorCode::Overflow)?;
        Ok(c)
    }

    pub fn div_down(a: U256, b: U256) -> Result<U256> {
        require!(!b.is_zero(), ErrorCode::DivByZero);
        Ok(a / b)
    }

    pub fn div_up(a: U256, b: U256) -> Result<U256> {
        require!(!b.is_zero(), ErrorCode::DivByZero);

        // (a + b - 1) / b without the overflowing addition: (a - 1) / b + 1,
        // which needs a zero dividend handled separately.
        if a.is_zero() {
            Ok(U256::zero())
        } else {
            Ok((a - U256::one()) / b + U256::one())
        }
    }

    pub fn max(a: U256, b: U256) -> U256 {
        if a < b {
            b
        } else {
            a
        }
    }

    pub fn min(a: U256, b: U256) -> U256 {
        if a < b {
            a
        } else {
            b
        }
    }

    /// floor(a * b / denominator), carrying the product at 512 bits so it
    /// cannot overflow before the division.
    pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
        require!(!denominator.is_zero(), ErrorCode::DivByZero);

        let d = denominator.0;
        let quotient = a.full_mul(b) / U512([d[0], d[1], d[2], d[3], 0, 0, 0, 0]);

        let q = quotient.0;
        require!(
            q[4] == 0 && q[5] == 0 && q[6] == 0 && q[7] == 0,
            ErrorCode::Overflow
        );
        Ok(U256([q[0], q[1], q[2], q[3]]))
    }
}
