// SPDX-License-Identifier: GPL-3.0-or-later
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use anchor_lang::prelude::*;
use primitive_types::U256;
use static_assertions::const_assert_eq;

use super::logexpmath::LogExpMath;
use crate::error::ErrorCode;

/// Unsigned 18-decimal fixed point with explicit rounding direction.
///
/// Which way a result rounds is part of the contract: a caller choosing
/// `mul_down` over `mul_up` is relying on the conservative direction to be
/// preserved by everything downstream.
pub struct FixedPoint;

const_assert_eq!(FixedPoint::ONE.0[0], 1_000_000_000_000_000_000);
const_assert_eq!(FixedPoint::TWO.0[0], 2_000_000_000_000_000_000);
const_assert_eq!(FixedPoint::FOUR.0[0], 4_000_000_000_000_000_000);

impl FixedPoint {
    pub const ONE: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);
    pub const TWO: U256 = U256([2_000_000_000_000_000_000, 0, 0, 0]);
    pub const FOUR: U256 = U256([4_000_000_000_000_000_000, 0, 0, 0]);

    /// Relative width of the `pow` error envelope: 10^(-14) of the raw result.
    pub const MAX_POW_RELATIVE_ERROR: U256 = U256([10_000, 0, 0, 0]);

    pub fn add(a: U256, b: U256) -> Result<U256> {
        // fixed point addition is plain checked addition
        let c = a.checked_add(b).ok_or(ErrorCode::Overflow)?;
        Ok(c)
    }

    pub fn sub(a: U256, b: U256) -> Result<U256> {
        require!(b <= a, ErrorCode::Underflow);
        Ok(a - b)
    }

    pub fn mul_down(a: U256, b: U256) -> Result<U256> {
        let product = a.checked_mul(b).ok_or(ErrorCode::Overflow)?;
        Ok(product / Self::ONE)
    }

    pub fn mul_up(a: U256, b: U256) -> Result<U256> {
        let product = a.checked_mul(b).ok_or(ErrorCode::Overflow)?;

        // Ceiling division as (x - 1) / y + 1 rather than (x + y - 1) / y,
        // which could overflow in the addition; zero products short-circuit.
        if product.is_zero() {
            Ok(U256::zero())
        } else {
            Ok((product - U256::one()) / Self::ONE + U256::one())
        }
    }

    pub fn div_down(a: U256, b: U256) -> Result<U256> {
        require!(!b.is_zero(), ErrorCode::DivByZero);
        let a_inflated = a.checked_mul(Self::ONE).ok_or(ErrorCode::Overflow)?;
        Ok(a_inflated / b)
    }

    pub fn div_up(a: U256, b: U256) -> Result<U256> {
        require!(!b.is_zero(), ErrorCode::DivByZero);
        if a.is_zero() {
            return Ok(U256::zero());
        }
        let a_inflated = a.checked_mul(Self::ONE).ok_or(ErrorCode::Overflow)?;
        Ok((a_inflated - U256::one()) / b + U256::one())
    }

    /// x^y rounding down: the result never exceeds the true value.
    pub fn pow_down(x: U256, y: U256) -> Result<U256> {
        // Exponents 1, 2 and 4 come up constantly in 50/50 and 80/20 pools;
        // they are answered exactly, with no error margin.
        if y == Self::ONE {
            Ok(x)
        } else if y == Self::TWO {
            Self::mul_down(x, x)
        } else if y == Self::FOUR {
            let square = Self::mul_down(x, x)?;
            Self::mul_down(square, square)
        } else {
            let raw = LogExpMath::pow(x, y)?;
            let max_error = Self::add(Self::mul_up(raw, Self::MAX_POW_RELATIVE_ERROR)?, U256::one())?;

            if raw < max_error {
                Ok(U256::zero())
            } else {
                Self::sub(raw, max_error)
            }
        }
    }

    /// x^y rounding up: the result is never below the true value.
    pub fn pow_up(x: U256, y: U256) -> Result<U256> {
        if y == Self::ONE {
            Ok(x)
        } else if y == Self::TWO {
            Self::mul_up(x, x)
        } else if y == Self::FOUR {
            let square = Self::mul_up(x, x)?;
            Self::mul_up(square, square)
        } else {
            let raw = LogExpMath::pow(x, y)?;
            let max_error = Self::add(Self::mul_up(raw, Self::MAX_POW_RELATIVE_ERROR)?, U256::one())?;

            Self::add(raw, max_error)
        }
    }

    /// 1 - x, capped at zero for x above one. Useful on values carrying some
    /// relative error: the clamp strips it instead of underflowing.
    pub fn complement(x: U256) -> U256 {
        if x < Self::ONE {
            Self::ONE - x
        } else {
            U256::zero()
        }
    }
}
