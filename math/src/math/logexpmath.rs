// SPDX-License-Identifier: MIT
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated
// documentation files (the "Software"), to deal in the Software without restriction, including without limitation the
// rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the
// Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE
// WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR
// OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use anchor_lang::prelude::*;
use primitive_types::U256;
use static_assertions::const_assert_eq;

use super::i256::I256;
use crate::error::ErrorCode;

/// Natural exponentiation and logarithm over 18-decimal fixed point, plus the
/// arbitrary-base `pow` and `log` built on top of them.
///
/// Arguments and results carry 18 decimals; intermediates run at 20 decimals
/// (36 for `ln_36`) so the low-order digits of the result are exact. Every
/// division truncates toward zero. The term counts, the decomposition order
/// and the scale of each intermediate are all part of the contract: changing
/// any of them changes the low-order digits.
pub struct LogExpMath;

pub const ONE_18: I256 = I256::from_i128(1_000_000_000_000_000_000);
pub const ONE_20: I256 = I256::from_i128(100_000_000_000_000_000_000);
pub const ONE_36: I256 = I256::from_i128(1_000_000_000_000_000_000_000_000_000_000_000_000);

const HUNDRED: I256 = I256::from_i128(100);
const TWO: I256 = I256::from_i128(2);

// Pin the limb spellings of the scale constants.
const_assert_eq!(ONE_18.0 .0[0], 1_000_000_000_000_000_000);
const_assert_eq!(ONE_20.0 .0[0], 0x6bc7_5e2d_6310_0000);
const_assert_eq!(ONE_20.0 .0[1], 0x5);
const_assert_eq!(ONE_36.0 .0[0], 0xb34b_9f10_0000_0000);
const_assert_eq!(ONE_36.0 .0[1], 0x00c0_97ce_7bc9_0715);

// The domain of natural exponentiation is bound by the word size and the
// decimals used: the largest representable result is (2^255 - 1) / 10^20,
// whose logarithm is 130.700..., and the smallest is 10^(-18), whose
// logarithm is -41.446.... Both bounds keep a safety margin.
pub const MAX_NATURAL_EXPONENT: I256 = I256::from_i128(130_000_000_000_000_000_000);
pub const MIN_NATURAL_EXPONENT: I256 = I256::from_i128(-41_000_000_000_000_000_000);

// Inside this window around one, ln is evaluated at 36 decimals: ln(0.9) and
// ln(1.1) both still fit a 256-bit fixed point value at that scale.
pub const LN_36_LOWER_BOUND: I256 = I256::from_i128(900_000_000_000_000_000);
pub const LN_36_UPPER_BOUND: I256 = I256::from_i128(1_100_000_000_000_000_000);

// Decomposition table: x_n = 2^(7 - n) and a_n = e^(x_n). x0, x1 carry 18
// decimals; their a_n would not fit 256 bits at any decimal scale and are
// stored as plain integers. From n = 2 on, both sides carry 20 decimals.
const X0: I256 = I256::from_i128(128_000_000_000_000_000_000); // 2^7
const A0: I256 = I256::from_limbs([
    0x0262_8270_0000_0000,
    0xf53a_2717_2fa9_ec63,
    0x0195_e54c_5dd4_2177,
    0,
]); // e^(2^7) = 38877084059945950922200000000000000000000000000000000000
const X1: I256 = I256::from_i128(64_000_000_000_000_000_000); // 2^6
const A1: I256 = I256::from_i128(6_235_149_080_811_616_882_910_000_000); // e^(2^6)

const X2: I256 = I256::from_i128(3_200_000_000_000_000_000_000); // 2^5
const A2: I256 = I256::from_i128(7_896_296_018_268_069_516_100_000_000_000_000); // e^(2^5)
const X3: I256 = I256::from_i128(1_600_000_000_000_000_000_000); // 2^4
const A3: I256 = I256::from_i128(888_611_052_050_787_263_676_000_000); // e^(2^4)
const X4: I256 = I256::from_i128(800_000_000_000_000_000_000); // 2^3
const A4: I256 = I256::from_i128(298_095_798_704_172_827_474_000); // e^(2^3)
const X5: I256 = I256::from_i128(400_000_000_000_000_000_000); // 2^2
const A5: I256 = I256::from_i128(5_459_815_003_314_423_907_810); // e^(2^2)
const X6: I256 = I256::from_i128(200_000_000_000_000_000_000); // 2^1
const A6: I256 = I256::from_i128(738_905_609_893_065_022_723); // e^(2^1)
const X7: I256 = I256::from_i128(100_000_000_000_000_000_000); // 2^0
const A7: I256 = I256::from_i128(271_828_182_845_904_523_536); // e^(2^0)
const X8: I256 = I256::from_i128(50_000_000_000_000_000_000); // 2^-1
const A8: I256 = I256::from_i128(164_872_127_070_012_814_685); // e^(2^-1)
const X9: I256 = I256::from_i128(25_000_000_000_000_000_000); // 2^-2
const A9: I256 = I256::from_i128(128_402_541_668_774_148_407); // e^(2^-2)
const X10: I256 = I256::from_i128(12_500_000_000_000_000_000); // 2^-3
const A10: I256 = I256::from_i128(113_314_845_306_682_631_683); // e^(2^-3)
const X11: I256 = I256::from_i128(6_250_000_000_000_000_000); // 2^-4
const A11: I256 = I256::from_i128(106_449_445_891_785_942_956); // e^(2^-4)

const BREAKDOWN_20: [(I256, I256); 10] = [
    (X2, A2),
    (X3, A3),
    (X4, A4),
    (X5, A5),
    (X6, A6),
    (X7, A7),
    (X8, A8),
    (X9, A9),
    (X10, A10),
    (X11, A11),
];

impl LogExpMath {
    /// x^y with unsigned 18-decimal base and exponent, computed as
    /// exp(y * ln(x)).
    pub fn pow(x: U256, y: U256) -> Result<U256> {
        if y.is_zero() {
            // 0^0 is taken to be one
            return U256::try_from(ONE_18);
        }
        if x.is_zero() {
            return Ok(U256::zero());
        }

        // ln takes a signed argument, so x must fit the signed range; bounding
        // y guarantees the same for y and keeps y * ln(x) from overflowing.
        let x_int256 = I256::try_from(x)?;
        let mild_exponent_bound = (U256::one() << 254usize) / U256::try_from(ONE_20)?;
        require!(y < mild_exponent_bound, ErrorCode::Overflow);
        let y_int256 = I256::try_from(y)?;

        // y * ln(x), with the division by ONE_18 deferred to the very end.
        // Near one the 36-decimal logarithm is used; y cannot be upscaled to
        // 36 decimals without overflowing, so its halves multiply separately.
        let mut logx_times_y = if LN_36_LOWER_BOUND < x_int256 && x_int256 < LN_36_UPPER_BOUND {
            let ln_36_x = Self::ln_36(x_int256);
            (ln_36_x / ONE_18) * y_int256 + ((ln_36_x % ONE_18) * y_int256) / ONE_18
        } else {
            Self::ln_internal(x_int256) * y_int256
        };
        logx_times_y = logx_times_y / ONE_18;

        require!(
            MIN_NATURAL_EXPONENT <= logx_times_y && logx_times_y <= MAX_NATURAL_EXPONENT,
            ErrorCode::DomainError
        );

        U256::try_from(Self::exp(logx_times_y)?)
    }

    /// e^x with signed 18-decimal argument, defined on
    /// [MIN_NATURAL_EXPONENT, MAX_NATURAL_EXPONENT].
    pub fn exp(x: I256) -> Result<I256> {
        require!(x >= MIN_NATURAL_EXPONENT, ErrorCode::Underflow);
        require!(x <= MAX_NATURAL_EXPONENT, ErrorCode::Overflow);

        if x < I256::ZERO {
            // e^(-x) = 1 / e^x; dividing 10^36 by the 18-decimal reciprocal
            // keeps 18 decimals. The negated argument is back in range.
            return Ok(ONE_36 / Self::exp(-x)?);
        }

        // Decompose x against the x_n in descending order: e^x is the product
        // of the matching a_n times the exponential of the remainder. x0 and
        // x1 cannot both apply, since their sum exceeds the domain bound.
        let mut x = x;
        let first_an = if x >= X0 {
            x = x - X0;
            A0
        } else if x >= X1 {
            x = x - X1;
            A1
        } else {
            I256::from_i128(1)
        };

        // The remaining terms work at 20 decimals.
        x = x * HUNDRED;
        let mut product = ONE_20;
        for (x_n, a_n) in &BREAKDOWN_20[..8] {
            if x >= *x_n {
                x = x - *x_n;
                product = (product * *a_n) / ONE_20;
            }
        }
        // x10 and x11 add nothing at this precision

        // Taylor series for the remainder, now smaller than x9:
        // e^x = 1 + x + x^2/2! + ... + x^12/12!.
        let mut series_sum = ONE_20 + x;
        let mut term = x;
        for n in 2..=12i128 {
            term = ((term * x) / ONE_20) / I256::from_i128(n);
            series_sum = series_sum + term;
        }

        // product and series_sum carry 20 decimals, first_an none; the final
        // division by 100 returns to 18 decimals.
        Ok((((product * series_sum) / ONE_20) * first_an) / HUNDRED)
    }

    /// log_base(arg), both signed 18-decimal, via 36-decimal natural logs.
    pub fn log(arg: I256, base: I256) -> Result<I256> {
        require!(I256::ZERO < arg && I256::ZERO < base, ErrorCode::DomainError);

        let log_base = if LN_36_LOWER_BOUND < base && base < LN_36_UPPER_BOUND {
            Self::ln_36(base)
        } else {
            Self::ln_internal(base) * ONE_18
        };
        require!(log_base != I256::ZERO, ErrorCode::DivByZero);

        let log_arg = if LN_36_LOWER_BOUND < arg && arg < LN_36_UPPER_BOUND {
            Self::ln_36(arg)
        } else {
            Self::ln_internal(arg) * ONE_18
        };

        // multiplying by ONE_18 leaves the quotient at 18 decimals
        Ok((log_arg * ONE_18) / log_base)
    }

    /// ln(a) with signed 18-decimal argument, defined for a > 0.
    pub fn ln(a: I256) -> Result<I256> {
        require!(I256::ZERO < a, ErrorCode::DomainError);
        if LN_36_LOWER_BOUND < a && a < LN_36_UPPER_BOUND {
            Ok(Self::ln_36(a) / ONE_18)
        } else {
            Ok(Self::ln_internal(a))
        }
    }

    fn ln_internal(a: I256) -> I256 {
        if a < ONE_18 {
            // ln(a) = -ln(1/a); the reciprocal of a sub-one argument is above
            // one, so the recursion terminates after a single step.
            return -Self::ln_internal(ONE_36 / a);
        }

        // Decompose a against the a_n in descending order: dividing a_n out
        // adds x_n = ln(a_n) to the result and shrinks the remainder.
        let mut a = a;
        let mut sum = I256::ZERO;
        if a >= A0 * ONE_18 {
            a = a / A0; // a0 carries no decimals, so this is integer division
            sum = sum + X0;
        }
        if a >= A1 * ONE_18 {
            a = a / A1;
            sum = sum + X1;
        }

        // the remaining a_n carry 20 decimals; rescale the running state
        sum = sum * HUNDRED;
        a = a * HUNDRED;

        for (x_n, a_n) in &BREAKDOWN_20 {
            if a >= *a_n {
                a = (a * ONE_20) / *a_n;
                sum = sum + *x_n;
            }
        }

        // a is now below a11 ~ 1.06, where the series in z = (a - 1) / (a + 1)
        // converges quickly: ln(a) = 2 * (z + z^3/3 + z^5/5 + ...).
        let z = ((a - ONE_20) * ONE_20) / (a + ONE_20);
        let z_squared = (z * z) / ONE_20;

        let mut num = z;
        let mut series_sum = num;
        for d in [3i128, 5, 7, 9, 11] {
            num = (num * z_squared) / ONE_20;
            series_sum = series_sum + num / I256::from_i128(d);
        }
        series_sum = series_sum * TWO;

        (sum + series_sum) / HUNDRED
    }

    /// 36-decimal ln for arguments close to one, where ln(1) = 0 makes the
    /// extra digits worthwhile. Callers guard the
    /// (LN_36_LOWER_BOUND, LN_36_UPPER_BOUND) window.
    fn ln_36(x: I256) -> I256 {
        let x = x * ONE_18;

        // same series as ln_internal, two terms further, at 36 decimals
        let z = ((x - ONE_36) * ONE_36) / (x + ONE_36);
        let z_squared = (z * z) / ONE_36;

        let mut num = z;
        let mut series_sum = num;
        for d in [3i128, 5, 7, 9, 11, 13, 15] {
            num = (num * z_squared) / ONE_36;
            series_sum = series_sum + num / I256::from_i128(d);
        }

        series_sum * TWO
    }
}
