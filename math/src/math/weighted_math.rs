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

use super::fixedpoint::FixedPoint;
use super::math::Math;
use crate::error::ErrorCode;

// A minimum normalized weight imposes a maximum weight ratio; weight ratios
// become exponents of the power function, whose accuracy degrades as they
// grow.
pub const MIN_WEIGHT: U256 = U256([10_000_000_000_000_000, 0, 0, 0]); // 1%

pub const MIN_TOKENS: usize = 2;
pub const MAX_WEIGHTED_TOKENS: usize = 100;

// Swap limits: amounts swapped may not exceed this fraction of the balance.
pub const MAX_IN_RATIO: U256 = U256([300_000_000_000_000_000, 0, 0, 0]); // 30%
pub const MAX_OUT_RATIO: U256 = U256([300_000_000_000_000_000, 0, 0, 0]); // 30%

// Window the invariant ratio of a non-proportional join or exit must stay in.
pub const MAX_INVARIANT_RATIO: U256 = U256([3_000_000_000_000_000_000, 0, 0, 0]); // 3.0
pub const MIN_INVARIANT_RATIO: U256 = U256([700_000_000_000_000_000, 0, 0, 0]); // 0.7

/// Pricing for pools holding tokens at fixed normalized weights, preserving
/// the invariant `prod balance_i ^ weight_i` under fee-less swaps.
///
/// Inputs and results are 18-decimal fixed point; token arrays share one
/// index order. Every routine rounds so the pool never pays the rounding:
/// amounts out round down, amounts in and shares burned round up.
pub struct WeightedMath;

impl WeightedMath {
    /// The callable weight guard: between 2 and 100 tokens, every weight at
    /// least 1%, and an exact 100% sum.
    pub fn ensure_normalized_weights(normalized_weights: &[U256]) -> Result<()> {
        require!(
            (MIN_TOKENS..=MAX_WEIGHTED_TOKENS).contains(&normalized_weights.len()),
            ErrorCode::InvalidTokenCount
        );

        let mut sum = U256::zero();
        for weight in normalized_weights {
            require!(*weight >= MIN_WEIGHT, ErrorCode::WeightOutOfRange);
            sum = Math::add(sum, *weight)?;
        }
        require!(sum == FixedPoint::ONE, ErrorCode::WeightOutOfRange);
        Ok(())
    }

    /**********************************************************************
    // invariant               _____                                     //
    // wi = weight index i      | |      wi                              //
    // bi = balance index i     | |  bi ^   = i                          //
    // i = invariant                                                     //
    **********************************************************************/
    // The invariant seeds the pool share supply and meters protocol fees, so
    // it always rounds the same direction: down.
    pub fn calc_invariant(normalized_weights: &[U256], balances: &[U256]) -> Result<U256> {
        require!(
            balances.len() == normalized_weights.len(),
            ErrorCode::InvalidTokenCount
        );

        let mut invariant = FixedPoint::ONE;
        for (balance, weight) in balances.iter().zip(normalized_weights) {
            invariant =
                FixedPoint::mul_down(invariant, FixedPoint::pow_down(*balance, *weight)?)?;
        }

        require!(!invariant.is_zero(), ErrorCode::ZeroInvariant);
        Ok(invariant)
    }

    /*****************************************************************************
    // outGivenIn                                                               //
    // aO = amountOut                                                           //
    // bO = balanceOut                                                          //
    // bI = balanceIn              /      /            bI             \    (wI / wO) \  //
    // aI = amountIn    aO = bO * |  1 - | --------------------------  | ^            | //
    // wI = weightIn              \      \       ( bI + aI )         /              /   //
    // wO = weightOut                                                           //
    *****************************************************************************/
    // Amount out, so round down overall: the power rounds up (its base too,
    // since bI / (bI + aI) <= 1 makes a larger base a larger power) and the
    // exponent rounds down.
    pub fn calc_out_given_in(
        balance_in: U256,
        weight_in: U256,
        balance_out: U256,
        weight_out: U256,
        amount_in: U256,
    ) -> Result<U256> {
        require!(
            amount_in <= FixedPoint::mul_down(balance_in, MAX_IN_RATIO)?,
            ErrorCode::MaxInRatio
        );

        let denominator = Math::add(balance_in, amount_in)?;
        let base = FixedPoint::div_up(balance_in, denominator)?;
        let exponent = FixedPoint::div_down(weight_in, weight_out)?;
        let power = FixedPoint::pow_up(base, exponent)?;

        FixedPoint::mul_down(balance_out, FixedPoint::complement(power))
    }

    /*****************************************************************************
    // inGivenOut                                                               //
    // aO = amountOut                                                           //
    // bO = balanceOut                                                          //
    // bI = balanceIn              /  /            bO             \    (wO / wI)      \ //
    // aI = amountIn    aI = bI * |  | --------------------------  | ^            - 1  |//
    // wI = weightIn              \  \       ( bO - aO )         /                    / //
    // wO = weightOut                                                           //
    *****************************************************************************/
    // Amount in, so round up overall: the power rounds up (base and exponent
    // both round up, the base being >= 1 here).
    pub fn calc_in_given_out(
        balance_in: U256,
        weight_in: U256,
        balance_out: U256,
        weight_out: U256,
        amount_out: U256,
    ) -> Result<U256> {
        require!(
            amount_out <= FixedPoint::mul_down(balance_out, MAX_OUT_RATIO)?,
            ErrorCode::MaxOutRatio
        );

        let base = FixedPoint::div_up(balance_out, Math::sub(balance_out, amount_out)?)?;
        let exponent = FixedPoint::div_up(weight_out, weight_in)?;
        let power = FixedPoint::pow_up(base, exponent)?;

        let ratio = Math::sub(power, FixedPoint::ONE)?;
        FixedPoint::mul_up(balance_in, ratio)
    }

    // Joins and exits charge the swap fee only on the portion of each amount
    // that moves the balances away from the current proportions; a perfectly
    // proportional join or exit pays no fee at all.

    /// Pool shares minted for an exact deposit, fee taken on the
    /// above-average portion of each amount. Shares out, so rounds down.
    pub fn calc_bpt_out_given_exact_tokens_in(
        balances: &[U256],
        normalized_weights: &[U256],
        amounts_in: &[U256],
        bpt_total_supply: U256,
        swap_fee_percentage: U256,
    ) -> Result<U256> {
        require!(
            balances.len() == normalized_weights.len() && balances.len() == amounts_in.len(),
            ErrorCode::InvalidTokenCount
        );

        // weighted average of the per-token balance growth, fees still in
        let mut balance_ratios_with_fee = Vec::with_capacity(balances.len());
        let mut invariant_ratio_with_fees = U256::zero();
        for i in 0..balances.len() {
            let ratio = FixedPoint::div_down(Math::add(balances[i], amounts_in[i])?, balances[i])?;
            invariant_ratio_with_fees = Math::add(
                invariant_ratio_with_fees,
                FixedPoint::mul_down(ratio, normalized_weights[i])?,
            )?;
            balance_ratios_with_fee.push(ratio);
        }

        let mut invariant_ratio = FixedPoint::ONE;
        for i in 0..balances.len() {
            // tokens growing faster than the weighted average pay the fee on
            // the excess; the fee itself rounds against the joiner
            let amount_in_without_fee = if balance_ratios_with_fee[i] > invariant_ratio_with_fees {
                let non_taxable_amount = if invariant_ratio_with_fees > FixedPoint::ONE {
                    FixedPoint::mul_down(
                        balances[i],
                        Math::sub(invariant_ratio_with_fees, FixedPoint::ONE)?,
                    )?
                } else {
                    U256::zero()
                };
                let taxable_amount = Math::sub(amounts_in[i], non_taxable_amount)?;
                let fee_amount = FixedPoint::mul_up(taxable_amount, swap_fee_percentage)?;
                Math::sub(Math::add(non_taxable_amount, taxable_amount)?, fee_amount)?
            } else {
                amounts_in[i]
            };

            let balance_ratio =
                FixedPoint::div_down(Math::add(balances[i], amount_in_without_fee)?, balances[i])?;
            invariant_ratio = FixedPoint::mul_down(
                invariant_ratio,
                FixedPoint::pow_down(balance_ratio, normalized_weights[i])?,
            )?;
        }

        if invariant_ratio > FixedPoint::ONE {
            FixedPoint::mul_down(bpt_total_supply, Math::sub(invariant_ratio, FixedPoint::ONE)?)
        } else {
            Ok(U256::zero())
        }
    }

    /// Single-token amount to deposit for an exact number of shares out.
    /// Token in, so rounds up.
    pub fn calc_token_in_given_exact_bpt_out(
        balance: U256,
        normalized_weight: U256,
        bpt_amount_out: U256,
        bpt_total_supply: U256,
        swap_fee_percentage: U256,
    ) -> Result<U256> {
        let invariant_ratio =
            FixedPoint::div_up(Math::add(bpt_total_supply, bpt_amount_out)?, bpt_total_supply)?;
        require!(
            invariant_ratio <= MAX_INVARIANT_RATIO,
            ErrorCode::MaxInvariantRatio
        );

        // the single balance has to grow by invariantRatio^(1/w)
        let balance_ratio =
            FixedPoint::pow_up(invariant_ratio, FixedPoint::div_up(FixedPoint::ONE, normalized_weight)?)?;
        let amount_in_without_fee =
            FixedPoint::mul_up(balance, Math::sub(balance_ratio, FixedPoint::ONE)?)?;

        // a one-token join is partly an implicit swap into every other token;
        // the taxable share is the complement of this token's weight
        let taxable_amount =
            FixedPoint::mul_up(amount_in_without_fee, FixedPoint::complement(normalized_weight))?;
        let non_taxable_amount = Math::sub(amount_in_without_fee, taxable_amount)?;
        let taxable_amount_plus_fees =
            FixedPoint::div_up(taxable_amount, FixedPoint::complement(swap_fee_percentage))?;

        Math::add(non_taxable_amount, taxable_amount_plus_fees)
    }

    /// Proportional join: per-token deposits for an exact number of shares
    /// out. No fees; the ratio and every amount round up.
    pub fn calc_all_tokens_in_given_exact_bpt_out(
        balances: &[U256],
        bpt_amount_out: U256,
        total_bpt: U256,
    ) -> Result<Vec<U256>> {
        let bpt_ratio = FixedPoint::div_up(bpt_amount_out, total_bpt)?;
        balances
            .iter()
            .map(|balance| FixedPoint::mul_up(*balance, bpt_ratio))
            .collect()
    }

    /// Pool shares burned for an exact withdrawal, fee charged on tokens
    /// leaving in above-average proportion. Shares in, so rounds up.
    pub fn calc_bpt_in_given_exact_tokens_out(
        balances: &[U256],
        normalized_weights: &[U256],
        amounts_out: &[U256],
        bpt_total_supply: U256,
        swap_fee_percentage: U256,
    ) -> Result<U256> {
        require!(
            balances.len() == normalized_weights.len() && balances.len() == amounts_out.len(),
            ErrorCode::InvalidTokenCount
        );

        let mut balance_ratios_without_fee = Vec::with_capacity(balances.len());
        let mut invariant_ratio_without_fees = U256::zero();
        for i in 0..balances.len() {
            let ratio = FixedPoint::div_up(Math::sub(balances[i], amounts_out[i])?, balances[i])?;
            invariant_ratio_without_fees = Math::add(
                invariant_ratio_without_fees,
                FixedPoint::mul_up(ratio, normalized_weights[i])?,
            )?;
            balance_ratios_without_fee.push(ratio);
        }

        let mut invariant_ratio = FixedPoint::ONE;
        for i in 0..balances.len() {
            // tokens shrinking the pool faster than the weighted average are
            // charged fees on the excess, making the exit amount larger
            let amount_out_with_fee = if invariant_ratio_without_fees > balance_ratios_without_fee[i]
            {
                let non_taxable_amount = FixedPoint::mul_down(
                    balances[i],
                    FixedPoint::complement(invariant_ratio_without_fees),
                )?;
                let taxable_amount = Math::sub(amounts_out[i], non_taxable_amount)?;
                let taxable_amount_plus_fees =
                    FixedPoint::div_up(taxable_amount, FixedPoint::complement(swap_fee_percentage))?;
                Math::add(non_taxable_amount, taxable_amount_plus_fees)?
            } else {
                amounts_out[i]
            };

            let balance_ratio =
                FixedPoint::div_down(Math::sub(balances[i], amount_out_with_fee)?, balances[i])?;
            invariant_ratio = FixedPoint::mul_down(
                invariant_ratio,
                FixedPoint::pow_down(balance_ratio, normalized_weights[i])?,
            )?;
        }

        FixedPoint::mul_up(bpt_total_supply, FixedPoint::complement(invariant_ratio))
    }

    /// Single-token amount withdrawn for an exact number of shares in.
    /// Token out, so rounds down.
    pub fn calc_token_out_given_exact_bpt_in(
        balance: U256,
        normalized_weight: U256,
        bpt_amount_in: U256,
        bpt_total_supply: U256,
        swap_fee_percentage: U256,
    ) -> Result<U256> {
        let invariant_ratio =
            FixedPoint::div_up(Math::sub(bpt_total_supply, bpt_amount_in)?, bpt_total_supply)?;
        require!(
            invariant_ratio >= MIN_INVARIANT_RATIO,
            ErrorCode::MinInvariantRatio
        );

        // rounding the exponent down keeps the (sub-one) power large and the
        // amount out small
        let balance_ratio = FixedPoint::pow_up(
            invariant_ratio,
            FixedPoint::div_down(FixedPoint::ONE, normalized_weight)?,
        )?;
        let amount_out_without_fee =
            FixedPoint::mul_down(balance, FixedPoint::complement(balance_ratio))?;

        let taxable_amount =
            FixedPoint::mul_up(amount_out_without_fee, FixedPoint::complement(normalized_weight))?;
        let non_taxable_amount = Math::sub(amount_out_without_fee, taxable_amount)?;
        let taxable_amount_minus_fees =
            FixedPoint::mul_down(taxable_amount, FixedPoint::complement(swap_fee_percentage))?;

        Math::add(non_taxable_amount, taxable_amount_minus_fees)
    }

    /// Proportional exit: per-token amounts for an exact number of shares in.
    /// No fees; the ratio and every amount round down.
    pub fn calc_tokens_out_given_exact_bpt_in(
        balances: &[U256],
        bpt_amount_in: U256,
        total_bpt: U256,
    ) -> Result<Vec<U256>> {
        let bpt_ratio = FixedPoint::div_down(bpt_amount_in, total_bpt)?;
        balances
            .iter()
            .map(|balance| FixedPoint::mul_down(*balance, bpt_ratio))
            .collect()
    }

    /// Shares minted when a token joins the pool at `normalized_weight`, so
    /// that existing holders keep their share of the other tokens: the supply
    /// grows with the weight sum, by 1 / (1 - w).
    pub fn calc_bpt_out_add_token(total_supply: U256, normalized_weight: U256) -> Result<U256> {
        let weight_sum_ratio =
            FixedPoint::div_down(FixedPoint::ONE, FixedPoint::complement(normalized_weight))?;
        FixedPoint::mul_down(total_supply, Math::sub(weight_sum_ratio, FixedPoint::ONE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn fp(v: u128) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_weight_guard() {
        WeightedMath::ensure_normalized_weights(&[fp(ONE / 2), fp(ONE / 2)]).unwrap();
        WeightedMath::ensure_normalized_weights(&[fp(ONE / 5), fp(3 * ONE / 10), fp(ONE / 2)])
            .unwrap();

        // one token, sum off by one, weight below 1%
        assert!(WeightedMath::ensure_normalized_weights(&[fp(ONE)]).is_err());
        assert!(
            WeightedMath::ensure_normalized_weights(&[fp(ONE / 2), fp(ONE / 2 + 1)]).is_err()
        );
        assert!(
            WeightedMath::ensure_normalized_weights(&[fp(ONE / 200), fp(ONE - ONE / 200)])
                .is_err()
        );
    }

    #[test]
    fn test_invariant_balanced_pool() {
        // 50/50 pool with equal balances: invariant equals the balance, up to
        // the power envelope
        let invariant =
            WeightedMath::calc_invariant(&[fp(ONE / 2), fp(ONE / 2)], &[fp(100 * ONE), fp(100 * ONE)])
                .unwrap();
        assert_eq!(invariant, fp(99_999_999_999_997_999_760));
    }

    #[test]
    fn test_invariant_weighted_pool() {
        let invariant = WeightedMath::calc_invariant(
            &[fp(3 * ONE / 10), fp(7 * ONE / 10)],
            &[fp(100 * ONE), fp(200 * ONE)],
        )
        .unwrap();
        assert_eq!(invariant, fp(162_450_479_271_243_855_103));
    }

    #[test]
    fn test_invariant_errors() {
        assert!(
            WeightedMath::calc_invariant(&[fp(ONE / 2)], &[fp(ONE), fp(ONE)]).is_err()
        );
        assert!(WeightedMath::calc_invariant(
            &[fp(ONE / 2), fp(ONE / 2)],
            &[U256::zero(), fp(ONE)]
        )
        .is_err());
    }

    #[test]
    fn test_out_given_in() {
        // 50/50, equal balances of 100, swap 10 in: out = 100 * (1 - 100/110)
        let out = WeightedMath::calc_out_given_in(
            fp(100 * ONE),
            fp(ONE / 2),
            fp(100 * ONE),
            fp(ONE / 2),
            fp(10 * ONE),
        )
        .unwrap();
        assert_eq!(out, fp(9_090_909_090_909_090_900));
    }

    #[test]
    fn test_out_given_in_ratio_guard() {
        assert!(WeightedMath::calc_out_given_in(
            fp(100 * ONE),
            fp(ONE / 2),
            fp(100 * ONE),
            fp(ONE / 2),
            fp(31 * ONE),
        )
        .is_err());
    }

    #[test]
    fn test_in_given_out_inverts_out_given_in() {
        // feeding the out amount back recovers the original input exactly on
        // this 50/50 pool
        let amount_in = WeightedMath::calc_in_given_out(
            fp(100 * ONE),
            fp(ONE / 2),
            fp(100 * ONE),
            fp(ONE / 2),
            fp(9_090_909_090_909_090_900),
        )
        .unwrap();
        assert_eq!(amount_in, fp(10 * ONE));
    }

    #[test]
    fn test_in_given_out_ratio_guard() {
        assert!(WeightedMath::calc_in_given_out(
            fp(100 * ONE),
            fp(ONE / 2),
            fp(100 * ONE),
            fp(ONE / 2),
            fp(31 * ONE),
        )
        .is_err());
    }

    #[test]
    fn test_bpt_out_given_exact_tokens_in_proportional() {
        // proportional 10% deposit with no fee mints (almost) 10% of supply
        let bpt_out = WeightedMath::calc_bpt_out_given_exact_tokens_in(
            &[fp(100 * ONE), fp(200 * ONE)],
            &[fp(3 * ONE / 10), fp(7 * ONE / 10)],
            &[fp(10 * ONE), fp(20 * ONE)],
            fp(100 * ONE),
            U256::zero(),
        )
        .unwrap();
        assert_eq!(bpt_out, fp(9_999_999_999_997_799_300));
    }

    #[test]
    fn test_bpt_out_given_exact_tokens_in_skewed() {
        let bpt_out = WeightedMath::calc_bpt_out_given_exact_tokens_in(
            &[fp(100 * ONE), fp(200 * ONE)],
            &[fp(3 * ONE / 10), fp(7 * ONE / 10)],
            &[fp(10 * ONE), fp(5 * ONE)],
            fp(100 * ONE),
            fp(ONE / 100),
        )
        .unwrap();
        assert_eq!(bpt_out, fp(4_679_662_416_257_679_400));
    }

    #[test]
    fn test_token_in_given_exact_bpt_out() {
        let amount_in = WeightedMath::calc_token_in_given_exact_bpt_out(
            fp(100 * ONE),
            fp(3 * ONE / 10),
            fp(10 * ONE),
            fp(100 * ONE),
            fp(ONE / 100),
        )
        .unwrap();
        assert_eq!(amount_in, fp(37_660_902_946_608_192_902));
    }

    #[test]
    fn test_token_in_invariant_ratio_guard() {
        // minting 2.1x the supply pushes the invariant ratio past 3.0
        assert!(WeightedMath::calc_token_in_given_exact_bpt_out(
            fp(100 * ONE),
            fp(ONE / 2),
            fp(210 * ONE),
            fp(100 * ONE),
            U256::zero(),
        )
        .is_err());
    }

    #[test]
    fn test_all_tokens_in_given_exact_bpt_out() {
        let amounts = WeightedMath::calc_all_tokens_in_given_exact_bpt_out(
            &[fp(100 * ONE), fp(200 * ONE)],
            fp(10 * ONE),
            fp(100 * ONE),
        )
        .unwrap();
        assert_eq!(amounts, vec![fp(10 * ONE), fp(20 * ONE)]);
    }

    #[test]
    fn test_bpt_in_given_exact_tokens_out() {
        let bpt_in = WeightedMath::calc_bpt_in_given_exact_tokens_out(
            &[fp(100 * ONE), fp(200 * ONE)],
            &[fp(3 * ONE / 10), fp(7 * ONE / 10)],
            &[fp(5 * ONE), fp(10 * ONE)],
            fp(100 * ONE),
            fp(ONE / 100),
        )
        .unwrap();
        assert_eq!(bpt_in, fp(5_000_000_000_001_900_300));
    }

    #[test]
    fn test_token_out_given_exact_bpt_in() {
        let amount_out = WeightedMath::calc_token_out_given_exact_bpt_in(
            fp(200 * ONE),
            fp(7 * ONE / 10),
            fp(10 * ONE),
            fp(100 * ONE),
            fp(ONE / 100),
        )
        .unwrap();
        assert_eq!(amount_out, fp(27_863_197_544_903_165_331));
    }

    #[test]
    fn test_token_out_invariant_ratio_guard() {
        // burning 40% of the supply pushes the invariant ratio below 0.7
        assert!(WeightedMath::calc_token_out_given_exact_bpt_in(
            fp(100 * ONE),
            fp(ONE / 2),
            fp(40 * ONE),
            fp(100 * ONE),
            U256::zero(),
        )
        .is_err());
    }

    #[test]
    fn test_tokens_out_given_exact_bpt_in() {
        let amounts = WeightedMath::calc_tokens_out_given_exact_bpt_in(
            &[fp(100 * ONE), fp(200 * ONE)],
            fp(10 * ONE),
            fp(100 * ONE),
        )
        .unwrap();
        assert_eq!(amounts, vec![fp(10 * ONE), fp(20 * ONE)]);
    }

    #[test]
    fn test_no_fee_join_exit_symmetry() {
        // join with a proportional 10% deposit at zero fee, then burn the
        // minted shares against the updated pool: the withdrawal returns the
        // deposit up to rounding
        let balances = [fp(100 * ONE), fp(200 * ONE)];
        let weights = [fp(3 * ONE / 10), fp(7 * ONE / 10)];
        let deposits = [fp(10 * ONE), fp(20 * ONE)];
        let supply = fp(100 * ONE);

        let bpt_out = WeightedMath::calc_bpt_out_given_exact_tokens_in(
            &balances,
            &weights,
            &deposits,
            supply,
            U256::zero(),
        )
        .unwrap();

        let new_balances = [fp(110 * ONE), fp(220 * ONE)];
        let returned = WeightedMath::calc_tokens_out_given_exact_bpt_in(
            &new_balances,
            bpt_out,
            supply + bpt_out,
        )
        .unwrap();

        assert_eq!(
            returned,
            vec![fp(9_999_999_999_997_999_310), fp(19_999_999_999_995_998_620)]
        );
    }

    #[test]
    fn test_join_grows_invariant() {
        let weights = [fp(3 * ONE / 10), fp(7 * ONE / 10)];
        let before =
            WeightedMath::calc_invariant(&weights, &[fp(100 * ONE), fp(200 * ONE)]).unwrap();
        let after =
            WeightedMath::calc_invariant(&weights, &[fp(110 * ONE), fp(220 * ONE)]).unwrap();
        assert!(after >= before);
    }

    #[test]
    fn test_add_token_dilution() {
        // a token entering at weight 1/2 doubles the weight sum, so the new
        // holder is minted the whole previous supply
        let minted =
            WeightedMath::calc_bpt_out_add_token(fp(100 * ONE), fp(ONE / 2)).unwrap();
        assert_eq!(minted, fp(100 * ONE));

        let minted = WeightedMath::calc_bpt_out_add_token(fp(100 * ONE), fp(ONE / 5)).unwrap();
        assert_eq!(minted, fp(25 * ONE));
    }

    #[test]
    fn test_add_token_full_weight_fails() {
        assert!(WeightedMath::calc_bpt_out_add_token(fp(100 * ONE), fp(ONE)).is_err());
        assert!(WeightedMath::calc_bpt_out_add_token(fp(100 * ONE), fp(2 * ONE)).is_err());
    }

    proptest! {
        // swapping out-given-in and feeding the result to in-given-out
        // recovers the original amount to within the power envelope
        #[test]
        fn prop_swap_roundtrip_band(
            balance_in in ONE..=100_000_000 * ONE,
            balance_out in ONE..=100_000_000 * ONE,
            weight_in in ONE / 100..=99 * ONE / 100,
            amount_ppm in 1u128..=300_000,
        ) {
            let balance_in = fp(balance_in);
            let balance_out = fp(balance_out);
            let weight_in = fp(weight_in);
            let weight_out = fp(ONE) - weight_in;
            let amount_in = balance_in * U256::from(amount_ppm) / U256::from(1_000_000u64);
            prop_assume!(!amount_in.is_zero());

            let out = WeightedMath::calc_out_given_in(
                balance_in, weight_in, balance_out, weight_out, amount_in,
            ).unwrap();
            prop_assume!(out <= FixedPoint::mul_down(balance_out, MAX_OUT_RATIO).unwrap());

            let back = WeightedMath::calc_in_given_out(
                balance_in, weight_in, balance_out, weight_out, out,
            ).unwrap();

            let diff = Math::max(back, amount_in) - Math::min(back, amount_in);
            prop_assert!(diff <= amount_in / U256::from(10_000u64) + U256::one());
        }

        // a proportional join implies the same growth ratio for every token,
        // up to one unit of the per-token ceiling division
        #[test]
        fn prop_proportional_join_ratios(
            b0 in ONE..=1_000_000_000 * ONE,
            b1 in ONE..=1_000_000_000 * ONE,
            supply in ONE..=1_000_000_000 * ONE,
            bpt_ppm in 1u128..=1_000_000,
        ) {
            let balances = [fp(b0), fp(b1)];
            let supply = fp(supply);
            let bpt_out = supply * U256::from(bpt_ppm) / U256::from(1_000_000u64);
            prop_assume!(!bpt_out.is_zero());

            let amounts = WeightedMath::calc_all_tokens_in_given_exact_bpt_out(
                &balances, bpt_out, supply,
            ).unwrap();

            let ratio = FixedPoint::div_up(bpt_out, supply).unwrap();
            for (balance, amount) in balances.iter().zip(&amounts) {
                let implied = FixedPoint::div_up(*amount, *balance).unwrap();
                prop_assert!(implied >= ratio);
                // mul_up overshoots by less than one unit of the balance scale
                let ulp = FixedPoint::div_up(U256::one(), *balance).unwrap();
                prop_assert!(implied - ratio <= ulp);
            }
        }

        // any join grows (or keeps) the invariant
        #[test]
        fn prop_join_grows_invariant(
            b0 in ONE..=1_000_000 * ONE,
            b1 in ONE..=1_000_000 * ONE,
            weight in ONE / 100..=99 * ONE / 100,
            a0_ppm in 0u128..=300_000,
            a1_ppm in 0u128..=300_000,
        ) {
            let weights = [fp(weight), fp(ONE) - fp(weight)];
            let before = [fp(b0), fp(b1)];
            let after = [
                fp(b0) + fp(b0) * U256::from(a0_ppm) / U256::from(1_000_000u64),
                fp(b1) + fp(b1) * U256::from(a1_ppm) / U256::from(1_000_000u64),
            ];

            let inv_before = WeightedMath::calc_invariant(&weights, &before).unwrap();
            let inv_after = WeightedMath::calc_invariant(&weights, &after).unwrap();
            prop_assert!(inv_after >= inv_before);
        }
    }
}
