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

/// Protocol-fee amounts expressed in pool shares.
pub struct ExternalFees;

impl ExternalFees {
    /// Shares to mint so the recipient ends up owning
    /// `pool_ownership_percentage` of the enlarged supply.
    ///
    /// Minting `bpt` grants `bpt / (total_supply + bpt)` of the pool; solving
    /// for `bpt` gives `total_supply * pct / (1 - pct)`, floored. A percentage
    /// of one or more has no finite solution.
    pub fn bpt_for_pool_ownership_percentage(
        total_supply: U256,
        pool_ownership_percentage: U256,
    ) -> Result<U256> {
        Math::mul_div(
            total_supply,
            pool_ownership_percentage,
            FixedPoint::complement(pool_ownership_percentage),
        )
    }
}
