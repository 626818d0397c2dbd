//! FSP levy and net distributable amount.
//!
//! Rounding is half-up (`floor(x + 0.5)`) and happens exactly once per
//! output value, on the exact integer product. Nothing here fails: zero or
//! negative nets are valid results that the allocator reacts to.

use repartition_types::{Amount, CaseAmounts};

use crate::rules::{LevyRule, BP_SCALE};

/// `round(amount × bp / 10 000)`, half-up.
pub fn apply_bp(amount: Amount, bp: u32) -> Amount {
    let scale = i128::from(BP_SCALE);
    let scaled = i128::from(amount) * i128::from(bp) + scale / 2;
    saturate(scaled.div_euclid(scale))
}

/// `round(numerator / denominator)`, half-up. `denominator` must be positive;
/// zero yields zero.
pub fn div_round(numerator: Amount, denominator: u64) -> Amount {
    if denominator == 0 {
        return 0;
    }
    let den = i128::from(denominator);
    saturate((2 * i128::from(numerator) + den).div_euclid(2 * den))
}

fn saturate(value: i128) -> Amount {
    Amount::try_from(value).unwrap_or(if value < 0 { Amount::MIN } else { Amount::MAX })
}

/// Levy on `principal` under the default tiered rule.
pub fn compute_levy(principal: Amount) -> Amount {
    LevyRule::default().levy(principal)
}

/// Net amount under the default levy rule.
pub fn compute_net(principal: Amount, fine: Amount, sale: Amount, misc_fees: Amount) -> Amount {
    net_amount(
        &CaseAmounts {
            principal,
            fine,
            sale,
            misc_fees,
        },
        &LevyRule::default(),
    )
}

/// `(principal + fine + sale) − levy(principal) − misc_fees`.
pub fn net_amount(amounts: &CaseAmounts, levy_rule: &LevyRule) -> Amount {
    let total = i128::from(amounts.principal) + i128::from(amounts.fine) + i128::from(amounts.sale);
    let levy = i128::from(levy_rule.levy(amounts.principal));
    saturate(total - levy - i128::from(amounts.misc_fees))
}

impl LevyRule {
    /// `round(principal × rate)` with the tier picked from `principal`.
    pub fn levy(&self, principal: Amount) -> Amount {
        apply_bp(principal, self.rate_for(principal))
    }
}
