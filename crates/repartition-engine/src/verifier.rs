//! Consistency check of a distribution.
//!
//! Re-sums every computed amount and compares it with the total case amount.
//! The check only annotates: it never fails and never alters line items.
//!
//! `verified` depends on the non-positive net and the sum check alone.
//! Notices about an unattributed pool or a skipped rule are added to
//! `messages` either way, so a verified result may still carry messages
//! when the amounts involved stay within the tolerance.

use repartition_types::{Amount, DistributionResult, MAX_PURSUERS};

use crate::allocator::Allocation;

/// Largest accepted gap between the total and the sum of line items.
pub const DEFAULT_TOLERANCE: Amount = 10;

/// Message attached when allocation was refused.
pub const NON_POSITIVE_NET_MESSAGE: &str = "net amount to distribute must be positive";

/// Outcome of a consistency check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    pub verified: bool,
    pub messages: Vec<String>,
}

/// Check a fresh allocation.
pub fn verify(allocation: &Allocation, tolerance: Amount) -> Verification {
    if allocation.is_rejected() {
        return Verification {
            verified: false,
            messages: vec![NON_POSITIVE_NET_MESSAGE.to_string()],
        };
    }

    let sum = allocation
        .line_items
        .iter()
        .fold(0, |acc: Amount, item| acc.saturating_add(item.computed_amount));
    let mut verification = check_sum(allocation.total_amount, sum, tolerance);

    if let Some(pool) = allocation.unattributed_pool() {
        let reason = if allocation.roster_too_large() {
            format!(
                "the roster of {} pursuers exceeds the maximum of {MAX_PURSUERS}",
                allocation.headcount
            )
        } else {
            "the roster names no pursuer".to_string()
        };
        verification
            .messages
            .push(format!("pursuer pool of {pool} is not attributed: {reason}"));
    }
    for category in &allocation.skipped {
        verification
            .messages
            .push(format!("rule '{category}' not applied: eligibility conditions not met"));
    }

    verification
}

/// Re-check a result, e.g. one read back from history.
pub fn verify_result(result: &DistributionResult, tolerance: Amount) -> Verification {
    if result.net_amount <= 0 {
        return Verification {
            verified: false,
            messages: vec![NON_POSITIVE_NET_MESSAGE.to_string()],
        };
    }
    check_sum(result.total_amount, result.line_items_sum(), tolerance)
}

fn check_sum(total: Amount, sum: Amount, tolerance: Amount) -> Verification {
    let diff = total.abs_diff(sum);
    if diff > tolerance.unsigned_abs() {
        Verification {
            verified: false,
            messages: vec![format!(
                "distributed amounts differ from the total by {diff} (total {total}, distributed {sum}, tolerance {tolerance})"
            )],
        }
    } else {
        Verification {
            verified: true,
            messages: Vec::new(),
        }
    }
}
