//! Aggregate distribution output.

use serde::{Deserialize, Serialize};

use crate::beneficiary::{BeneficiaryCategory, BeneficiaryLineItem, DisplayGroup};
use crate::Amount;

/// Complete, auditable breakdown of one computation.
///
/// Built fresh by every computation and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct DistributionResult {
    /// Principal + fine + sale proceeds.
    #[ts(type = "number")]
    pub total_amount: Amount,
    /// Base the category percentages are applied to. May be non-positive.
    #[ts(type = "number")]
    pub net_amount: Amount,
    #[ts(type = "number")]
    pub levy_amount: Amount,
    /// Sorted by ascending priority.
    pub line_items: Vec<BeneficiaryLineItem>,
    /// Sum check within tolerance and a positive net.
    pub verified: bool,
    /// Human-readable discrepancy and failure messages. May hold notices
    /// (skipped rule, unattributed pool) on a verified result too.
    pub messages: Vec<String>,
}

/// Line items of one display group with their subtotal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct GroupSummary {
    pub group: DisplayGroup,
    pub title: String,
    pub items: Vec<BeneficiaryLineItem>,
    #[ts(type = "number")]
    pub subtotal: Amount,
}

impl DistributionResult {
    /// Sum of every computed amount.
    pub fn line_items_sum(&self) -> Amount {
        self.line_items
            .iter()
            .fold(0, |acc: Amount, item| acc.saturating_add(item.computed_amount))
    }

    /// Sum of the amounts attributed to `category`.
    pub fn amount_for(&self, category: BeneficiaryCategory) -> Amount {
        self.line_items
            .iter()
            .filter(|item| item.category == category)
            .fold(0, |acc: Amount, item| acc.saturating_add(item.computed_amount))
    }

    /// Total attributed to named pursuers.
    pub fn pursuer_total(&self) -> Amount {
        self.line_items
            .iter()
            .filter(|item| item.category.is_pursuer())
            .fold(0, |acc: Amount, item| acc.saturating_add(item.computed_amount))
    }

    /// Line items split into the four display groups, in display order.
    ///
    /// Empty groups are kept so renderers can print a stable layout.
    pub fn grouped(&self) -> Vec<GroupSummary> {
        DisplayGroup::ALL
            .into_iter()
            .map(|group| {
                let items: Vec<BeneficiaryLineItem> = self
                    .line_items
                    .iter()
                    .filter(|item| item.category.display_group() == group)
                    .cloned()
                    .collect();
                let subtotal = items
                    .iter()
                    .fold(0, |acc: Amount, item| acc.saturating_add(item.computed_amount));
                GroupSummary {
                    group,
                    title: group.title().to_string(),
                    items,
                    subtotal,
                }
            })
            .collect()
    }
}
