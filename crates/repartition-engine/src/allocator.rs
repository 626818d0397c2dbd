//! Allocation of the net amount into beneficiary line items.
//!
//! Each fixed category gets `round(net × base)`. The pursuer pool
//! `round(net × 25 %)` is split into equal rounded per-head shares; the
//! remainder of that split is never redistributed, the drift is left for
//! the verifier to report.
//!
//! A roster above [`MAX_PURSUERS`] is never expanded into line items: its
//! pool stays unattributed, like that of an empty roster.

use repartition_types::{
    Amount, BeneficiaryCategory, BeneficiaryLineItem, BeneficiaryRoster, CaseAmounts, PursuerGroup,
    MAX_PURSUERS,
};

use crate::fees::{apply_bp, div_round, net_amount};
use crate::rules::{RuleCategory, RuleSet};

/// Raw allocator output, before verification.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
    pub total_amount: Amount,
    pub net_amount: Amount,
    pub levy_amount: Amount,
    /// Sorted by ascending priority. Empty when the net is not positive.
    pub line_items: Vec<BeneficiaryLineItem>,
    /// `round(net × pursuers base)`, zero when the pursuer rule did not apply.
    pub pursuer_pool: Amount,
    /// Pursuers sharing the pool.
    pub headcount: u64,
    /// Rules whose eligibility conditions the case did not meet.
    pub skipped: Vec<RuleCategory>,
}

impl Allocation {
    /// Whether allocation stopped because the net amount is not positive.
    pub fn is_rejected(&self) -> bool {
        self.net_amount <= 0
    }

    /// Whether the roster is too large to be split into line items.
    pub fn roster_too_large(&self) -> bool {
        self.headcount > u64::from(MAX_PURSUERS)
    }

    /// Pool amount that no line item carries, because the roster is empty
    /// or too large.
    pub fn unattributed_pool(&self) -> Option<Amount> {
        let unsplit = self.headcount == 0 || self.roster_too_large();
        (unsplit && self.pursuer_pool > 0).then_some(self.pursuer_pool)
    }
}

/// Allocate a case under `rules`.
///
/// Never fails. A non-positive net yields an [`Allocation`] without line
/// items.
pub fn allocate(amounts: &CaseAmounts, roster: &BeneficiaryRoster, rules: &RuleSet) -> Allocation {
    let total_amount = amounts.total();
    let levy_amount = rules.levy.levy(amounts.principal);
    let net_amount = net_amount(amounts, &rules.levy);
    let headcount = roster.headcount();

    let mut allocation = Allocation {
        total_amount,
        net_amount,
        levy_amount,
        line_items: Vec::new(),
        pursuer_pool: 0,
        headcount,
        skipped: Vec::new(),
    };

    if net_amount <= 0 {
        return allocation;
    }

    let split_heads = if allocation.roster_too_large() { 0 } else { headcount };
    let mut items = Vec::with_capacity(7 + usize::try_from(split_heads).unwrap_or(0));

    let levy_pct = if total_amount > 0 {
        levy_amount as f64 / total_amount as f64 * 100.0
    } else {
        0.0
    };
    items.push(BeneficiaryLineItem::fixed(
        BeneficiaryCategory::Levy,
        levy_pct,
        levy_amount,
    ));

    for category in RuleCategory::FIXED {
        let (Some(rule), Some(beneficiary)) = (rules.rule(category), category.beneficiary()) else {
            allocation.skipped.push(category);
            continue;
        };
        if !rule.conditions.is_met(net_amount, headcount) {
            allocation.skipped.push(category);
            continue;
        }
        items.push(BeneficiaryLineItem::fixed(
            beneficiary,
            rule.base_percent(),
            apply_bp(net_amount, rule.base_bp),
        ));
    }

    match rules.rule(RuleCategory::Pursuers) {
        Some(rule) if rule.conditions.is_met(net_amount, headcount) => {
            allocation.pursuer_pool = apply_bp(net_amount, rule.base_bp);
        }
        _ => allocation.skipped.push(RuleCategory::Pursuers),
    }

    if split_heads > 0 && allocation.pursuer_pool > 0 {
        let per_head = div_round(allocation.pursuer_pool, headcount);
        let pct = per_head as f64 / net_amount as f64 * 100.0;
        push_pursuers(&mut items, BeneficiaryCategory::SeizingAgent, &roster.agents, pct, per_head);
        push_pursuers(&mut items, BeneficiaryCategory::Chief, &roster.chiefs, pct, per_head);
        push_pursuers(&mut items, BeneficiaryCategory::Informant, &roster.informants, pct, per_head);
    }

    // Stable: pursuers keep roster order within their group.
    items.sort_by_key(|item| item.priority);
    allocation.line_items = items;
    allocation
}

fn push_pursuers(
    items: &mut Vec<BeneficiaryLineItem>,
    category: BeneficiaryCategory,
    group: &PursuerGroup,
    percentage: f64,
    per_head: Amount,
) {
    for index in 0..group.count as usize {
        items.push(BeneficiaryLineItem::pursuer(
            category,
            index,
            group.name_at(index),
            percentage,
            per_head,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{DistributionRule, RuleConditions};

    fn roster(agents: &[&str], chiefs: &[&str], informants: u32) -> BeneficiaryRoster {
        BeneficiaryRoster {
            agents: PursuerGroup::named(agents.iter().copied()),
            chiefs: PursuerGroup::named(chiefs.iter().copied()),
            informants: PursuerGroup::anonymous(informants),
        }
    }

    fn amount_of(allocation: &Allocation, id: &str) -> Option<Amount> {
        allocation
            .line_items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.computed_amount)
    }

    #[test]
    fn test_reference_case() {
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &roster(&["A"], &["B"], 0),
            &RuleSet::default(),
        );
        assert_eq!(allocation.levy_amount, 27_000);
        assert_eq!(allocation.net_amount, 573_000);
        assert_eq!(amount_of(&allocation, "fsp"), Some(27_000));
        assert_eq!(amount_of(&allocation, "tresor"), Some(229_200));
        assert_eq!(amount_of(&allocation, "mutuelle"), Some(57_300));
        assert_eq!(amount_of(&allocation, "fonds_solidarite"), Some(45_840));
        assert_eq!(amount_of(&allocation, "fonds_formation"), Some(40_110));
        assert_eq!(amount_of(&allocation, "fonds_equipement"), Some(28_650));
        assert_eq!(amount_of(&allocation, "prime_rendement"), Some(28_650));
        assert_eq!(allocation.pursuer_pool, 143_250);
        assert_eq!(amount_of(&allocation, "saisissant_0"), Some(71_625));
        assert_eq!(amount_of(&allocation, "chef_0"), Some(71_625));
        assert_eq!(allocation.line_items.len(), 9);

        let names: Vec<&str> = allocation.line_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(&names[7..], &["A", "B"]);
    }

    #[test]
    fn test_percentages() {
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &roster(&["A"], &["B"], 0),
            &RuleSet::default(),
        );
        let pct = |id: &str| {
            allocation
                .line_items
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.percentage)
                .unwrap_or(f64::NAN)
        };
        // Levy relative to the total, not the net.
        assert!((pct("fsp") - 4.5).abs() < 1e-9);
        // Nominal rule percentage, not recomputed from the rounded amount.
        assert!((pct("tresor") - 40.0).abs() < 1e-9);
        assert!((pct("fonds_formation") - 7.0).abs() < 1e-9);
        assert!((pct("saisissant_0") - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_by_priority() {
        let allocation = allocate(
            &CaseAmounts::principal(1_000_000),
            &roster(&["A1", "A2"], &["C1"], 2),
            &RuleSet::default(),
        );
        let priorities: Vec<u8> = allocation.line_items.iter().map(|i| i.priority).collect();
        assert_eq!(priorities, vec![0, 1, 2, 3, 4, 5, 6, 7, 7, 8, 9, 9]);
        let ids: Vec<&str> = allocation.line_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(&ids[7..], &["saisissant_0", "saisissant_1", "chef_0", "informateur_0", "informateur_1"]);
    }

    #[test]
    fn test_fixed_sum_plus_pool_close_to_net() {
        for principal in [1, 37, 999, 12_345, 499_999, 500_000, 777_777, 10_000_001] {
            let allocation = allocate(
                &CaseAmounts {
                    principal,
                    fine: principal / 3,
                    sale: 17,
                    misc_fees: 0,
                },
                &BeneficiaryRoster::default(),
                &RuleSet::default(),
            );
            if allocation.is_rejected() {
                continue;
            }
            let fixed: Amount = allocation
                .line_items
                .iter()
                .filter(|i| i.category != BeneficiaryCategory::Levy)
                .map(|i| i.computed_amount)
                .sum();
            let drift = (fixed + allocation.pursuer_pool - allocation.net_amount).abs();
            assert!(drift <= 6, "principal {principal}: drift {drift}");
        }
    }

    #[test]
    fn test_zero_pursuers() {
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &BeneficiaryRoster::default(),
            &RuleSet::default(),
        );
        assert!(allocation.line_items.iter().all(|i| !i.category.is_pursuer()));
        assert_eq!(allocation.line_items.len(), 7);
        assert_eq!(allocation.pursuer_pool, 143_250);
        assert_eq!(allocation.unattributed_pool(), Some(143_250));
    }

    #[test]
    fn test_equal_split_with_remainder() {
        // net 400 → pool round(400 × 25 %) = 100
        let mut rules = RuleSet::default();
        rules.levy.rate_bp = 0;
        let allocation = allocate(
            &CaseAmounts::principal(400),
            &BeneficiaryRoster {
                agents: PursuerGroup::anonymous(3),
                ..BeneficiaryRoster::default()
            },
            &rules,
        );
        assert_eq!(allocation.pursuer_pool, 100);
        let agents: Vec<Amount> = allocation
            .line_items
            .iter()
            .filter(|i| i.category == BeneficiaryCategory::SeizingAgent)
            .map(|i| i.computed_amount)
            .collect();
        assert_eq!(agents, vec![33, 33, 33]);
        assert_eq!(agents.iter().sum::<Amount>(), 99);
    }

    #[test]
    fn test_placeholder_names() {
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &BeneficiaryRoster {
                agents: PursuerGroup {
                    count: 2,
                    names: vec![String::new()],
                },
                informants: PursuerGroup::anonymous(1),
                ..BeneficiaryRoster::default()
            },
            &RuleSet::default(),
        );
        let names: Vec<&str> = allocation
            .line_items
            .iter()
            .filter(|i| i.category.is_pursuer())
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Saisissant 1", "Saisissant 2", "Informateur 1"]);
    }

    #[test]
    fn test_non_positive_net_stops() {
        let allocation = allocate(
            &CaseAmounts {
                principal: 100,
                misc_fees: 1000,
                ..CaseAmounts::default()
            },
            &roster(&["A"], &[], 0),
            &RuleSet::default(),
        );
        assert!(allocation.is_rejected());
        assert!(allocation.line_items.is_empty());
        assert_eq!(allocation.levy_amount, 5);
        assert_eq!(allocation.net_amount, -905);
    }

    #[test]
    fn test_amounts_never_negative() {
        let allocation = allocate(
            &CaseAmounts {
                principal: 3,
                fine: 1,
                ..CaseAmounts::default()
            },
            &roster(&["A", "B", "C"], &["D"], 5),
            &RuleSet::default(),
        );
        assert!(!allocation.is_rejected());
        assert!(allocation.line_items.iter().all(|i| i.computed_amount >= 0));
    }

    #[test]
    fn test_unmet_condition_skips_rule() {
        let mut rules = RuleSet::default();
        rules.rules.retain(|r| r.category != RuleCategory::PerformanceBonus);
        rules.rules.push(
            DistributionRule::new(RuleCategory::PerformanceBonus, 500).with_conditions(RuleConditions {
                min_amount: Some(1_000_000),
                ..RuleConditions::default()
            }),
        );
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &roster(&["A"], &[], 0),
            &rules,
        );
        assert_eq!(allocation.skipped, vec![RuleCategory::PerformanceBonus]);
        assert_eq!(amount_of(&allocation, "prime_rendement"), None);
        assert_eq!(amount_of(&allocation, "tresor"), Some(229_200));
    }

    #[test]
    fn test_pursuer_headcount_condition() {
        let mut rules = RuleSet::default();
        rules.rules.retain(|r| r.category != RuleCategory::Pursuers);
        rules.rules.push(
            DistributionRule::new(RuleCategory::Pursuers, 2_500).with_conditions(RuleConditions {
                min_headcount: Some(2),
                ..RuleConditions::default()
            }),
        );
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &roster(&["A"], &[], 0),
            &rules,
        );
        assert_eq!(allocation.pursuer_pool, 0);
        assert_eq!(allocation.skipped, vec![RuleCategory::Pursuers]);
        assert!(allocation.line_items.iter().all(|i| !i.category.is_pursuer()));
    }

    #[test]
    fn test_oversized_roster_not_expanded() {
        let huge = BeneficiaryRoster {
            agents: PursuerGroup::anonymous(u32::MAX),
            chiefs: PursuerGroup::anonymous(u32::MAX),
            informants: PursuerGroup::anonymous(u32::MAX),
        };
        let allocation = allocate(&CaseAmounts::principal(600_000), &huge, &RuleSet::default());
        assert!(allocation.roster_too_large());
        assert_eq!(allocation.line_items.len(), 7);
        assert!(allocation.line_items.iter().all(|i| !i.category.is_pursuer()));
        assert_eq!(allocation.unattributed_pool(), Some(143_250));
    }

    #[test]
    fn test_roster_at_limit_expanded() {
        let allocation = allocate(
            &CaseAmounts::principal(600_000),
            &BeneficiaryRoster {
                informants: PursuerGroup::anonymous(MAX_PURSUERS),
                ..BeneficiaryRoster::default()
            },
            &RuleSet::default(),
        );
        assert!(!allocation.roster_too_large());
        assert_eq!(allocation.line_items.len(), 7 + MAX_PURSUERS as usize);
        assert_eq!(allocation.unattributed_pool(), None);
    }

    #[test]
    fn test_zero_net_stops() {
        // levy round(1000 × 5 %) = 50, net 1000 − 50 − 950 = 0
        let allocation = allocate(
            &CaseAmounts {
                principal: 1_000,
                misc_fees: 950,
                ..CaseAmounts::default()
            },
            &roster(&["A"], &[], 0),
            &RuleSet::default(),
        );
        assert_eq!(allocation.levy_amount, 50);
        assert_eq!(allocation.net_amount, 0);
        assert!(allocation.is_rejected());
        assert!(allocation.line_items.is_empty());
    }
}
