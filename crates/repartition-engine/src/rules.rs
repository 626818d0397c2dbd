//! Distribution rules.
//!
//! Percentages are held in basis points (1/100 of a percent) so the
//! allocation runs in integer arithmetic:
//!
//! | category            | base   |
//! |---------------------|--------|
//! | treasury            | 40 %   |
//! | mutual fund         | 10 %   |
//! | solidarity fund     | 8 %    |
//! | training fund       | 7 %    |
//! | equipment fund      | 5 %    |
//! | performance bonus   | 5 %    |
//! | pursuers            | 25 %   |
//!
//! The FSP levy is separate: 5 % of the principal below
//! [`DEFAULT_LEVY_THRESHOLD`], 4.5 % at or above it.
//!
//! The allocator only ever reads the *base* percentage. The maximum is a
//! ceiling checked by [`RuleSet::validate`] when an administrator changes a
//! rule.

use serde::{Deserialize, Serialize};

use repartition_types::{Amount, BeneficiaryCategory};

use crate::{Result, RuleError};

/// Basis points in 100 %.
pub const BP_SCALE: u32 = 10_000;

/// Principal at and above which the reduced levy rate applies.
pub const DEFAULT_LEVY_THRESHOLD: Amount = 500_000;

/// Levy rate below the threshold (5 %).
pub const DEFAULT_LEVY_RATE_BP: u32 = 500;

/// Levy rate at or above the threshold (4.5 %).
pub const DEFAULT_LEVY_REDUCED_RATE_BP: u32 = 450;

/// Convert basis points to a percentage value.
pub fn bp_to_percent(bp: u32) -> f64 {
    f64::from(bp) / 100.0
}

/// Convert a percentage value to basis points, rejecting anything outside
/// `[0, 100]`.
pub fn percent_to_bp(percent: f64) -> Result<u32> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(RuleError::PercentOutOfRange(percent));
    }
    Ok((percent * 100.0).round() as u32)
}

/// Rule keys, one per allocation bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Treasury,
    MutualFund,
    SolidarityFund,
    TrainingFund,
    EquipmentFund,
    PerformanceBonus,
    /// Pool shared by seizing agents, chiefs and informants.
    Pursuers,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 7] = [
        Self::Treasury,
        Self::MutualFund,
        Self::SolidarityFund,
        Self::TrainingFund,
        Self::EquipmentFund,
        Self::PerformanceBonus,
        Self::Pursuers,
    ];

    /// The six categories that produce exactly one line item each.
    pub const FIXED: [RuleCategory; 6] = [
        Self::Treasury,
        Self::MutualFund,
        Self::SolidarityFund,
        Self::TrainingFund,
        Self::EquipmentFund,
        Self::PerformanceBonus,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Treasury => "treasury",
            Self::MutualFund => "mutual_fund",
            Self::SolidarityFund => "solidarity_fund",
            Self::TrainingFund => "training_fund",
            Self::EquipmentFund => "equipment_fund",
            Self::PerformanceBonus => "performance_bonus",
            Self::Pursuers => "pursuers",
        }
    }

    /// Parse a rule key.
    ///
    /// # Errors
    ///
    /// - [`RuleError::UnknownCategory`] for anything outside the closed set
    pub fn from_key(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| RuleError::UnknownCategory(key.to_string()))
    }

    /// Line-item category for fixed rules; `None` for the pursuer pool.
    pub fn beneficiary(self) -> Option<BeneficiaryCategory> {
        match self {
            Self::Treasury => Some(BeneficiaryCategory::Treasury),
            Self::MutualFund => Some(BeneficiaryCategory::MutualFund),
            Self::SolidarityFund => Some(BeneficiaryCategory::SolidarityFund),
            Self::TrainingFund => Some(BeneficiaryCategory::TrainingFund),
            Self::EquipmentFund => Some(BeneficiaryCategory::EquipmentFund),
            Self::PerformanceBonus => Some(BeneficiaryCategory::PerformanceBonus),
            Self::Pursuers => None,
        }
    }

    fn default_base_bp(self) -> u32 {
        match self {
            Self::Treasury => 4_000,
            Self::MutualFund => 1_000,
            Self::SolidarityFund => 800,
            Self::TrainingFund => 700,
            Self::EquipmentFund => 500,
            Self::PerformanceBonus => 500,
            Self::Pursuers => 2_500,
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Optional eligibility conditions of a rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    /// Minimum net amount for the rule to apply.
    #[serde(default)]
    pub min_amount: Option<Amount>,
    /// Maximum net amount for the rule to apply.
    #[serde(default)]
    pub max_amount: Option<Amount>,
    /// Minimum number of pursuers on the roster.
    #[serde(default)]
    pub min_headcount: Option<u32>,
}

impl RuleConditions {
    pub fn is_empty(&self) -> bool {
        self.min_amount.is_none() && self.max_amount.is_none() && self.min_headcount.is_none()
    }

    /// Whether a case with this net amount and pursuer headcount qualifies.
    pub fn is_met(&self, net: Amount, headcount: u64) -> bool {
        self.min_amount.map_or(true, |min| net >= min)
            && self.max_amount.map_or(true, |max| net <= max)
            && self
                .min_headcount
                .map_or(true, |min| headcount >= u64::from(min))
    }
}

/// Percentage rule for one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRule {
    pub category: RuleCategory,
    /// Percentage of the net amount actually allocated.
    pub base_bp: u32,
    /// Administrative ceiling for `base_bp`.
    pub max_bp: u32,
    #[serde(default)]
    pub conditions: RuleConditions,
}

impl DistributionRule {
    /// Rule with `base_bp` and a ceiling of the same value.
    pub fn new(category: RuleCategory, base_bp: u32) -> Self {
        Self {
            category,
            base_bp,
            max_bp: base_bp,
            conditions: RuleConditions::default(),
        }
    }

    pub fn with_max(mut self, max_bp: u32) -> Self {
        self.max_bp = max_bp;
        self
    }

    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Base percentage as a float, e.g. `40.0`.
    pub fn base_percent(&self) -> f64 {
        bp_to_percent(self.base_bp)
    }

    fn validate(&self) -> Result<()> {
        if self.max_bp > BP_SCALE {
            return Err(RuleError::PercentOutOfRange(bp_to_percent(self.max_bp)));
        }
        if self.base_bp > self.max_bp {
            return Err(RuleError::AboveMaximum {
                category: self.category,
                base_bp: self.base_bp,
                max_bp: self.max_bp,
            });
        }
        if let (Some(min), Some(max)) = (self.conditions.min_amount, self.conditions.max_amount) {
            if min > max {
                return Err(RuleError::InvalidCondition {
                    category: self.category,
                    reason: format!("min_amount {min} is greater than max_amount {max}"),
                });
            }
        }
        Ok(())
    }
}

/// Tiered FSP levy assessed on the principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevyRule {
    /// Principal at and above which `reduced_rate_bp` applies.
    pub threshold: Amount,
    pub rate_bp: u32,
    pub reduced_rate_bp: u32,
}

impl Default for LevyRule {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_LEVY_THRESHOLD,
            rate_bp: DEFAULT_LEVY_RATE_BP,
            reduced_rate_bp: DEFAULT_LEVY_REDUCED_RATE_BP,
        }
    }
}

impl LevyRule {
    /// Rate applicable to `principal`. Hard tier, not a sliding scale.
    pub fn rate_for(&self, principal: Amount) -> u32 {
        if principal < self.threshold {
            self.rate_bp
        } else {
            self.reduced_rate_bp
        }
    }

    fn validate(&self) -> Result<()> {
        for bp in [self.rate_bp, self.reduced_rate_bp] {
            if bp > BP_SCALE {
                return Err(RuleError::PercentOutOfRange(bp_to_percent(bp)));
            }
        }
        if self.threshold < 0 {
            return Err(RuleError::InvalidLevy(format!(
                "threshold must not be negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Snapshot of every rule used by one computation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<DistributionRule>,
    #[serde(default)]
    pub levy: LevyRule,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: RuleCategory::ALL
                .into_iter()
                .map(|c| DistributionRule::new(c, c.default_base_bp()))
                .collect(),
            levy: LevyRule::default(),
        }
    }
}

impl RuleSet {
    /// Rule for `category`, if the set has one.
    pub fn rule(&self, category: RuleCategory) -> Option<&DistributionRule> {
        self.rules.iter().find(|r| r.category == category)
    }

    /// Sum of the base percentages of every rule, in basis points.
    pub fn total_base_bp(&self) -> u32 {
        self.rules.iter().map(|r| r.base_bp).sum()
    }

    /// Check the set before it is stored or used.
    ///
    /// # Errors
    ///
    /// - [`RuleError::MissingRule`] / [`RuleError::DuplicateRule`] unless every
    ///   category appears exactly once
    /// - [`RuleError::AboveMaximum`] if a base exceeds its ceiling
    /// - [`RuleError::PercentOutOfRange`] for percentages above 100
    /// - [`RuleError::TotalExceeded`] if the bases sum to more than 100 %
    /// - [`RuleError::InvalidCondition`] / [`RuleError::InvalidLevy`]
    pub fn validate(&self) -> Result<()> {
        for category in RuleCategory::ALL {
            match self.rules.iter().filter(|r| r.category == category).count() {
                0 => return Err(RuleError::MissingRule(category)),
                1 => {}
                _ => return Err(RuleError::DuplicateRule(category)),
            }
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        let total = self.total_base_bp();
        if total > BP_SCALE {
            return Err(RuleError::TotalExceeded { total_bp: total });
        }
        self.levy.validate()
    }

    /// Copy of the set with one base percentage changed, validated.
    ///
    /// # Errors
    ///
    /// Any error from [`RuleSet::validate`] on the updated set.
    pub fn with_base(&self, category: RuleCategory, base_bp: u32) -> Result<RuleSet> {
        self.with_percentages(category, base_bp, None)
    }

    /// Copy of the set with the base, and optionally the ceiling, of one
    /// rule changed. Both are applied before validation, so a base may be
    /// raised together with its ceiling.
    ///
    /// # Errors
    ///
    /// Any error from [`RuleSet::validate`] on the updated set.
    pub fn with_percentages(
        &self,
        category: RuleCategory,
        base_bp: u32,
        max_bp: Option<u32>,
    ) -> Result<RuleSet> {
        let mut updated = self.clone();
        let rule = updated
            .rules
            .iter_mut()
            .find(|r| r.category == category)
            .ok_or(RuleError::MissingRule(category))?;
        rule.base_bp = base_bp;
        if let Some(max_bp) = max_bp {
            rule.max_bp = max_bp;
        }
        updated.validate()?;

        tracing::info!(
            category = %category,
            base_bp,
            max_bp = ?max_bp,
            total_bp = updated.total_base_bp(),
            "distribution rule updated"
        );

        Ok(updated)
    }
}
