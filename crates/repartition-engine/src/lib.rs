//! # repartition-engine
//!
//! Proceeds distribution engine for litigation cases.
//!
//! Given the amounts of a case, the roster of pursuers and a rule snapshot,
//! the engine computes the FSP levy, the net amount to distribute, one line
//! item per beneficiary and a consistency verdict. The computation is pure:
//! no I/O, no shared state, safe to call from any number of threads.
//!
//! ## Modules
//!
//! - [`rules`]: Rule set, levy tiers, validation of administrative changes
//! - [`fees`]: Levy and net amount
//! - [`allocator`]: Line items and the pursuer split
//! - [`verifier`]: Re-summing and drift reporting

pub mod allocator;
pub mod fees;
pub mod rules;
pub mod verifier;

use repartition_types::{Amount, BeneficiaryRoster, CaseAmounts, DistributionResult};

pub use allocator::{allocate, Allocation};
pub use fees::{compute_levy, compute_net};
pub use rules::{DistributionRule, LevyRule, RuleCategory, RuleConditions, RuleSet};
pub use verifier::{verify, Verification, DEFAULT_TOLERANCE, NON_POSITIVE_NET_MESSAGE};

/// Error types for rule handling.
///
/// Business outcomes of a computation (non-positive net, rounding drift)
/// are never errors; they are reported in [`DistributionResult`].
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A percentage lies outside `[0, 100]`.
    #[error("percentage out of range [0, 100]: {0}")]
    PercentOutOfRange(f64),

    /// A base percentage exceeds its administrative ceiling.
    #[error("{category}: base {base_bp} bp exceeds maximum {max_bp} bp")]
    AboveMaximum {
        /// The offending rule.
        category: RuleCategory,
        /// Requested base in basis points.
        base_bp: u32,
        /// Ceiling in basis points.
        max_bp: u32,
    },

    /// Base percentages sum to more than 100 %.
    #[error("rule percentages sum to {total_bp} bp, more than 10000")]
    TotalExceeded {
        /// The actual total.
        total_bp: u32,
    },

    /// A category has no rule.
    #[error("no rule for category '{0}'")]
    MissingRule(RuleCategory),

    /// A category has more than one rule.
    #[error("more than one rule for category '{0}'")]
    DuplicateRule(RuleCategory),

    /// A rule key outside the closed category set.
    #[error("unknown rule category '{0}'")]
    UnknownCategory(String),

    /// Inconsistent eligibility conditions.
    #[error("{category}: invalid condition: {reason}")]
    InvalidCondition {
        /// The offending rule.
        category: RuleCategory,
        /// What is wrong.
        reason: String,
    },

    /// Invalid levy tier configuration.
    #[error("invalid levy rule: {0}")]
    InvalidLevy(String),

    /// The rule source could not produce a rule set.
    #[error("rule source unavailable: {0}")]
    Source(String),
}

/// Convenience result type for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Supplier of the currently active rule set.
///
/// Implemented by [`RuleSet`] itself for fixed snapshots and by persistent
/// stores. The engine reads it once per computation.
pub trait RuleSource {
    /// Snapshot of the active rules.
    ///
    /// # Errors
    ///
    /// [`RuleError::Source`] when the backing store cannot be read.
    fn active_rules(&self) -> Result<RuleSet>;
}

impl RuleSource for RuleSet {
    fn active_rules(&self) -> Result<RuleSet> {
        Ok(self.clone())
    }
}

impl<S: RuleSource + ?Sized> RuleSource for &S {
    fn active_rules(&self) -> Result<RuleSet> {
        (**self).active_rules()
    }
}

/// Compute a distribution.
///
/// `rules` defaults to the built-in rule set. Never fails: every business
/// outcome is expressed through [`DistributionResult::verified`] and
/// [`DistributionResult::messages`].
pub fn compute_distribution(
    amounts: &CaseAmounts,
    roster: &BeneficiaryRoster,
    rules: Option<&RuleSet>,
) -> DistributionResult {
    match rules {
        Some(rules) => compute_with(amounts, roster, rules, DEFAULT_TOLERANCE),
        None => compute_with(amounts, roster, &RuleSet::default(), DEFAULT_TOLERANCE),
    }
}

/// Compute a distribution with an explicit verification tolerance.
pub fn compute_with(
    amounts: &CaseAmounts,
    roster: &BeneficiaryRoster,
    rules: &RuleSet,
    tolerance: Amount,
) -> DistributionResult {
    let allocation = allocate(amounts, roster, rules);
    let verification = verify(&allocation, tolerance);

    if verification.verified {
        tracing::debug!(
            total = allocation.total_amount,
            net = allocation.net_amount,
            levy = allocation.levy_amount,
            items = allocation.line_items.len(),
            "distribution computed"
        );
    } else {
        tracing::warn!(
            total = allocation.total_amount,
            net = allocation.net_amount,
            messages = ?verification.messages,
            "distribution not verified"
        );
    }

    DistributionResult {
        total_amount: allocation.total_amount,
        net_amount: allocation.net_amount,
        levy_amount: allocation.levy_amount,
        line_items: allocation.line_items,
        verified: verification.verified,
        messages: verification.messages,
    }
}

/// Engine bound to a rule source.
///
/// The rule snapshot is read once per call; the computation itself is
/// [`compute_with`].
#[derive(Clone, Debug)]
pub struct Engine<S> {
    source: S,
    tolerance: Amount,
}

impl<S: RuleSource> Engine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Amount) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> Amount {
        self.tolerance
    }

    /// Compute a distribution under the active rules.
    ///
    /// # Errors
    ///
    /// Only when the rule source fails or hands out an invalid rule set.
    pub fn compute(
        &self,
        amounts: &CaseAmounts,
        roster: &BeneficiaryRoster,
    ) -> Result<DistributionResult> {
        let rules = self.source.active_rules()?;
        rules.validate()?;
        Ok(compute_with(amounts, roster, &rules, self.tolerance))
    }
}
