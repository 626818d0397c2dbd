//! # repartition-types
//!
//! Shared domain types for the proceeds distribution workspace: case
//! amounts, the pursuer roster, beneficiary categories, line items and the
//! aggregate distribution result.

pub mod beneficiary;
pub mod case;
pub mod result;

pub use beneficiary::{BeneficiaryCategory, BeneficiaryLineItem, DisplayGroup};
pub use case::{BeneficiaryRoster, CaseAmounts, PursuerGroup, MAX_PURSUERS};
pub use result::{DistributionResult, GroupSummary};

/// Currency amount in whole currency units.
pub type Amount = i64;

/// Upper bound accepted for any single input amount at the input boundary.
///
/// Keeps every intermediate product of the engine far away from `i64`
/// overflow.
pub const MAX_INPUT_AMOUNT: Amount = 1_000_000_000_000_000;

/// Errors raised at the input boundary, before a computation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// A monetary input is negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: Amount,
    },

    /// The principal case amount is zero.
    #[error("principal amount must be greater than zero")]
    ZeroPrincipal,

    /// A monetary input exceeds [`MAX_INPUT_AMOUNT`].
    #[error("{field} exceeds the maximum accepted amount ({value} > {MAX_INPUT_AMOUNT})")]
    AmountTooLarge {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: Amount,
    },

    /// The roster declares more pursuers than [`MAX_PURSUERS`].
    #[error("roster of {headcount} pursuers exceeds the maximum of {MAX_PURSUERS}")]
    TooManyPursuers {
        /// Declared headcount across the three groups.
        headcount: u64,
    },

    /// A roster name list carries more names than its declared count.
    #[error("{group}: {names} names given for a count of {count}")]
    InvalidRosterShape {
        /// Pursuer group label.
        group: &'static str,
        /// Declared count.
        count: u32,
        /// Number of names supplied.
        names: usize,
    },
}

/// Convenience result type for input validation.
pub type Result<T> = std::result::Result<T, InputError>;
