//! Engine inputs: case amounts and the pursuer roster.

use serde::{Deserialize, Serialize};

use crate::{Amount, InputError, Result, MAX_INPUT_AMOUNT};

/// Monetary inputs of a case, in whole currency units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct CaseAmounts {
    /// Principal case amount. The FSP levy is assessed on this figure only.
    #[ts(type = "number")]
    pub principal: Amount,
    #[serde(default)]
    #[ts(type = "number")]
    pub fine: Amount,
    /// Proceeds from the sale of seized goods.
    #[serde(default)]
    #[ts(type = "number")]
    pub sale: Amount,
    /// Miscellaneous costs deducted before distribution.
    #[serde(default)]
    #[ts(type = "number")]
    pub misc_fees: Amount,
}

impl CaseAmounts {
    /// Amounts with only a principal set.
    pub fn principal(principal: Amount) -> Self {
        Self {
            principal,
            ..Self::default()
        }
    }

    /// Principal + fine + sale proceeds.
    pub fn total(&self) -> Amount {
        self.principal
            .saturating_add(self.fine)
            .saturating_add(self.sale)
    }

    /// Reject amounts the engine must never see.
    ///
    /// # Errors
    ///
    /// - [`InputError::NegativeAmount`] for any negative field
    /// - [`InputError::AmountTooLarge`] for any field above [`MAX_INPUT_AMOUNT`]
    /// - [`InputError::ZeroPrincipal`] if the principal is zero
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("principal", self.principal),
            ("fine", self.fine),
            ("sale", self.sale),
            ("misc_fees", self.misc_fees),
        ];
        for (field, value) in fields {
            if value < 0 {
                return Err(InputError::NegativeAmount { field, value });
            }
            if value > MAX_INPUT_AMOUNT {
                return Err(InputError::AmountTooLarge { field, value });
            }
        }
        if self.principal == 0 {
            return Err(InputError::ZeroPrincipal);
        }
        Ok(())
    }
}

/// Largest pursuer headcount accepted on a roster, all groups together.
pub const MAX_PURSUERS: u32 = 10_000;

/// One pursuer group: a headcount plus the names known for it.
///
/// The name list is independent of the count. Missing or empty names are
/// replaced by a positional label when line items are produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PursuerGroup {
    pub count: u32,
    #[serde(default)]
    pub names: Vec<String>,
}

impl PursuerGroup {
    /// A group whose count is the number of names given.
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self {
            count: u32::try_from(names.len()).unwrap_or(u32::MAX),
            names,
        }
    }

    /// A group of `count` anonymous pursuers.
    pub fn anonymous(count: u32) -> Self {
        Self {
            count,
            names: Vec::new(),
        }
    }

    /// Display name of the pursuer at `index`, if one was supplied and is
    /// not blank.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names
            .get(index)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
    }
}

/// Named individuals sharing the pursuer pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct BeneficiaryRoster {
    /// Seizing agents.
    #[serde(default)]
    pub agents: PursuerGroup,
    #[serde(default)]
    pub chiefs: PursuerGroup,
    #[serde(default)]
    pub informants: PursuerGroup,
}

impl BeneficiaryRoster {
    /// Total number of pursuers across the three groups.
    pub fn headcount(&self) -> u64 {
        u64::from(self.agents.count) + u64::from(self.chiefs.count) + u64::from(self.informants.count)
    }

    /// Reject name lists longer than their declared count and rosters
    /// above [`MAX_PURSUERS`].
    ///
    /// # Errors
    ///
    /// - [`InputError::InvalidRosterShape`] naming the first offending group
    /// - [`InputError::TooManyPursuers`] if the total headcount is too large
    pub fn validate(&self) -> Result<()> {
        let groups = [
            ("agents", &self.agents),
            ("chiefs", &self.chiefs),
            ("informants", &self.informants),
        ];
        for (group, g) in groups {
            if g.names.len() > g.count as usize {
                return Err(InputError::InvalidRosterShape {
                    group,
                    count: g.count,
                    names: g.names.len(),
                });
            }
        }
        let headcount = self.headcount();
        if headcount > u64::from(MAX_PURSUERS) {
            return Err(InputError::TooManyPursuers { headcount });
        }
        Ok(())
    }
}
