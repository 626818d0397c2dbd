//! Beneficiary categories and distribution line items.

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Closed set of beneficiary categories.
///
/// The serialized tag is the stable category string stored in history
/// records and consumed by the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub enum BeneficiaryCategory {
    /// Informant/oversight fund levy (FSP), assessed on the principal.
    #[serde(rename = "fsp")]
    Levy,
    #[serde(rename = "tresor")]
    Treasury,
    #[serde(rename = "mutuelle")]
    MutualFund,
    #[serde(rename = "fonds_solidarite")]
    SolidarityFund,
    #[serde(rename = "fonds_formation")]
    TrainingFund,
    #[serde(rename = "fonds_equipement")]
    EquipmentFund,
    #[serde(rename = "prime_rendement")]
    PerformanceBonus,
    #[serde(rename = "saisissant")]
    SeizingAgent,
    #[serde(rename = "chef")]
    Chief,
    #[serde(rename = "informateur")]
    Informant,
}

impl BeneficiaryCategory {
    /// All categories in display order.
    pub const ALL: [BeneficiaryCategory; 10] = [
        Self::Levy,
        Self::Treasury,
        Self::MutualFund,
        Self::SolidarityFund,
        Self::TrainingFund,
        Self::EquipmentFund,
        Self::PerformanceBonus,
        Self::SeizingAgent,
        Self::Chief,
        Self::Informant,
    ];

    /// Stable category tag, identical to the serialized form.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Levy => "fsp",
            Self::Treasury => "tresor",
            Self::MutualFund => "mutuelle",
            Self::SolidarityFund => "fonds_solidarite",
            Self::TrainingFund => "fonds_formation",
            Self::EquipmentFund => "fonds_equipement",
            Self::PerformanceBonus => "prime_rendement",
            Self::SeizingAgent => "saisissant",
            Self::Chief => "chef",
            Self::Informant => "informateur",
        }
    }

    /// Parse a category tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }

    /// Display ordering rank; lower sorts first.
    pub fn priority(self) -> u8 {
        match self {
            Self::Levy => 0,
            Self::Treasury => 1,
            Self::MutualFund => 2,
            Self::SolidarityFund => 3,
            Self::TrainingFund => 4,
            Self::EquipmentFund => 5,
            Self::PerformanceBonus => 6,
            Self::SeizingAgent => 7,
            Self::Chief => 8,
            Self::Informant => 9,
        }
    }

    /// Display name of the category. For pursuer categories this is the
    /// stem of the positional placeholder label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Levy => "FSP",
            Self::Treasury => "Trésor Public",
            Self::MutualFund => "Mutuelle des Douanes",
            Self::SolidarityFund => "Fonds de Solidarité",
            Self::TrainingFund => "Fonds de Formation",
            Self::EquipmentFund => "Fonds d'Équipement",
            Self::PerformanceBonus => "Prime de Rendement",
            Self::SeizingAgent => "Saisissant",
            Self::Chief => "Chef",
            Self::Informant => "Informateur",
        }
    }

    /// Whether the category is one of the named pursuer groups.
    pub fn is_pursuer(self) -> bool {
        matches!(self, Self::SeizingAgent | Self::Chief | Self::Informant)
    }

    /// Section of the printed breakdown this category belongs to.
    pub fn display_group(self) -> DisplayGroup {
        match self {
            Self::Levy => DisplayGroup::Levies,
            Self::Treasury => DisplayGroup::Administration,
            Self::MutualFund
            | Self::SolidarityFund
            | Self::TrainingFund
            | Self::EquipmentFund
            | Self::PerformanceBonus => DisplayGroup::FundsAndMutual,
            Self::SeizingAgent | Self::Chief | Self::Informant => DisplayGroup::Pursuers,
        }
    }
}

impl std::fmt::Display for BeneficiaryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Display sections of a distribution breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisplayGroup {
    Levies,
    Administration,
    FundsAndMutual,
    Pursuers,
}

impl DisplayGroup {
    /// Groups in display order.
    pub const ALL: [DisplayGroup; 4] = [
        Self::Levies,
        Self::Administration,
        Self::FundsAndMutual,
        Self::Pursuers,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Levies => "Levies",
            Self::Administration => "Administration",
            Self::FundsAndMutual => "Funds & Mutual",
            Self::Pursuers => "Pursuers",
        }
    }
}

/// One row of a distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct BeneficiaryLineItem {
    /// Stable identifier, e.g. `tresor` or `saisissant_0`.
    pub id: String,
    pub name: String,
    pub category: BeneficiaryCategory,
    /// Share in percent. Relative to the net amount, except for the levy
    /// which is relative to the total case amount.
    pub percentage: f64,
    /// Rounded share, never negative.
    #[ts(type = "number")]
    pub computed_amount: Amount,
    pub priority: u8,
}

impl BeneficiaryLineItem {
    /// Line item for a fixed (non-pursuer) category.
    pub fn fixed(category: BeneficiaryCategory, percentage: f64, computed_amount: Amount) -> Self {
        Self {
            id: category.tag().to_string(),
            name: category.label().to_string(),
            category,
            percentage,
            computed_amount,
            priority: category.priority(),
        }
    }

    /// Line item for the pursuer at zero-based `index` within its group.
    ///
    /// A missing name falls back to `"<label> <index + 1>"`.
    pub fn pursuer(
        category: BeneficiaryCategory,
        index: usize,
        name: Option<&str>,
        percentage: f64,
        computed_amount: Amount,
    ) -> Self {
        let name = match name {
            Some(n) => n.to_string(),
            None => format!("{} {}", category.label(), index + 1),
        };
        Self {
            id: format!("{}_{index}", category.tag()),
            name,
            category,
            percentage,
            computed_amount,
            priority: category.priority(),
        }
    }
}
