use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Kind of evidence an item represents.
#[derive(
    Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IntelCategory {
    /// UPI handles such as `name@ybl`
    PaymentIdentifier,
    /// Phone numbers and email addresses
    ContactIdentifier,
    Url,
    /// Account numbers and IFSC branch codes
    BankIdentifier,
    /// Mentions of remote-control apps the adversary asks the victim to install
    RemoteAccessApp,
    /// Banks or agencies the adversary claims to represent
    OrganizationClaim,
    CryptoWallet,
}

impl IntelCategory {
    /// Fixed confidence weight. Extraction never adjusts it from context.
    pub fn confidence(self) -> f64 {
        match self {
            IntelCategory::PaymentIdentifier => 0.95,
            IntelCategory::ContactIdentifier => 0.90,
            IntelCategory::Url => 0.95,
            IntelCategory::BankIdentifier => 0.70,
            IntelCategory::RemoteAccessApp => 0.80,
            IntelCategory::OrganizationClaim => 0.75,
            IntelCategory::CryptoWallet => 0.85,
        }
    }

    pub fn is_high_value(self) -> bool {
        HIGH_VALUE_CATEGORIES.contains(&self)
    }
}

/// Categories counted by the completeness score.
pub const COMPLETENESS_CATEGORIES: [IntelCategory; 6] = [
    IntelCategory::PaymentIdentifier,
    IntelCategory::ContactIdentifier,
    IntelCategory::Url,
    IntelCategory::BankIdentifier,
    IntelCategory::RemoteAccessApp,
    IntelCategory::OrganizationClaim,
];

/// Categories that, together with enough turns, make a session eligible for reporting.
pub const HIGH_VALUE_CATEGORIES: [IntelCategory; 4] = [
    IntelCategory::PaymentIdentifier,
    IntelCategory::ContactIdentifier,
    IntelCategory::Url,
    IntelCategory::BankIdentifier,
];
