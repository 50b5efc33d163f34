//! User and investment records as they are stored and exchanged with the seed document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestmentId(pub i64);

impl Display for InvestmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    Active,
    Withdrawn,
    /// Accepted when reading seed data. Maturity is otherwise derived from
    /// `maturity_date`, see [`Investment::effective_status`].
    Matured,
}

impl Display for InvestmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                InvestmentStatus::Active => "active",
                InvestmentStatus::Withdrawn => "withdrawn",
                InvestmentStatus::Matured => "matured",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: InvestmentId,
    pub coin_name: String,
    pub amount: Decimal,
    pub purchase_date: DateTime<Utc>,
    /// Lock-up period in days.
    pub duration: u32,
    pub maturity_date: DateTime<Utc>,
    pub status: InvestmentStatus,
}

impl Investment {
    /// Only active investments hold locked funds. A stored `matured` record
    /// counts as settled.
    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }

    pub fn is_mature(&self, now: DateTime<Utc>) -> bool {
        now >= self.maturity_date
    }

    /// Status as shown to the user: an active investment past its maturity
    /// date reads as matured. Nothing is written back.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvestmentStatus {
        match self.status {
            InvestmentStatus::Active if self.is_mature(now) => InvestmentStatus::Matured,
            status => status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub total_account_balance: Decimal,
    #[serde(default)]
    pub investment_balance: Decimal,
    #[serde(default)]
    pub investments: Vec<Investment>,
}

impl User {
    pub fn new(id: UserId, full_name: &str, email: &str) -> Self {
        Self {
            id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: None,
            phone: None,
            total_account_balance: Decimal::ZERO,
            investment_balance: Decimal::ZERO,
            investments: Vec::new(),
        }
    }

    pub fn active_investments(&self) -> impl Iterator<Item = &Investment> {
        self.investments
            .iter()
            .filter(|inv| inv.is_active())
    }

    pub fn find_investment(&self, id: InvestmentId) -> Option<&Investment> {
        self.investments.iter().find(|inv| inv.id == id)
    }

    /// Sum of the amounts of active investments. Equals
    /// `investment_balance` for every record produced by the ledger.
    pub fn locked_amount(&self) -> Decimal {
        self.active_investments().map(|inv| inv.amount).sum()
    }

    pub fn net_worth(&self) -> Decimal {
        self.total_account_balance + self.investment_balance
    }

    /// The hard-coded account used when neither the seed document nor local
    /// storage provide any users.
    pub fn demo() -> Self {
        Self {
            password: Some("password123".to_string()),
            phone: Some("123-456-7890".to_string()),
            total_account_balance: Decimal::from(10_000),
            ..Self::new(UserId(1), "Demo User", "demo@example.com")
        }
    }
}
