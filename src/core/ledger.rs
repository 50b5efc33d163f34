//! Balance and investment bookkeeping for a single user record.
//!
//! Every operation validates its input first and then returns an updated
//! copy of the user. Money only moves between the account balance and the
//! investment balance, except for top-ups which inject new funds.

use crate::core::account::{Investment, InvestmentId, InvestmentStatus, User};
use crate::core::clock::{Clock, IdGenerator, SystemClock};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Please enter a valid amount.")]
    InvalidAmount,

    #[error("Investment duration must be at least one day.")]
    InvalidDuration,

    #[error("Insufficient funds: requested ${requested}, available ${available}.")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Investment {0} not found.")]
    NotFound(InvestmentId),

    #[error("Investment {0} has already been withdrawn.")]
    AlreadyWithdrawn(InvestmentId),

    #[error("Investment {0} is not active and cannot be withdrawn.")]
    NotActive(InvestmentId),

    #[error("Investment {id} matures on {maturity_date}; it cannot be withdrawn yet.")]
    NotMatured {
        id: InvestmentId,
        maturity_date: DateTime<Utc>,
    },
}

/// Parses an amount typed by the user. Anything that is not a positive,
/// finite number is rejected.
pub fn parse_amount(text: &str) -> Result<Decimal, LedgerError> {
    let amount = Decimal::from_str(text.trim()).map_err(|_| LedgerError::InvalidAmount)?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}

fn add(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    balance
        .checked_add(amount)
        .ok_or(LedgerError::InvalidAmount)
}

fn sub(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    balance
        .checked_sub(amount)
        .ok_or(LedgerError::InvalidAmount)
}

pub struct Ledger<C: Clock = SystemClock> {
    clock: C,
    ids: IdGenerator,
}

impl Ledger<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Ledger<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Ledger<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            ids: IdGenerator::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn top_up(&self, user: &User, amount: Decimal) -> Result<User, LedgerError> {
        validate_amount(amount)?;

        let mut updated = user.clone();
        updated.total_account_balance = add(user.total_account_balance, amount)?;
        debug!(user = %user.id, %amount, "Top up applied");
        Ok(updated)
    }

    pub fn open_investment(
        &self,
        user: &User,
        coin_name: &str,
        amount: Decimal,
        duration_days: u32,
    ) -> Result<User, LedgerError> {
        validate_amount(amount)?;
        if duration_days == 0 {
            return Err(LedgerError::InvalidDuration);
        }
        if amount > user.total_account_balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: user.total_account_balance,
            });
        }

        let now = self.clock.now();
        let maturity_date = Duration::try_days(i64::from(duration_days))
            .and_then(|term| now.checked_add_signed(term))
            .ok_or(LedgerError::InvalidDuration)?;
        let investment_balance = add(user.investment_balance, amount)?;
        let floor = user.investments.iter().map(|inv| inv.id.0).max();
        let investment = Investment {
            id: InvestmentId(self.ids.next(now, floor)),
            coin_name: coin_name.to_string(),
            amount,
            purchase_date: now,
            duration: duration_days,
            maturity_date,
            status: InvestmentStatus::Active,
        };
        debug!(user = %user.id, investment = ?investment, "Opening investment");

        let mut updated = user.clone();
        updated.total_account_balance = sub(user.total_account_balance, amount)?;
        updated.investment_balance = investment_balance;
        updated.investments.push(investment);
        Ok(updated)
    }

    pub fn withdraw(&self, user: &User, investment_id: InvestmentId) -> Result<User, LedgerError> {
        let index = user
            .investments
            .iter()
            .position(|inv| inv.id == investment_id)
            .ok_or(LedgerError::NotFound(investment_id))?;
        let investment = &user.investments[index];

        match investment.status {
            InvestmentStatus::Active => {}
            InvestmentStatus::Withdrawn => {
                return Err(LedgerError::AlreadyWithdrawn(investment_id));
            }
            InvestmentStatus::Matured => return Err(LedgerError::NotActive(investment_id)),
        }
        if !investment.is_mature(self.clock.now()) {
            return Err(LedgerError::NotMatured {
                id: investment_id,
                maturity_date: investment.maturity_date,
            });
        }

        let amount = investment.amount;
        let mut updated = user.clone();
        updated.total_account_balance = add(user.total_account_balance, amount)?;
        updated.investment_balance = sub(user.investment_balance, amount)?;
        updated.investments[index].status = InvestmentStatus::Withdrawn;
        debug!(user = %user.id, investment = %investment_id, %amount, "Investment withdrawn");
        Ok(updated)
    }
}
