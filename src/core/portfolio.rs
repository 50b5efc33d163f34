//! Derived views over a user's investments.
use crate::core::account::Investment;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Display;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Total amount invested per coin, over active investments only.
pub fn aggregate<'a, I>(investments: I) -> HashMap<String, Decimal>
where
    I: IntoIterator<Item = &'a Investment>,
{
    let mut portfolio: HashMap<String, Decimal> = HashMap::new();
    for investment in investments.into_iter().filter(|inv| inv.is_active()) {
        *portfolio.entry(investment.coin_name.clone()).or_default() += investment.amount;
    }
    portfolio
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSlice {
    pub coin_name: String,
    pub amount: Decimal,
    pub percentage: Decimal,
}

/// Turns an aggregated portfolio into slices ordered by amount, largest first.
pub fn allocation(portfolio: &HashMap<String, Decimal>) -> Vec<AllocationSlice> {
    let total: Decimal = portfolio.values().sum();
    let mut slices: Vec<AllocationSlice> = portfolio
        .iter()
        .map(|(coin_name, amount)| AllocationSlice {
            coin_name: coin_name.clone(),
            amount: *amount,
            percentage: if total > Decimal::ZERO {
                *amount / total * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            },
        })
        .collect();
    slices.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.coin_name.cmp(&b.coin_name))
    });
    slices
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Matured,
    Remaining { days: u64, hours: u64, minutes: u64 },
}

impl Display for TimeRemaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRemaining::Matured => write!(f, "Matured"),
            TimeRemaining::Remaining {
                days,
                hours,
                minutes,
            } => write!(f, "{days}d {hours}h {minutes}m remaining"),
        }
    }
}

pub fn time_remaining(maturity: DateTime<Utc>, now: DateTime<Utc>) -> TimeRemaining {
    let diff = (maturity - now).num_milliseconds();
    if diff <= 0 {
        return TimeRemaining::Matured;
    }

    // diff is positive so plain division floors
    TimeRemaining::Remaining {
        days: (diff / MS_PER_DAY) as u64,
        hours: ((diff % MS_PER_DAY) / MS_PER_HOUR) as u64,
        minutes: ((diff % MS_PER_HOUR) / MS_PER_MINUTE) as u64,
    }
}
