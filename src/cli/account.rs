use super::ui;
use crate::core::account::{InvestmentId, User};
use crate::core::auth::SignupRequest;
use crate::core::ledger::parse_amount;
use crate::core::market::MarketFeed;
use crate::core::{AccountService, SeedSource};
use anyhow::Result;
use clap::ValueEnum;
use std::fmt::Display;
use tracing::{info, warn};

/// How a top-up is paid. Recorded in the log only; every method credits the
/// account the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PaymentMethod {
    #[default]
    Bitcoin,
    Tron,
    Solana,
    Litecoin,
    Stripe,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PaymentMethod::Bitcoin => "Bitcoin",
                PaymentMethod::Tron => "Tron",
                PaymentMethod::Solana => "Solana",
                PaymentMethod::Litecoin => "Litecoin",
                PaymentMethod::Stripe => "Stripe",
            }
        )
    }
}

fn print_success(message: &str) {
    println!("{}", ui::style_text(message, ui::StyleType::Success));
}

fn print_balances(user: &User) {
    println!(
        "{} {}   {} {}",
        ui::style_text("Balance:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::money(user.total_account_balance), ui::StyleType::TotalValue),
        ui::style_text("Investment Balance:", ui::StyleType::TotalLabel),
        ui::money(user.investment_balance),
    );
}

pub async fn signup(
    service: &AccountService,
    seed: &dyn SeedSource,
    request: SignupRequest,
) -> Result<()> {
    let user = service.signup(seed, &request).await?;
    print_success("Sign up successful! Logging you in.");
    println!("Welcome, {} ({})", user.full_name, user.email);
    Ok(())
}

pub async fn login(
    service: &AccountService,
    seed: &dyn SeedSource,
    email: &str,
    password: &str,
) -> Result<()> {
    let user = service.login(seed, email, password).await?;
    print_success("Login successful!");
    println!("Welcome back, {}", user.full_name);
    print_balances(&user);
    Ok(())
}

pub async fn logout(service: &AccountService) -> Result<()> {
    service.logout().await?;
    print_success("You have been logged out.");
    Ok(())
}

pub async fn top_up(service: &AccountService, amount: &str, method: PaymentMethod) -> Result<()> {
    let amount = parse_amount(amount)?;
    let user = service.top_up(amount).await?;
    info!(%amount, %method, "Top up completed");
    print_success(&format!("Successfully topped up {}!", ui::money(amount)));
    print_balances(&user);
    Ok(())
}

/// Resolves `coin` against the live market so investments carry the coin's
/// display name. Without market data the name is taken as typed.
async fn resolve_coin_name(feed: &MarketFeed, coin: &str) -> Result<String> {
    if feed.refresh().await.is_err() {
        warn!(coin, "Market data unavailable, using coin name as given");
        return Ok(coin.trim().to_string());
    }
    let snapshot = feed.snapshot().await;
    match snapshot.as_ref().and_then(|s| s.find(coin.trim())) {
        Some(found) => Ok(found.name.clone()),
        None => anyhow::bail!("{} is not in the live market list.", coin),
    }
}

pub async fn invest(
    service: &AccountService,
    feed: &MarketFeed,
    coin: &str,
    amount: &str,
    days: u32,
) -> Result<()> {
    // Fail on bad input or a missing session before touching the network
    let amount = parse_amount(amount)?;
    service.current_user().await?;

    let coin_name = resolve_coin_name(feed, coin).await?;
    let user = service.open_investment(&coin_name, amount, days).await?;
    print_success(&format!(
        "Successfully invested {} in {} for {} days!",
        ui::money(amount),
        coin_name,
        days
    ));
    if let Some(investment) = user.investments.last() {
        println!(
            "Investment {} matures on {}",
            investment.id,
            investment.maturity_date.format("%Y-%m-%d %H:%M UTC")
        );
    }
    print_balances(&user);
    Ok(())
}

pub async fn withdraw(service: &AccountService, id: i64) -> Result<()> {
    let id = InvestmentId(id);
    let before = service.current_user().await?;
    let user = service.withdraw(id).await?;
    if let Some(investment) = before.find_investment(id) {
        print_success(&format!(
            "Successfully withdrew {} from your {} investment.",
            ui::money(investment.amount),
            investment.coin_name
        ));
    }
    print_balances(&user);
    Ok(())
}
