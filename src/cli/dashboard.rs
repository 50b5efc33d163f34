use super::ui;
use crate::core::account::{InvestmentStatus, User};
use crate::core::market::{MarketFeed, MarketSnapshot};
use crate::core::portfolio;
use crate::core::AccountService;
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, CellAlignment};
use std::fmt::Write;

const BAR_WIDTH: usize = 20;

pub fn render_allocation(user: &User) -> String {
    let slices = portfolio::allocation(&portfolio::aggregate(&user.investments));

    if slices.is_empty() {
        return format!(
            "{}\n{}",
            ui::style_text("Your Portfolio", ui::StyleType::Title),
            ui::style_text(
                "No active investments to display. Make an investment to see your portfolio breakdown.",
                ui::StyleType::Subtle
            )
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin"),
        ui::header_cell("Invested"),
        ui::header_cell("Allocation"),
        ui::header_cell(""),
    ]);
    for slice in &slices {
        table.add_row(vec![
            Cell::new(&slice.coin_name),
            ui::money_cell(slice.amount),
            ui::format_percentage_cell(slice.percentage),
            ui::bar_cell(slice.percentage, BAR_WIDTH),
        ]);
    }

    format!(
        "{}\n{}\n{}",
        ui::style_text("Your Portfolio Allocation", ui::StyleType::Title),
        ui::style_text(
            "Distribution of your total invested capital.",
            ui::StyleType::Subtle
        ),
        table
    )
}

pub fn render_investments(user: &User, now: DateTime<Utc>) -> String {
    let mut active = user.active_investments().peekable();
    if active.peek().is_none() {
        return format!(
            "{}\n{}",
            ui::style_text("Your Investments", ui::StyleType::Title),
            ui::style_text("You have no active investments.", ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Coin"),
        ui::header_cell("Amount"),
        ui::header_cell("Matures on"),
        ui::header_cell("Status"),
    ]);
    for investment in active {
        let remaining = portfolio::time_remaining(investment.maturity_date, now);
        let ready = investment.effective_status(now) == InvestmentStatus::Matured;
        let status = if ready {
            format!("{remaining} (withdraw available)")
        } else {
            remaining.to_string()
        };
        table.add_row(vec![
            Cell::new(investment.id),
            Cell::new(&investment.coin_name),
            ui::money_cell(investment.amount),
            Cell::new(investment.maturity_date.format("%Y-%m-%d")),
            ui::status_cell(&status, ready),
        ]);
    }

    format!(
        "{}\n{}",
        ui::style_text("Your Investments", ui::StyleType::Title),
        table
    )
}

pub fn render_market(snapshot: Option<&MarketSnapshot>) -> String {
    let title = ui::style_text("Live Market", ui::StyleType::Title);
    let Some(snapshot) = snapshot.filter(|s| !s.coins.is_empty()) else {
        return format!(
            "{}\n{}",
            title,
            ui::style_text("Could not load market data.", ui::StyleType::Error)
        );
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
        ui::header_cell("Price (USD)"),
    ]);
    for (index, coin) in snapshot.coins.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&coin.name),
            Cell::new(coin.symbol.to_uppercase()),
            Cell::new(format!("${:.2}", coin.current_price)).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "{}\n{}\n{}",
        title,
        table,
        ui::style_text(
            &format!(
                "Updated {}",
                snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            ui::StyleType::Subtle
        )
    )
}

pub fn render_dashboard(user: &User, market: Option<&MarketSnapshot>, now: DateTime<Utc>) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} {}",
        ui::style_text(&user.full_name, ui::StyleType::Title),
        ui::style_text(&user.email, ui::StyleType::Subtle)
    );
    let _ = writeln!(
        output,
        "{} {}   {} {}\n",
        ui::style_text("Balance:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::money(user.total_account_balance), ui::StyleType::TotalValue),
        ui::style_text("Investment Balance:", ui::StyleType::TotalLabel),
        ui::money(user.investment_balance),
    );
    let _ = writeln!(output, "{}\n", render_allocation(user));
    let _ = writeln!(output, "{}\n", render_investments(user, now));
    output.push_str(&render_market(market));
    output
}

pub async fn run(service: &AccountService, feed: &MarketFeed) -> Result<()> {
    let pb = ui::new_spinner("Loading dashboard...");
    let (user, _) = futures::future::join(service.current_user(), feed.refresh()).await;
    pb.finish_and_clear();

    let user = user?;
    let market = feed.snapshot().await;
    println!(
        "{}",
        render_dashboard(&user, market.as_ref(), service.ledger().now())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::{Investment, InvestmentId, UserId};
    use crate::core::market::Coin;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn user_with_investments(now: DateTime<Utc>) -> User {
        let mut user = User::new(UserId(9), "Dash Board", "dash@example.com");
        user.total_account_balance = dec!(300);
        user.investment_balance = dec!(200);
        user.investments = vec![
            Investment {
                id: InvestmentId(100),
                coin_name: "Bitcoin".to_string(),
                amount: dec!(150),
                purchase_date: now - Duration::days(10),
                duration: 7,
                maturity_date: now - Duration::days(3),
                status: InvestmentStatus::Active,
            },
            Investment {
                id: InvestmentId(101),
                coin_name: "Ethereum".to_string(),
                amount: dec!(50),
                purchase_date: now,
                duration: 30,
                maturity_date: now + Duration::days(30),
                status: InvestmentStatus::Active,
            },
            Investment {
                id: InvestmentId(102),
                coin_name: "Solana".to_string(),
                amount: dec!(75),
                purchase_date: now - Duration::days(20),
                duration: 7,
                maturity_date: now - Duration::days(13),
                status: InvestmentStatus::Withdrawn,
            },
        ];
        user
    }

    #[test]
    fn test_render_allocation_lists_active_coins() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let output = render_allocation(&user_with_investments(now));

        assert!(output.contains("Bitcoin"));
        assert!(output.contains("75.00%"));
        assert!(output.contains("Ethereum"));
        assert!(output.contains("25.00%"));
        assert!(!output.contains("Solana"));
    }

    #[test]
    fn test_render_allocation_placeholder() {
        let user = User::demo();
        assert!(render_allocation(&user).contains("No active investments to display."));
        assert!(
            render_investments(&user, Utc::now()).contains("You have no active investments.")
        );
    }

    #[test]
    fn test_render_investments_shows_time_remaining() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let output = render_investments(&user_with_investments(now), now);

        assert!(output.contains("Matured (withdraw available)"));
        assert!(output.contains("30d 0h 0m remaining"));
        assert!(!output.contains("102"));
    }

    #[test]
    fn test_render_market() {
        assert!(render_market(None).contains("Could not load market data."));

        let snapshot = MarketSnapshot {
            coins: vec![Coin {
                id: None,
                symbol: "btc".to_string(),
                name: "Bitcoin".to_string(),
                current_price: 65000.0,
            }],
            fetched_at: Utc::now(),
        };
        let output = render_market(Some(&snapshot));
        assert!(output.contains("BTC"));
        assert!(output.contains("$65000.00"));
    }
}
