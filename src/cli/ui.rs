use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Success,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Success => style(text).green(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Formats a dollar amount with two decimals.
pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned dollar amount.
pub fn money_cell(amount: Decimal) -> Cell {
    Cell::new(money(amount)).set_alignment(CellAlignment::Right)
}

/// Formats a cell with bold and green text
pub fn format_percentage_cell(value: Decimal) -> Cell {
    Cell::new(format!("{:.2}%", value.round_dp(2)))
        .add_attribute(Attribute::Bold)
        .fg(Color::Green)
        .set_alignment(CellAlignment::Right)
}

/// A horizontal bar proportional to `percentage`, standing in for a pie chart.
pub fn bar_cell(percentage: Decimal, width: usize) -> Cell {
    let ratio = (percentage / Decimal::ONE_HUNDRED).clamp(Decimal::ZERO, Decimal::ONE);
    let filled = (ratio * Decimal::from(width))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(width);
    Cell::new(format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))).fg(Color::Green)
}

/// Green for a matured investment, plain otherwise.
pub fn status_cell(text: &str, ready: bool) -> Cell {
    if ready {
        Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        Cell::new(text)
    }
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
