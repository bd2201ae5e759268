use super::ui;
use crate::core::currency::{CurrencyCode, HISTORICAL_CURRENCIES, LIVE_CURRENCIES};
use anyhow::Result;

/// Live codes in display order, then codes only the history service knows.
pub fn all_codes() -> Vec<CurrencyCode> {
    LIVE_CURRENCIES
        .iter()
        .chain(HISTORICAL_CURRENCIES.iter().filter(|c| !LIVE_CURRENCIES.contains(*c)))
        .filter_map(|code| code.parse().ok())
        .collect()
}

pub fn run() -> Result<()> {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Live"),
        ui::header_cell("History"),
    ]);
    for code in all_codes() {
        table.add_row(vec![
            comfy_table::Cell::new(code.as_str()),
            comfy_table::Cell::new(code.display_name().unwrap_or_default()),
            ui::flag_cell(code.is_live_supported()),
            ui::flag_cell(code.is_historical_supported()),
        ]);
    }
    println!(
        "\n{}",
        ui::style_text("Supported currencies", ui::StyleType::Title)
    );
    println!("{table}");
    Ok(())
}
