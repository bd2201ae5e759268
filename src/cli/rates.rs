use super::ui;
use crate::Services;
use crate::core::currency::CurrencyCode;
use crate::core::rates::{LatestRates, RateTable};
use anyhow::{Context, Result};
use comfy_table::Cell;

pub async fn run(services: &Services, base: Option<&str>, refresh: bool) -> Result<RateTable> {
    let base: CurrencyCode = match base {
        Some(code) => code.parse()?,
        None => services.config.currency,
    };

    let pb = ui::new_spinner(&format!("Fetching rates for {base}"));
    let result = services.latest.latest(&base, refresh).await;
    pb.finish_and_clear();
    let table = result.with_context(|| format!("Failed to get latest rates for {base}"))?;

    display(&table);
    Ok(table)
}

fn display(table: &RateTable) {
    println!(
        "\n{} {}",
        ui::style_text(&format!("Rates for 1 {}", table.base), ui::StyleType::Title),
        ui::style_text(
            &format!("(fetched {})", table.fetched_at.format("%Y-%m-%d %H:%M UTC")),
            ui::StyleType::Subtle
        )
    );

    let mut rates_table = ui::new_styled_table();
    rates_table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Rate"),
    ]);
    for (code, rate) in &table.rates {
        if *code == table.base {
            continue;
        }
        rates_table.add_row(vec![
            Cell::new(code.as_str()),
            Cell::new(code.display_name().unwrap_or_default()),
            ui::number_cell(format!("{rate:.4}")),
        ]);
    }
    println!("{rates_table}");
}
