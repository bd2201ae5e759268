use super::ui;
use crate::Services;
use crate::core::converter::{AmountField, Converter, ConverterView};
use crate::core::currency::CurrencyCode;
use crate::core::rates::LatestRates;
use anyhow::{Context, Result, anyhow};
use comfy_table::Cell;
use std::sync::Arc;

pub struct ConvertArgs<'a> {
    pub amount: &'a str,
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
    /// Treat `amount` as typed into the target field.
    pub edit_target: bool,
    pub refresh: bool,
}

/// Runs one edit through the converter and prints both fields once settled.
pub async fn run(services: &Services, args: ConvertArgs<'_>) -> Result<ConverterView> {
    let from: CurrencyCode = match args.from {
        Some(code) => code.parse()?,
        None => services.config.currency,
    };
    let to: CurrencyCode = match args.to {
        Some(code) => code.parse()?,
        None => services.config.target_currency,
    };

    if args.refresh {
        services
            .latest
            .latest(&from, true)
            .await
            .with_context(|| format!("Failed to refresh rates for {from}"))?;
    }

    let converter = Converter::new(
        Arc::clone(&services.latest) as Arc<dyn LatestRates>,
        from,
        to,
    );
    let field = if args.edit_target {
        AmountField::Target
    } else {
        AmountField::Source
    };

    let pb = ui::new_spinner("Converting");
    converter.on_amount_changed(field, args.amount, from, to);
    let view = converter.settled().await;
    pb.finish_and_clear();

    if let Some(error) = &view.error {
        return Err(anyhow!("{error}")).context("Conversion failed");
    }

    display(&view);
    Ok(view)
}

fn display(view: &ConverterView) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Currency"),
        ui::header_cell("Amount"),
    ]);
    for (label, field, code) in [
        ("From", AmountField::Source, view.from_currency),
        ("To", AmountField::Target, view.to_currency),
    ] {
        let amount = view.amount(field);
        let amount_cell = if field == view.last_edited {
            ui::number_cell(amount)
        } else {
            ui::number_cell(ui::style_text(amount, ui::StyleType::TotalValue))
        };
        table.add_row(vec![
            Cell::new(ui::style_text(label, ui::StyleType::TotalLabel)),
            Cell::new(format!(
                "{} {}",
                code,
                ui::style_text(code.display_name().unwrap_or_default(), ui::StyleType::Subtle)
            )),
            amount_cell,
        ]);
    }
    println!("{table}");
}
