use super::ui;
use crate::Services;
use crate::core::currency::CurrencyCode;
use crate::core::error::RateError;
use crate::core::history::HistoryTracker;
use crate::core::rates::{HistoricalRates, HistoricalSeries, Span};
use anyhow::{Context, Result, anyhow};
use comfy_table::Cell;
use std::sync::Arc;

/// Number of trailing points printed under the summary.
const RECENT_POINTS: usize = 10;

pub async fn run(
    services: &Services,
    base: &str,
    target: &str,
    years: u32,
    refresh: bool,
) -> Result<HistoricalSeries> {
    let base: CurrencyCode = base.parse()?;
    let target: CurrencyCode = target.parse()?;
    let span = Span::try_from(years)?;

    if !HistoryTracker::is_supported(&base, &target) {
        return Err(RateError::UnsupportedCurrency {
            base: base.to_string(),
            target: target.to_string(),
        }
        .into());
    }

    let tracker = HistoryTracker::new(
        Arc::clone(&services.history) as Arc<dyn HistoricalRates>,
        base,
        target,
    );

    let pb = ui::new_spinner(&format!("Loading {base}/{target} over {span}"));
    tracker.load(base, target, span, refresh);
    let view = tracker.settled().await;
    pb.finish_and_clear();

    if let Some(error) = view.error {
        return Err(anyhow!(error))
            .with_context(|| format!("Failed to load history for {base}/{target}"));
    }

    let series = view
        .series
        .with_context(|| format!("No history loaded for {base}/{target}"))?;
    display(&series);
    Ok(series)
}

fn display(series: &HistoricalSeries) {
    println!(
        "\n{}",
        ui::style_text(
            &format!(
                "{}/{} over {} year(s)",
                series.base,
                series.target,
                series.span.years()
            ),
            ui::StyleType::Title
        )
    );

    if series.points.is_empty() {
        println!(
            "{}",
            ui::style_text("No data points in this period.", ui::StyleType::Subtle)
        );
        return;
    }

    let point = |p: (chrono::NaiveDate, f64)| format!("{:.4} ({})", p.1, p.0);
    let mut summary = ui::new_styled_table();
    summary.set_header(vec![
        ui::header_cell("First"),
        ui::header_cell("Last"),
        ui::header_cell("Min"),
        ui::header_cell("Max"),
        ui::header_cell("Change"),
    ]);
    summary.add_row(vec![
        ui::format_optional_cell(series.first(), point),
        ui::format_optional_cell(series.last(), point),
        ui::format_optional_cell(series.min(), point),
        ui::format_optional_cell(series.max(), point),
        series
            .change_percent()
            .map_or_else(ui::na_cell, ui::change_cell),
    ]);
    println!("{summary}");

    let mut recent = ui::new_styled_table();
    recent.set_header(vec![ui::header_cell("Date"), ui::header_cell("Rate")]);
    let skip = series.points.len().saturating_sub(RECENT_POINTS);
    for (date, rate) in series.points.iter().skip(skip) {
        recent.add_row(vec![
            Cell::new(date.format("%Y-%m-%d")),
            ui::number_cell(format!("{rate:.4}")),
        ]);
    }
    println!(
        "{}",
        ui::style_text(
            &format!("Most recent {} of {} points", series.points.len() - skip, series.points.len()),
            ui::StyleType::Subtle
        )
    );
    println!("{recent}");
}
