//! Observable historical series for one currency pair and period.

use crate::core::currency::{CurrencyCode, is_historical_pair};
use crate::core::error::RateResult;
use crate::core::rates::{HistoricalRates, HistoricalSeries, Span};
use crate::core::task::Inflight;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Selected pair and period, and the last series that loaded.
///
/// `series` keeps its own pair and span: after a failed load it still
/// describes the points on screen, not the selection that failed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub span: Span,
    pub series: Option<HistoricalSeries>,
    pub loading: bool,
    pub error: Option<String>,
    pub generation: u64,
}

impl HistoryView {
    pub fn points(&self) -> &[(NaiveDate, f64)] {
        self.series
            .as_ref()
            .map(|series| series.points.as_slice())
            .unwrap_or_default()
    }
}

pub struct HistoryTracker {
    rates: Arc<dyn HistoricalRates>,
    state: Arc<watch::Sender<HistoryView>>,
    inflight: Inflight,
}

impl HistoryTracker {
    pub fn new(rates: Arc<dyn HistoricalRates>, base: CurrencyCode, target: CurrencyCode) -> Self {
        let (state, _) = watch::channel(HistoryView {
            base,
            target,
            span: Span::OneYear,
            series: None,
            loading: false,
            error: None,
            generation: 0,
        });
        Self {
            rates,
            state: Arc::new(state),
            inflight: Inflight::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryView> {
        self.state.subscribe()
    }

    pub fn view(&self) -> HistoryView {
        self.state.borrow().clone()
    }

    pub fn is_supported(base: &CurrencyCode, target: &CurrencyCode) -> bool {
        is_historical_pair(base, target)
    }

    /// Loads the series for the pair and span, replacing any load in flight.
    /// The previous series stays visible until the new one arrives.
    pub fn load_history(&self, base: CurrencyCode, target: CurrencyCode, span: Span) {
        self.load(base, target, span, false);
    }

    /// Reloads the current pair with a different lookback window.
    pub fn set_period(&self, years: u32) -> RateResult<()> {
        let span = Span::try_from(years)?;
        let view = self.view();
        self.load(view.base, view.target, span, false);
        Ok(())
    }

    /// Reloads the current pair and span, bypassing the cache.
    pub fn refresh(&self) {
        let view = self.view();
        self.load(view.base, view.target, view.span, true);
    }

    pub fn cancel(&self) {
        self.inflight.cancel();
        self.state.send_if_modified(|view| {
            let was_loading = view.loading;
            view.generation += 1;
            view.loading = false;
            was_loading
        });
    }

    pub async fn settled(&self) -> HistoryView {
        let mut rx = self.subscribe();
        match rx.wait_for(|view| !view.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        }
    }

    /// Like [`HistoryTracker::load_history`], optionally bypassing the cache.
    pub fn load(&self, base: CurrencyCode, target: CurrencyCode, span: Span, force_refresh: bool) {
        let mut generation = 0;
        self.state.send_modify(|view| {
            view.generation += 1;
            view.base = base;
            view.target = target;
            view.span = span;
            view.loading = true;
            view.error = None;
            generation = view.generation;
        });
        debug!(generation, "Loading {}/{} over {}", base, target, span);

        let rates = Arc::clone(&self.rates);
        let state = Arc::clone(&self.state);
        self.inflight.replace(tokio::spawn(async move {
            let outcome = rates.series(&base, &target, span, force_refresh).await;
            state.send_if_modified(|view| {
                if view.generation != generation {
                    debug!(stale = generation, "Discarding superseded series");
                    return false;
                }
                match outcome {
                    Ok(series) => {
                        view.series = Some(series);
                        view.error = None;
                    }
                    Err(e) => {
                        debug!("History load failed: {}", e);
                        view.error = Some(e.to_string());
                    }
                }
                view.loading = false;
                true
            });
        }));
    }
}
