//! Two linked amount fields kept consistent through the latest rates.
//!
//! Every edit bumps a generation counter and spawns a recompute of the peer
//! field. A recompute only lands if its generation is still the latest one,
//! so a slow, superseded request can never overwrite a newer result.
//! Consumers observe [`ConverterView`] through a `watch` receiver obtained
//! with [`Converter::subscribe`]; dropping the receiver unsubscribes.

use crate::core::conversion::{convert, format_amount, parse_amount};
use crate::core::currency::{CurrencyCode, live_currencies};
use crate::core::error::RateResult;
use crate::core::rates::LatestRates;
use crate::core::task::Inflight;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    Source,
    Target,
}

impl AmountField {
    pub fn peer(&self) -> AmountField {
        match self {
            AmountField::Source => AmountField::Target,
            AmountField::Target => AmountField::Source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recomputing(AmountField),
}

/// Observable state of the converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterView {
    pub currencies: Vec<CurrencyCode>,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub from_amount: String,
    pub to_amount: String,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: Phase,
    pub last_edited: AmountField,
    pub generation: u64,
}

impl ConverterView {
    fn new(from_currency: CurrencyCode, to_currency: CurrencyCode) -> Self {
        Self {
            currencies: live_currencies(),
            from_currency,
            to_currency,
            from_amount: String::new(),
            to_amount: String::new(),
            loading: false,
            error: None,
            phase: Phase::Idle,
            last_edited: AmountField::Source,
            generation: 0,
        }
    }

    pub fn amount(&self, field: AmountField) -> &str {
        match field {
            AmountField::Source => &self.from_amount,
            AmountField::Target => &self.to_amount,
        }
    }

    fn amount_mut(&mut self, field: AmountField) -> &mut String {
        match field {
            AmountField::Source => &mut self.from_amount,
            AmountField::Target => &mut self.to_amount,
        }
    }

    fn currency(&self, field: AmountField) -> CurrencyCode {
        match field {
            AmountField::Source => self.from_currency,
            AmountField::Target => self.to_currency,
        }
    }
}

/// What caused a recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Text typed into a field. Subject to echo suppression.
    Edit,
    /// Currency change or swap.
    Recompute,
    /// Recompute that bypasses the rate cache.
    Refresh,
}

/// One user edit, captured when it is issued.
#[derive(Debug, Clone)]
struct ConversionRequest {
    edited_field: AmountField,
    raw_text: String,
    from: CurrencyCode,
    to: CurrencyCode,
    generation: u64,
    force_refresh: bool,
}

/// Coordinates the source and target amount fields.
pub struct Converter {
    rates: Arc<dyn LatestRates>,
    state: Arc<watch::Sender<ConverterView>>,
    inflight: Inflight,
}

impl Converter {
    pub fn new(rates: Arc<dyn LatestRates>, from: CurrencyCode, to: CurrencyCode) -> Self {
        let (state, _) = watch::channel(ConverterView::new(from, to));
        Self {
            rates,
            state: Arc::new(state),
            inflight: Inflight::default(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConverterView> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn view(&self) -> ConverterView {
        self.state.borrow().clone()
    }

    /// Handles an edit of `field`. Must be called from within a tokio
    /// runtime. An edit that matches the current state exactly is the echo
    /// of a programmatic write and is ignored, unless it lands while the
    /// peer field is being recomputed.
    pub fn on_amount_changed(
        &self,
        field: AmountField,
        text: &str,
        from: CurrencyCode,
        to: CurrencyCode,
    ) {
        self.submit(field, text, from, to, Trigger::Edit);
    }

    /// Changing either currency recomputes the target from the source.
    pub fn set_currencies(&self, from: CurrencyCode, to: CurrencyCode) {
        let text = self.state.borrow().from_amount.clone();
        self.submit(AmountField::Source, &text, from, to, Trigger::Recompute);
    }

    /// Swaps currencies and amounts, then recomputes from the new source.
    pub fn swap(&self) {
        let mut text = String::new();
        let (mut from, mut to) = {
            let view = self.state.borrow();
            (view.from_currency, view.to_currency)
        };
        self.state.send_modify(|view| {
            std::mem::swap(&mut view.from_amount, &mut view.to_amount);
            std::mem::swap(&mut view.from_currency, &mut view.to_currency);
            text = view.from_amount.clone();
            from = view.from_currency;
            to = view.to_currency;
        });
        self.submit(AmountField::Source, &text, from, to, Trigger::Recompute);
    }

    /// Refetches the rates and recomputes from the last edited field.
    pub fn refresh(&self) {
        let view = self.view();
        let field = view.last_edited;
        let text = view.amount(field).to_string();
        self.submit(field, &text, view.from_currency, view.to_currency, Trigger::Refresh);
    }

    /// Waits until no recompute is pending and returns the settled state.
    pub async fn settled(&self) -> ConverterView {
        let mut rx = self.subscribe();
        match rx.wait_for(|view| view.phase == Phase::Idle).await {
            Ok(view) => view.clone(),
            // The sender lives as long as self, so this is unreachable in practice.
            Err(_) => self.view(),
        }
    }

    fn submit(
        &self,
        field: AmountField,
        text: &str,
        from: CurrencyCode,
        to: CurrencyCode,
        trigger: Trigger,
    ) {
        let mut request = None;
        self.state.send_if_modified(|view| {
            // While the peer is being recomputed this field may hold stale
            // text, so an identical edit is a real edit.
            let echo = trigger == Trigger::Edit
                && view.phase != Phase::Recomputing(field.peer())
                && view.error.is_none()
                && view.from_currency == from
                && view.to_currency == to
                && view.amount(field) == text;
            if echo {
                return false;
            }

            view.generation += 1;
            *view.amount_mut(field) = text.to_string();
            view.from_currency = from;
            view.to_currency = to;
            view.last_edited = field;
            view.phase = Phase::Recomputing(field);
            view.loading = true;
            view.error = None;
            request = Some(ConversionRequest {
                edited_field: field,
                raw_text: text.to_string(),
                from,
                to,
                generation: view.generation,
                force_refresh: trigger == Trigger::Refresh,
            });
            true
        });

        let Some(request) = request else {
            debug!("Ignoring unchanged {:?} edit", field);
            return;
        };

        debug!(
            generation = request.generation,
            "Recomputing {:?} from {:?}",
            field.peer(),
            field
        );
        let rates = Arc::clone(&self.rates);
        let state = Arc::clone(&self.state);
        self.inflight.replace(tokio::spawn(async move {
            let outcome = compute_peer(rates.as_ref(), &request).await;
            apply(&state, &request, outcome);
        }));
    }
}

async fn compute_peer(rates: &dyn LatestRates, request: &ConversionRequest) -> RateResult<f64> {
    let table = rates.latest(&request.from, request.force_refresh).await?;
    let amount = parse_amount(&request.raw_text);
    match request.edited_field {
        AmountField::Source => convert(&table, amount, &request.from, &request.to),
        AmountField::Target => convert(&table, amount, &request.to, &request.from),
    }
}

fn apply(
    state: &watch::Sender<ConverterView>,
    request: &ConversionRequest,
    outcome: RateResult<f64>,
) {
    state.send_if_modified(|view| {
        if view.generation != request.generation {
            debug!(
                stale = request.generation,
                latest = view.generation,
                "Discarding superseded result"
            );
            return false;
        }

        let peer = request.edited_field.peer();
        match outcome {
            Ok(value) => {
                *view.amount_mut(peer) = format_amount(value);
                view.error = None;
                debug!(
                    "Set {:?} to {} {}",
                    peer,
                    view.amount(peer),
                    view.currency(peer)
                );
            }
            Err(e) => {
                debug!("Recompute failed: {}", e);
                view.error = Some(e.to_string());
            }
        }
        view.loading = false;
        view.phase = Phase::Idle;
        true
    });
}
