pub mod cache;
pub mod convert;
pub mod currencies;
pub mod history;
pub mod rates;
pub mod setup;
pub mod ui;
