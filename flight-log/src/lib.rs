#![warn(clippy::all, rust_2018_idioms)]

//! Parsing and unit conversion for Airdata UAV flight log exports
//! (<https://app.airdata.com/>).

mod error;
mod loader;
pub mod schema;
mod series;
pub mod units;

pub use error::LoadError;
pub use loader::{fill_leading_zeros, load_flight_log, FlightLog, LoadOptions, RcChannels, Sample};
pub use schema::{Column, SchemaPolicy};
pub use series::DerivedSeries;
