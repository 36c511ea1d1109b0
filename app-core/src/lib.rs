#![warn(clippy::all, rust_2018_idioms)]

pub mod event;
pub mod logging;
pub mod storage;
pub mod string_error;
