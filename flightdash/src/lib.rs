#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod panels;
pub mod playback;
pub mod shell;

pub use app::config::Config;
pub use app::storage;
pub use app::EguiApp;
pub use shell::{Command, DashboardShell, Outcome, ShellOptions};
