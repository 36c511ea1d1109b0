#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;

use app_core::logging::init_file_logger;
use clap::Parser;
use flightdash::{Config, EguiApp};

const WINDOW_NAME: &str = "Flight Replay";
const WINDOW_WIDTH: f32 = 1200.0;
const WINDOW_HEIGHT: f32 = 700.0;

/// Replay a UAV flight log exported from Airdata.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Flight log (CSV) to open on start.
    file: Option<PathBuf>,
    /// Read settings from this file instead of ~/.flightdash.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Samples to advance per playback step.
    #[arg(long)]
    stride: Option<usize>,
}

fn main() -> eframe::Result {
    let args = Args::parse();

    let (mut config, config_result) = match Config::from_config_file(args.config.as_deref()) {
        Ok((config, problems)) => (config, Ok(problems)),
        Err(err) => (Config::default(), Err(err)),
    };
    if let Some(stride) = args.stride {
        config.stride = stride;
    }

    if let Err(err) = init_file_logger(&config.log_file, &config.log_level) {
        eprintln!("{err}");
    }
    match config_result {
        Ok(problems) => problems.iter().for_each(|problem| log::warn!("{problem}")),
        Err(err) => log::warn!("unable to load config file, using defaults: {err}"),
    }
    log::debug!("{:?}", config);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_WIDTH / 2.0, WINDOW_HEIGHT / 2.0]),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(EguiApp::new(cc, config, args.file)))),
    )
}
