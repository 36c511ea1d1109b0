//! Process-wide logging: one named log file with timestamped lines, plus a
//! helper to log how long an operation took.

use std::{fs::OpenOptions, io::Write, path::Path, time::Instant};

use crate::string_error::ErrorStringExt;

/// Install `env_logger` writing `timestamp:LEVEL:message` lines into the file
/// at `path` (appending). `RUST_LOG` overrides `default_level`.
///
/// Falls back to stderr if the file cannot be opened. May only succeed once
/// per process.
pub fn init_file_logger(path: &Path, default_level: &str) -> Result<(), String> {
    let env = env_logger::Env::default().default_filter_or(default_level);
    let mut builder = env_logger::Builder::from_env(env);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{}:{}:{}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });

    let fallback = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            None
        }
        Err(err) => Some(err),
    };

    builder
        .try_init()
        .err_to_string("could not initialise logger")?;

    match fallback {
        Some(err) => log::warn!("unable to open log file {:?} ({err}), logging to stderr", path),
        None => log::info!("logging to {:?}", path),
    }
    Ok(())
}

/// Run `action` and log its wall-clock duration at info level.
pub fn timed<T>(label: &str, action: impl FnOnce() -> T) -> T {
    let tic = Instant::now();
    let result = action();
    log::info!(
        "==> {} ran in {:.3} s",
        label,
        tic.elapsed().as_secs_f64()
    );
    result
}
