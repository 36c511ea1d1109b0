use std::path::{Path, PathBuf};

use app_core::storage::Storage;
use serde::{Deserialize, Serialize};

use crate::{shell::Command, EguiApp};

/// The part of the app state worth keeping between runs. The log itself is
/// not stored, only where to find it.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionStorage {
    pub last_file: Option<PathBuf>,
    pub stride: usize,
    pub fly_through_stride: usize,
}

pub fn save_json(app: &EguiApp, path: Option<&Path>) -> Result<(), String> {
    let options = app.shell.options();
    let session = SessionStorage {
        last_file: app.shell.loaded_path().map(Path::to_path_buf),
        stride: options.stride,
        fly_through_stride: options.fly_through_stride,
    };
    Storage::new(session).save_json(path)
}

pub fn load_json(app: &mut EguiApp, path: Option<&Path>) -> Result<(), String> {
    let Storage::<SessionStorage> { session } = Storage::load_json(path)?;

    app.config.stride = session.stride;
    app.config.fly_through_stride = session.fly_through_stride;
    let options = app.shell.options_mut();
    options.stride = session.stride;
    options.fly_through_stride = session.fly_through_stride;

    if let Some(file) = session.last_file {
        app.apply(Command::Open(file));
    }
    app.request_redraw();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::Config;

    #[test]
    fn test_session_round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("flight.csv");
        std::fs::write(
            &log_path,
            "time(millisecond),latitude,longitude,height_above_takeoff(feet),\
            speed(mph),distance(feet),rc_throttle,rc_rudder,rc_elevator,rc_aileron\n\
            0,48.1,11.5,0,0,0,1024,1024,1024,1024\n\
            100,48.1001,11.5001,3,2,10,1100,1024,1024,1000\n",
        )
        .unwrap();
        let session_path = dir.path().join("session.json");

        let mut app = EguiApp::with_context(egui::Context::default(), Config::default());
        assert_eq!(app.apply(Command::Open(log_path.clone())), crate::Outcome::Applied);
        app.shell.options_mut().stride = 12;
        save_json(&app, Some(&session_path)).unwrap();

        let mut restored = EguiApp::with_context(egui::Context::default(), Config::default());
        load_json(&mut restored, Some(&session_path)).unwrap();
        assert_eq!(restored.shell.loaded_path(), Some(log_path.as_path()));
        assert_eq!(restored.shell.options().stride, 12);
        assert_eq!(restored.config.stride, 12);
    }
}
