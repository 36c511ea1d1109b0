use std::{path::PathBuf, thread::JoinHandle};

use derive_new::new;

use super::{
    storage::{load_json, save_json},
    EguiApp,
};
use crate::shell::Command;
use app_core::event::{AppEvent, EventState};

// ---------------------------------------------------------------------------
//
//
// EventQueue
//
//
// ---------------------------------------------------------------------------

/// The EventQueue stores events that are processed each iteration
/// of the application GUI event loop.
pub struct EventQueue<EguiApp> {
    /// Stores events for later processing.
    queue: Vec<Box<dyn AppEvent<App = EguiApp>>>,
    /// Temporarily stores events that have not yet finished running.
    tmp_backlog: Vec<Box<dyn AppEvent<App = EguiApp>>>,
}

impl<EguiApp> EventQueue<EguiApp> {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            tmp_backlog: Vec::new(),
        }
    }

    pub fn queue_event(&mut self, event: Box<dyn AppEvent<App = EguiApp>>) {
        self.queue.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.tmp_backlog.is_empty()
    }
}

impl EguiApp {
    pub fn run_events(&mut self) {
        // Fully drain all queued events.
        while let Some(mut event) = self.event_queue.queue.pop() {
            match event.apply(self) {
                Ok(EventState::Finished) => {
                    self.request_redraw();
                }
                Ok(EventState::Busy) => {
                    // Dialog still open, try again next frame.
                    self.event_queue.tmp_backlog.push(event);
                }
                Err(err) => {
                    log::error!("event failed: {}", err)
                }
            }
        }

        std::mem::swap(
            &mut self.event_queue.queue,
            &mut self.event_queue.tmp_backlog,
        );
    }
}

// ---------------------------------------------------------------------------
//
//
// Events
//
//
// ---------------------------------------------------------------------------

/// A file dialog to pick a flight log is open on another thread.
#[derive(new)]
pub struct OpenFileRequested {
    thread_handle: Option<JoinHandle<Option<PathBuf>>>,
}

/// Handles both, saving and loading the session, depending on whether
/// `should_save` is true or false.
#[derive(new)]
pub struct SaveLoadRequested {
    should_save: bool,
    thread_handle: Option<JoinHandle<Option<PathBuf>>>,
}

// ---------------------------------------------------------------------------
//
//
// apply()
//
//
// ---------------------------------------------------------------------------

/// State of a file dialog running on its own thread.
#[derive(Debug, PartialEq)]
enum Dialog {
    Open,
    Picked(PathBuf),
    Cancelled,
}

/// Join the dialog thread once it has finished.
fn poll_dialog(handle: &mut Option<JoinHandle<Option<PathBuf>>>) -> Result<Dialog, String> {
    let Some(handle) = handle.take_if(|handle| handle.is_finished()) else {
        return Ok(Dialog::Open);
    };
    match handle.join() {
        Ok(Some(path)) => Ok(Dialog::Picked(path)),
        Ok(None) => Ok(Dialog::Cancelled),
        Err(err) => Err(format!("file dialog failed: {:?}", err)),
    }
}

impl AppEvent for OpenFileRequested {
    type App = EguiApp;

    fn apply(&mut self, app: &mut Self::App) -> Result<EventState, String> {
        match poll_dialog(&mut self.thread_handle)? {
            Dialog::Open => return Ok(EventState::Busy),
            Dialog::Picked(path) => {
                app.apply(Command::Open(path));
            }
            Dialog::Cancelled => log::debug!("file dialog cancelled"),
        }
        Ok(EventState::Finished)
    }
}

impl AppEvent for SaveLoadRequested {
    type App = EguiApp;

    fn apply(&mut self, app: &mut Self::App) -> Result<EventState, String> {
        let path = match poll_dialog(&mut self.thread_handle)? {
            Dialog::Open => return Ok(EventState::Busy),
            Dialog::Picked(path) => path,
            Dialog::Cancelled => return Ok(EventState::Finished),
        };
        let (action, result) = if self.should_save {
            ("save session to", save_json(app, Some(path.as_path())))
        } else {
            ("load session from", load_json(app, Some(path.as_path())))
        };
        if let Err(err) = result {
            log::error!("unable to {} {:?}: {}", action, path, err);
        }
        Ok(EventState::Finished)
    }
}
