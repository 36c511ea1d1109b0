/// Outcome of applying an event once.
///
/// Events that wait for something outside the GUI thread (a file dialog, for
/// example) report `Busy` and are applied again on the next frame.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EventState {
    Finished,
    Busy,
}

pub trait AppEvent {
    type App;
    fn apply(&mut self, app: &mut Self::App) -> Result<EventState, String>;
}
