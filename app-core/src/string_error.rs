use std::fmt::Display;

/// Collapse any displayable error into the `String` errors used across the
/// app layer, prefixed with a short description of what was attempted.
pub trait ErrorStringExt<T> {
    fn err_to_string(self, msg: &str) -> Result<T, String>;
}

impl<T, E: Display> ErrorStringExt<T> for Result<T, E> {
    fn err_to_string(self, msg: &str) -> Result<T, String> {
        self.map_err(|err| format!("{msg}: {err}"))
    }
}
