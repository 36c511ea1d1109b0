//! This module defines the `Storage` type which wraps the session state of
//! the app and provides methods to store/load it to/from a JSON file.

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::path::{Path, PathBuf};

use super::string_error::ErrorStringExt;

pub const STORAGE_FILE: &str = "./.flightdash_session.json";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Storage<S> {
    pub session: S,
}

impl<S> Storage<S>
where
    for<'a> S: Serialize + Deserialize<'a>,
{
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn save_json(&self, input_path: Option<&Path>) -> Result<(), String> {
        let output_path = resolve(input_path);
        let file =
            std::fs::File::create(&output_path).err_to_string("could not open storage file")?;
        to_writer_pretty(file, &self).err_to_string("could not save app state to json")?;
        log::debug!("saved app state to file {:?}", output_path.canonicalize());
        Ok(())
    }

    pub fn load_json(input_path: Option<&Path>) -> Result<Storage<S>, String> {
        let input_path = resolve(input_path);
        let file = std::fs::File::open(&input_path).err_to_string("could not open storage file")?;
        let storage =
            from_reader(file).err_to_string("could not load app state from storage file")?;
        log::debug!("loaded app state from file {:?}", input_path);
        Ok(storage)
    }
}

fn resolve(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(STORAGE_FILE))
}
