use app_core::string_error::ErrorStringExt;
use flight_log::{LoadOptions, SchemaPolicy};
use std::{
    io::Read,
    path::{Path, PathBuf},
};

use crate::{playback::PausePolicy, shell::ShellOptions};

pub const CONFIG_FILE: &str = ".flightdash";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub stride: usize,
    pub fly_through_stride: usize,
    /// Minimum time between two playback ticks. 0 ticks every frame.
    pub tick_interval_ms: u64,
    pub log_file: PathBuf,
    pub log_level: String,
    pub schema: SchemaPolicy,
    pub fill_leading_gps: bool,
    pub pause_policy: PausePolicy,
}

impl Default for Config {
    fn default() -> Self {
        let shell = ShellOptions::default();
        Self {
            stride: shell.stride,
            fly_through_stride: shell.fly_through_stride,
            tick_interval_ms: 0,
            log_file: PathBuf::from("flightdash.log"),
            log_level: "info".to_string(),
            schema: shell.load.schema,
            fill_leading_gps: shell.load.fill_leading_gps,
            pause_policy: shell.pause_policy,
        }
    }
}

impl Config {
    /// Read `path`, or `~/.flightdash` if `None`. Problems with single
    /// entries do not fail the whole file, they are returned as messages
    /// next to the config, since the logger is not set up at this point.
    pub fn from_config_file(path: Option<&Path>) -> Result<(Self, Vec<String>), String> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let Some(home) = dirs::home_dir() else {
                    return Err("could not determine home directory to load config file".into());
                };
                home.join(CONFIG_FILE)
            }
        };
        let config_raw = {
            let mut file =
                std::fs::File::open(&path).err_to_string("could not open config file")?;
            let mut buf = String::new();
            file.read_to_string(&mut buf)
                .err_to_string("could not load config file")?;
            buf
        };
        Ok(Self::parse(&config_raw))
    }

    /// Parse `key=value` lines. Bad values keep the default.
    pub fn parse(text: &str) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut problems = Vec::new();
        for line in text.lines().map(str::trim) {
            // Lines starting with "#" are considered comments.
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                problems.push(format!("ignoring config line without '=': {line:?}"));
                continue;
            };
            let (key, val) = (key.trim(), val.trim());
            let parsed = match key {
                "stride" => val.parse().map(|v| config.stride = v).is_ok(),
                "fly_through_stride" => val.parse().map(|v| config.fly_through_stride = v).is_ok(),
                "tick_interval_ms" => val.parse().map(|v| config.tick_interval_ms = v).is_ok(),
                "log_file" => {
                    config.log_file = PathBuf::from(val);
                    !val.is_empty()
                }
                "log_level" => {
                    config.log_level = val.to_string();
                    true
                }
                "schema" => match val {
                    "strict" => {
                        config.schema = SchemaPolicy::Strict;
                        true
                    }
                    "lenient" => {
                        config.schema = SchemaPolicy::Lenient;
                        true
                    }
                    _ => false,
                },
                "fill_leading_gps" => val.parse().map(|v| config.fill_leading_gps = v).is_ok(),
                "pause_policy" => match val {
                    "all" => {
                        config.pause_policy = PausePolicy::All;
                        true
                    }
                    "none" => {
                        config.pause_policy = PausePolicy::None;
                        true
                    }
                    _ => false,
                },
                _ => {
                    problems.push(format!("unknown config key '{key}'"));
                    continue;
                }
            };
            if !parsed {
                problems.push(format!("could not parse '{key}' from {val:?}"));
            }
        }
        if config.log_file.as_os_str().is_empty() {
            config.log_file = Self::default().log_file;
        }
        (config, problems)
    }

    pub fn shell_options(&self) -> ShellOptions {
        ShellOptions {
            stride: self.stride,
            fly_through_stride: self.fly_through_stride,
            load: LoadOptions {
                schema: self.schema,
                fill_leading_gps: self.fill_leading_gps,
            },
            pause_policy: self.pause_policy,
        }
    }

    /// Preferences editor. Returns true if anything changed.
    pub fn render(&mut self, ui: &mut egui::Ui) -> bool {
        let before = self.clone();
        egui::Grid::new("preferences").num_columns(2).show(ui, |ui| {
            ui.label("Stride");
            ui.add(egui::DragValue::new(&mut self.stride).range(1..=1000));
            ui.end_row();

            ui.label("Fly-through stride");
            ui.add(egui::DragValue::new(&mut self.fly_through_stride).range(1..=1000));
            ui.end_row();

            ui.label("Tick interval (ms)");
            ui.add(egui::DragValue::new(&mut self.tick_interval_ms).range(0..=1000));
            ui.end_row();

            ui.label("Redraw while paused");
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.pause_policy, PausePolicy::All, "all panels");
                ui.selectable_value(&mut self.pause_policy, PausePolicy::None, "none");
            });
            ui.end_row();

            ui.label("Column check");
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.schema, SchemaPolicy::Strict, "strict");
                ui.selectable_value(&mut self.schema, SchemaPolicy::Lenient, "lenient");
            });
            ui.end_row();

            ui.label("Fill missing GPS fix");
            ui.checkbox(&mut self.fill_leading_gps, "");
            ui.end_row();
        });
        ui.label(format!(
            "Log file {:?} at level '{}' (applies on restart)",
            self.log_file, self.log_level
        ));
        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let text = "# replay settings\n\
            stride = 10\n\
            fly_through_stride=40\n\
            tick_interval_ms=50\n\
            log_file=/tmp/flight.log\n\
            schema=lenient\n\
            fill_leading_gps=false\n\
            pause_policy=none\n";
        let (config, problems) = Config::parse(text);
        assert!(problems.is_empty(), "{problems:?}");
        assert_eq!(config.stride, 10);
        assert_eq!(config.fly_through_stride, 40);
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.log_file, PathBuf::from("/tmp/flight.log"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.schema, SchemaPolicy::Lenient);
        assert!(!config.fill_leading_gps);
        assert_eq!(config.pause_policy, PausePolicy::None);

        let options = config.shell_options();
        assert_eq!(options.stride, 10);
        assert_eq!(options.load.schema, SchemaPolicy::Lenient);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let (config, problems) = Config::parse("stride=fast\nschema=loose\ncolor=red\nnonsense\n");
        assert_eq!(config, Config::default());
        assert_eq!(problems.len(), 4);
    }

    #[test]
    fn test_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "stride=7\n").unwrap();
        let (config, _) = Config::from_config_file(Some(&path)).unwrap();
        assert_eq!(config.stride, 7);

        assert!(Config::from_config_file(Some(&dir.path().join("missing"))).is_err());
    }
}
