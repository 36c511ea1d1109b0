//! The dashboard state machine: the loaded log, its panels and the playback,
//! driven by explicit [`Command`]s.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use app_core::logging::timed;
use flight_log::{load_flight_log, DerivedSeries, FlightLog, LoadOptions};

use crate::{
    panels::{PanelKind, PanelSet, SurfaceFactory},
    playback::{PausePolicy, Playback, PlaybackState, Tick},
};

pub const DEFAULT_PANEL_SIZE: [usize; 2] = [400, 300];

#[derive(Debug, Clone, PartialEq)]
pub struct ShellOptions {
    /// Samples advanced per tick.
    pub stride: usize,
    /// Samples advanced per tick when only the map is animated.
    pub fly_through_stride: usize,
    pub load: LoadOptions,
    pub pause_policy: PausePolicy,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            stride: 5,
            fly_through_stride: 20,
            load: LoadOptions::default(),
            pause_policy: PausePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the current log with the one at the path.
    Open(PathBuf),
    /// Play all panels from the first sample.
    Run,
    /// Toggle pause of the running playback.
    Pause,
    Stop,
    /// Play only the map.
    FlyThrough,
    Resize(PanelKind, [usize; 2]),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The command had no effect in the current state.
    Ignored,
}

/// Values shown in the status line.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub file_name: String,
    pub index: usize,
    pub len: usize,
    pub time_s: f64,
    pub datetime: Option<String>,
    pub height_m: f64,
    pub speed_kmh: f64,
    pub distance_m: f64,
    pub satellites: Option<u32>,
    pub battery_percent: Option<f64>,
    pub flight_mode: Option<String>,
    pub state: Option<PlaybackState>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}/{}] t = {:.1} s",
            self.file_name,
            self.index + 1,
            self.len,
            self.time_s
        )?;
        if let Some(datetime) = &self.datetime {
            write!(f, " ({datetime})")?;
        }
        write!(
            f,
            " | height {:.1} m | speed {:.1} km/h | distance {:.0} m",
            self.height_m, self.speed_kmh, self.distance_m
        )?;
        if let Some(satellites) = self.satellites {
            write!(f, " | {satellites} sats")?;
        }
        if let Some(battery) = self.battery_percent {
            write!(f, " | battery {battery:.0} %")?;
        }
        if let Some(mode) = &self.flight_mode {
            write!(f, " | {mode}")?;
        }
        match self.state {
            Some(PlaybackState::Running) => write!(f, " | running"),
            Some(PlaybackState::Paused) => write!(f, " | paused"),
            Some(PlaybackState::Stopped) | None => Ok(()),
        }
    }
}

struct Session {
    path: PathBuf,
    log: FlightLog,
    series: DerivedSeries,
    panels: PanelSet,
    playback: Option<Playback>,
    shown: usize,
}

impl Session {
    fn live_playback(&self) -> Option<&Playback> {
        self.playback.as_ref().filter(|playback| playback.is_live())
    }

    /// Whether the next tick presents panel `kind` anyway.
    fn presents_next_tick(&self, kind: PanelKind, policy: PausePolicy) -> bool {
        self.live_playback().is_some_and(|playback| {
            playback.active().contains(&kind)
                && (playback.state() == PlaybackState::Running || policy == PausePolicy::All)
        })
    }
}

pub struct DashboardShell<F> {
    options: ShellOptions,
    factory: F,
    sizes: [[usize; 2]; 3],
    session: Option<Session>,
    should_quit: bool,
}

impl<F: SurfaceFactory> DashboardShell<F> {
    pub fn new(options: ShellOptions, factory: F) -> Self {
        Self {
            options,
            factory,
            sizes: [DEFAULT_PANEL_SIZE; 3],
            session: None,
            should_quit: false,
        }
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// Changes take effect with the next run or load.
    pub fn options_mut(&mut self) -> &mut ShellOptions {
        &mut self.options
    }

    pub fn panel_size(&self, kind: PanelKind) -> [usize; 2] {
        self.sizes[kind.index()]
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn loaded_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|session| session.path.as_path())
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.session
            .as_ref()
            .and_then(|session| session.playback.as_ref())
            .map(Playback::state)
    }

    /// Running or paused.
    pub fn is_live(&self) -> bool {
        self.session
            .as_ref()
            .and_then(Session::live_playback)
            .is_some()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        log::debug!("applying command {:?}", command);
        let outcome = match command {
            Command::Open(path) => self.open(&path),
            Command::Run => self.start(self.options.stride, &PanelKind::ALL),
            Command::FlyThrough => self.start(self.options.fly_through_stride, &[PanelKind::Map]),
            Command::Pause => self.toggle_pause(),
            Command::Stop => self.stop(),
            Command::Resize(kind, size) => self.resize(kind, size),
            Command::Quit => {
                self.stop();
                self.should_quit = true;
                Outcome::Applied
            }
        };
        if outcome == Outcome::Ignored {
            log::debug!("command had no effect");
        }
        outcome
    }

    /// One cooperative playback step. `None` if nothing was ever started.
    pub fn tick(&mut self) -> Option<Tick> {
        let policy = self.options.pause_policy;
        let session = self.session.as_mut()?;
        let playback = session.playback.as_mut()?;
        let tick = playback.tick(&mut session.panels, policy);
        if let Tick::Advanced(index) = tick {
            session.shown = index;
        }
        Some(tick)
    }

    pub fn status(&self) -> Option<Status> {
        let session = self.session.as_ref()?;
        let index = session.shown;
        let sample = session.log.sample(index)?;
        let series = &session.series;
        Some(Status {
            file_name: session
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            index,
            len: session.log.len(),
            time_s: series.time_s[index],
            datetime: sample.datetime.map(str::to_owned),
            height_m: series.height_m[index],
            speed_kmh: series.speed_kmh[index],
            distance_m: series.distance_m[index],
            satellites: sample.satellites,
            battery_percent: sample.battery_percent,
            flight_mode: sample.flight_mode.map(str::to_owned),
            state: session.playback.as_ref().map(Playback::state),
        })
    }

    fn open(&mut self, path: &Path) -> Outcome {
        let Some(log) = load_flight_log(path, &self.options.load) else {
            return Outcome::Ignored;
        };
        let series = timed("derive series", || DerivedSeries::from(&log));

        // Release the old panels before new surfaces are handed out.
        self.session = None;
        let (sizes, factory) = (self.sizes, &mut self.factory);
        let mut panels = timed("build panels", || PanelSet::build(&series, sizes, factory));
        panels.advance(0, &PanelKind::ALL);

        log::info!("opened {:?} with {} samples", path, log.len());
        self.session = Some(Session {
            path: path.to_path_buf(),
            log,
            series,
            panels,
            playback: None,
            shown: 0,
        });
        Outcome::Applied
    }

    fn start(&mut self, stride: usize, active: &[PanelKind]) -> Outcome {
        let Some(session) = self.session.as_mut() else {
            log::warn!("nothing to play, open a flight log first");
            return Outcome::Ignored;
        };
        if session.live_playback().is_some() {
            return Outcome::Ignored;
        }
        log::info!(
            "starting playback of {:?} with stride {}",
            active.iter().map(|kind| kind.name()).collect::<Vec<_>>(),
            stride
        );
        session.playback = Some(Playback::new(session.log.len(), stride, active));
        Outcome::Applied
    }

    fn toggle_pause(&mut self) -> Outcome {
        let Some(playback) = self
            .session
            .as_mut()
            .and_then(|session| session.playback.as_mut())
            .filter(|playback| playback.is_live())
        else {
            return Outcome::Ignored;
        };
        let paused = playback.toggle_pause();
        log::info!("playback {}", if paused { "paused" } else { "resumed" });
        Outcome::Applied
    }

    fn stop(&mut self) -> Outcome {
        let Some(playback) = self
            .session
            .as_mut()
            .and_then(|session| session.playback.as_mut())
            .filter(|playback| playback.is_live())
        else {
            return Outcome::Ignored;
        };
        playback.stop();
        log::info!("playback stopped");
        Outcome::Applied
    }

    fn resize(&mut self, kind: PanelKind, size: [usize; 2]) -> Outcome {
        let size = [size[0].max(1), size[1].max(1)];
        if self.sizes[kind.index()] == size {
            return Outcome::Ignored;
        }
        self.sizes[kind.index()] = size;
        let policy = self.options.pause_policy;
        if let Some(session) = self.session.as_mut() {
            let redraw = !session.presents_next_tick(kind, policy);
            let panel = session.panels.get_mut(kind);
            if panel.resize(size) && redraw {
                panel.present();
            }
        }
        Outcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::panels::testing::HeadlessSurfaces;

    const HEADER: &str = "time(millisecond),latitude,longitude,height_above_takeoff(feet),\
        speed(mph),distance(feet),rc_throttle,rc_rudder,rc_elevator,rc_aileron";

    fn write_log(samples: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for i in 0..samples {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{}",
                i * 100,
                48.137 + i as f64 * 1e-5,
                11.575 + i as f64 * 2e-5,
                i as f64 * 3.0,
                10.0,
                i as f64 * 5.0,
                1024 + (i % 600) as i32,
                1024,
                1024 - (i % 600) as i32,
                1024
            )
            .unwrap();
        }
        file
    }

    fn shell(stride: usize) -> DashboardShell<HeadlessSurfaces> {
        let _ = env_logger::builder().is_test(true).try_init();
        let options = ShellOptions {
            stride,
            fly_through_stride: 4,
            ..Default::default()
        };
        let mut shell = DashboardShell::new(options, HeadlessSurfaces::default());
        for kind in PanelKind::ALL {
            shell.apply(Command::Resize(kind, [64, 48]));
        }
        shell
    }

    fn run_to_end(shell: &mut DashboardShell<HeadlessSurfaces>) -> Vec<usize> {
        let mut shown = Vec::new();
        while let Some(Tick::Advanced(index)) = shell.tick() {
            shown.push(index);
        }
        shown
    }

    #[test]
    fn test_open_presents_first_sample() {
        let file = write_log(30);
        let mut shell = shell(10);
        assert_eq!(shell.apply(Command::Open(file.path().into())), Outcome::Applied);
        assert_eq!(shell.loaded_path(), Some(file.path()));
        assert_eq!(shell.factory().created(), 3);
        for kind in PanelKind::ALL {
            assert_eq!(shell.factory().flushes(kind), 1);
        }

        let status = shell.status().unwrap();
        assert_eq!(status.index, 0);
        assert_eq!(status.len, 30);
        assert_eq!(status.state, None);
        assert_eq!(shell.tick(), None);
    }

    #[test]
    fn test_failed_open_keeps_current_log() {
        let good = write_log(10);
        let mut shell = shell(1);
        assert_eq!(shell.apply(Command::Open("/no/such/flight.csv".into())), Outcome::Ignored);
        assert!(shell.status().is_none());

        shell.apply(Command::Open(good.path().into()));
        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "time(millisecond),latitude\n0,48.1").unwrap();
        assert_eq!(shell.apply(Command::Open(bad.path().into())), Outcome::Ignored);
        assert_eq!(shell.loaded_path(), Some(good.path()));
        assert_eq!(shell.factory().created(), 3);
    }

    #[test]
    fn test_run_needs_log() {
        let mut shell = shell(1);
        assert_eq!(shell.apply(Command::Run), Outcome::Ignored);
        assert_eq!(shell.apply(Command::Pause), Outcome::Ignored);
        assert_eq!(shell.apply(Command::Stop), Outcome::Ignored);
        assert_eq!(shell.tick(), None);
    }

    #[test]
    fn test_run_to_end_and_restart() {
        let file = write_log(100);
        let mut shell = shell(10);
        shell.apply(Command::Open(file.path().into()));

        assert_eq!(shell.apply(Command::Run), Outcome::Applied);
        assert_eq!(shell.apply(Command::Run), Outcome::Ignored);
        assert_eq!(run_to_end(&mut shell), (0..=90).step_by(10).collect::<Vec<_>>());
        assert_eq!(shell.playback_state(), Some(PlaybackState::Stopped));
        assert_eq!(shell.status().unwrap().index, 90);
        // One present on open plus one per tick.
        for kind in PanelKind::ALL {
            assert_eq!(shell.factory().flushes(kind), 11);
        }

        assert_eq!(shell.apply(Command::Run), Outcome::Applied);
        assert_eq!(shell.tick(), Some(Tick::Advanced(0)));
    }

    #[test]
    fn test_pause_and_stop() {
        let file = write_log(50);
        let mut shell = shell(5);
        shell.apply(Command::Open(file.path().into()));
        shell.apply(Command::Run);
        shell.tick();
        shell.tick();

        assert_eq!(shell.apply(Command::Pause), Outcome::Applied);
        let before = shell.factory().flushes(PanelKind::Graphs);
        assert_eq!(shell.tick(), Some(Tick::Held(Some(5))));
        assert_eq!(shell.tick(), Some(Tick::Held(Some(5))));
        assert_eq!(shell.factory().flushes(PanelKind::Graphs), before + 2);
        assert_eq!(shell.status().unwrap().state, Some(PlaybackState::Paused));

        shell.apply(Command::Pause);
        assert_eq!(shell.tick(), Some(Tick::Advanced(10)));

        assert_eq!(shell.apply(Command::Stop), Outcome::Applied);
        assert_eq!(shell.tick(), Some(Tick::Finished));
        assert!(!shell.is_live());
        assert_eq!(shell.apply(Command::Pause), Outcome::Ignored);
    }

    #[test]
    fn test_fly_through_only_moves_map() {
        let file = write_log(20);
        let mut shell = shell(1);
        shell.apply(Command::Open(file.path().into()));
        assert_eq!(shell.apply(Command::FlyThrough), Outcome::Applied);
        assert_eq!(run_to_end(&mut shell), vec![0, 4, 8, 12, 16]);

        assert_eq!(shell.factory().flushes(PanelKind::Map), 6);
        assert_eq!(shell.factory().flushes(PanelKind::Controls), 1);
        assert_eq!(shell.factory().flushes(PanelKind::Graphs), 1);
    }

    #[test]
    fn test_resize_redraws_idle_panel() {
        let file = write_log(10);
        let mut shell = shell(1);
        shell.apply(Command::Open(file.path().into()));

        assert_eq!(shell.apply(Command::Resize(PanelKind::Map, [64, 48])), Outcome::Ignored);
        assert_eq!(shell.apply(Command::Resize(PanelKind::Map, [80, 80])), Outcome::Applied);
        assert_eq!(shell.factory().flushes(PanelKind::Map), 2);
        assert_eq!(shell.factory().flushes(PanelKind::Controls), 1);

        // While running the next tick takes care of it.
        shell.apply(Command::Run);
        shell.apply(Command::Resize(PanelKind::Map, [90, 90]));
        assert_eq!(shell.factory().flushes(PanelKind::Map), 2);
        shell.tick();
        assert_eq!(shell.factory().flushes(PanelKind::Map), 3);
    }

    #[test]
    fn test_quit_stops_playback() {
        let file = write_log(10);
        let mut shell = shell(1);
        shell.apply(Command::Open(file.path().into()));
        shell.apply(Command::Run);
        assert_eq!(shell.apply(Command::Quit), Outcome::Applied);
        assert!(shell.should_quit());
        assert_eq!(shell.tick(), Some(Tick::Finished));
    }

    #[test]
    fn test_status_line() {
        let file = write_log(10);
        let mut shell = shell(3);
        shell.apply(Command::Open(file.path().into()));
        shell.apply(Command::Run);
        shell.tick();
        shell.tick();

        let status = shell.status().unwrap();
        assert_eq!(status.index, 3);
        assert!((status.time_s - 0.3).abs() < 1e-9);
        assert!((status.height_m - 9.0 * 0.3048).abs() < 1e-9);
        assert!((status.speed_kmh - 16.0934).abs() < 1e-9);
        let line = status.to_string();
        assert!(line.contains("[4/10]"), "{line}");
        assert!(line.ends_with("| running"), "{line}");
    }
}
