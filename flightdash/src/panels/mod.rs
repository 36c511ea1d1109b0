//! The three replay displays and the set that drives them together.

pub mod controls;
pub mod graphs;
pub mod map;

use blit::{Panel, PresentKind, Scene, Surface};
use egui::Pos2;
use flight_log::DerivedSeries;

pub use controls::ControlsScene;
pub use graphs::GraphsScene;
pub use map::MapScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Controls,
    Graphs,
    Map,
}

impl PanelKind {
    /// All panels, in the order they are updated and presented.
    pub const ALL: [PanelKind; 3] = [PanelKind::Controls, PanelKind::Graphs, PanelKind::Map];

    pub fn name(self) -> &'static str {
        match self {
            PanelKind::Controls => "controls",
            PanelKind::Graphs => "graphs",
            PanelKind::Map => "map",
        }
    }

    pub fn index(self) -> usize {
        match self {
            PanelKind::Controls => 0,
            PanelKind::Graphs => 1,
            PanelKind::Map => 2,
        }
    }
}

/// A scene whose overlay follows the playback index.
///
/// `update` only touches overlay state: it must not change anything drawn by
/// [`Scene::draw_static`], and calling it twice with the same index is the
/// same as calling it once. Indices past the end leave the overlay as is.
pub trait Replay: Scene {
    fn update(&mut self, index: usize);
}

/// Object safe view on a [`Panel`] as the playback sees it.
pub trait Animated {
    fn update(&mut self, index: usize);
    fn present(&mut self) -> PresentKind;
    fn resize(&mut self, size: [usize; 2]) -> bool;
    fn is_cached(&self) -> bool;
}

impl<S: Replay, O: Surface> Animated for Panel<S, O> {
    fn update(&mut self, index: usize) {
        self.scene_mut().update(index);
    }

    fn present(&mut self) -> PresentKind {
        Panel::present(self)
    }

    fn resize(&mut self, size: [usize; 2]) -> bool {
        Panel::resize(self, size)
    }

    fn is_cached(&self) -> bool {
        Panel::is_cached(self)
    }
}

/// Hands out the surface a newly built panel presents to.
pub trait SurfaceFactory {
    fn create(&mut self, kind: PanelKind) -> Box<dyn Surface>;
}

/// The controls, graphs and map panel of one loaded log.
pub struct PanelSet {
    panels: [Box<dyn Animated>; 3],
}

impl PanelSet {
    pub fn new(
        controls: Box<dyn Animated>,
        graphs: Box<dyn Animated>,
        map: Box<dyn Animated>,
    ) -> Self {
        Self {
            panels: [controls, graphs, map],
        }
    }

    /// Build all three panels from `series`, uncached. `sizes` is indexed by
    /// [`PanelKind::index`].
    pub fn build(
        series: &DerivedSeries,
        sizes: [[usize; 2]; 3],
        factory: &mut dyn SurfaceFactory,
    ) -> Self {
        let kind = PanelKind::Controls;
        let controls = Panel::new(
            kind.name(),
            ControlsScene::new(series),
            sizes[kind.index()],
            factory.create(kind),
        );
        let kind = PanelKind::Graphs;
        let graphs = Panel::new(
            kind.name(),
            GraphsScene::new(series),
            sizes[kind.index()],
            factory.create(kind),
        );
        let kind = PanelKind::Map;
        let map = Panel::new(
            kind.name(),
            MapScene::new(series),
            sizes[kind.index()],
            factory.create(kind),
        )
        .with_background(map::BACKGROUND);
        Self::new(Box::new(controls), Box::new(graphs), Box::new(map))
    }

    pub fn get_mut(&mut self, kind: PanelKind) -> &mut dyn Animated {
        self.panels[kind.index()].as_mut()
    }

    /// Show sample `index` on every panel in `active`: update, then present,
    /// in [`PanelKind::ALL`] order. Returns the number of presents.
    pub fn advance(&mut self, index: usize, active: &[PanelKind]) -> usize {
        self.for_active(active, |panel| {
            panel.update(index);
            panel.present();
        })
    }

    /// Present the active panels again without moving the overlays.
    pub fn hold(&mut self, active: &[PanelKind]) -> usize {
        self.for_active(active, |panel| {
            panel.present();
        })
    }

    fn for_active(&mut self, active: &[PanelKind], mut f: impl FnMut(&mut dyn Animated)) -> usize {
        let mut count = 0;
        for kind in PanelKind::ALL.into_iter().filter(|kind| active.contains(kind)) {
            f(self.get_mut(kind));
            count += 1;
        }
        count
    }
}

/// Drop consecutive points that land on the same pixel.
pub(crate) fn thin_path(points: impl Iterator<Item = Pos2>) -> Vec<Pos2> {
    let mut path: Vec<Pos2> = Vec::new();
    for p in points {
        match path.last() {
            Some(last) if (last.x - p.x).abs() < 0.5 && (last.y - p.y).abs() < 0.5 => {}
            _ => path.push(p),
        }
    }
    path
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::Cell, rc::Rc};

    use blit::{ColorImage, MemorySurface, Surface};
    use flight_log::DerivedSeries;

    use super::{PanelKind, SurfaceFactory};

    /// Surfaces that keep frames in memory, for running without a window.
    /// Counts the flushes of each panel.
    #[derive(Debug, Default)]
    pub(crate) struct HeadlessSurfaces {
        created: usize,
        flushes: [Rc<Cell<usize>>; 3],
    }

    impl HeadlessSurfaces {
        pub(crate) fn created(&self) -> usize {
            self.created
        }

        pub(crate) fn flushes(&self, kind: PanelKind) -> usize {
            self.flushes[kind.index()].get()
        }
    }

    impl SurfaceFactory for HeadlessSurfaces {
        fn create(&mut self, kind: PanelKind) -> Box<dyn Surface> {
            self.created += 1;
            Box::new(CountingSurface {
                inner: MemorySurface::default(),
                flushes: self.flushes[kind.index()].clone(),
            })
        }
    }

    struct CountingSurface {
        inner: MemorySurface,
        flushes: Rc<Cell<usize>>,
    }

    impl Surface for CountingSurface {
        fn flush(&mut self, image: &ColorImage) {
            self.inner.flush(image);
            self.flushes.set(self.flushes.get() + 1);
        }
    }

    /// A synthetic climb-and-cruise flight with `n` samples, one per second.
    pub(crate) fn series(n: usize) -> DerivedSeries {
        let ramp = |scale: f64| -> Vec<f64> { (0..n).map(|i| i as f64 * scale).collect() };
        let wave = |phase: f64| -> Vec<f64> {
            (0..n)
                .map(|i| 100.0 * (i as f64 * 0.1 + phase).sin())
                .collect()
        };
        DerivedSeries {
            time_s: ramp(1.0),
            height_m: ramp(0.5),
            speed_kmh: wave(0.0).iter().map(|v| v.abs() * 0.3).collect(),
            distance_m: ramp(4.0),
            latitude: ramp(1e-5).iter().map(|v| 48.137 + v).collect(),
            longitude: ramp(2e-5).iter().map(|v| 11.575 + v).collect(),
            throttle: wave(0.0),
            rudder: wave(1.0),
            elevator: wave(2.0),
            aileron: wave(3.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::HeadlessSurfaces;
    use super::*;

    #[test]
    fn test_build_presents_every_panel() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut factory = HeadlessSurfaces::default();
        let series = testing::series(30);
        let mut panels = PanelSet::build(&series, [[120, 60], [80, 90], [64, 64]], &mut factory);
        assert_eq!(factory.created(), 3);

        assert_eq!(panels.advance(0, &PanelKind::ALL), 3);
        assert!(PanelKind::ALL
            .into_iter()
            .all(|kind| panels.get_mut(kind).is_cached()));
        assert_eq!(panels.hold(&[PanelKind::Map]), 1);
        assert_eq!(factory.flushes(PanelKind::Controls), 1);
        assert_eq!(factory.flushes(PanelKind::Map), 2);
    }

    #[test]
    fn test_thin_path() {
        let points = [
            egui::pos2(0.0, 0.0),
            egui::pos2(0.2, 0.1),
            egui::pos2(1.0, 0.0),
            egui::pos2(1.1, 0.3),
            egui::pos2(5.0, 5.0),
        ];
        let path = thin_path(points.into_iter());
        assert_eq!(
            path,
            vec![egui::pos2(0.0, 0.0), egui::pos2(1.0, 0.0), egui::pos2(5.0, 5.0)]
        );
    }
}
