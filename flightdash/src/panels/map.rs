use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use blit::{Canvas, Color32, PlotTransform, Pos2, Scene};
use flight_log::DerivedSeries;

use super::{thin_path, Replay};

/// Semi-major axis of WGS 84, the sphere radius of EPSG:3857.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Latitude at which Web Mercator turns into a square.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Padding around the track, relative to its extent.
const PADDING: f64 = 0.1;
/// Smallest padding in meters, so a hover still shows some surroundings.
const MIN_PADDING_M: f64 = 25.0;
const FRAME_MARGIN: f32 = 4.0;
const GRATICULE_LINES: f64 = 6.0;

pub const BACKGROUND: Color32 = Color32::from_rgb(236, 239, 232);
const GRATICULE: Color32 = Color32::from_rgb(205, 211, 200);
const PATH: Color32 = Color32::from_gray(128);
const HOME: Color32 = Color32::from_rgb(214, 39, 40);
const DRONE: Color32 = Color32::from_rgb(31, 90, 200);

/// Project WGS 84 degrees `[lat, lon]` to Web Mercator meters `[x, y]`.
pub fn web_mercator([lat, lon]: [f64; 2]) -> [f64; 2] {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    [
        EARTH_RADIUS_M * lon.to_radians(),
        EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    ]
}

/// Inverse of [`web_mercator`].
pub fn inverse_web_mercator([x, y]: [f64; 2]) -> [f64; 2] {
    let lat = 2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2;
    [lat.to_degrees(), (x / EARTH_RADIUS_M).to_degrees()]
}

/// A round step (1, 2 or 5 times a power of ten) giving about `lines`
/// divisions of `span`.
pub fn nice_step(span: f64, lines: f64) -> f64 {
    if !(span > 0.0 && span.is_finite()) {
        return 1.0;
    }
    let raw = span / lines;
    let magnitude = 10_f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude)
}

/// Flight path with home point and the drone position.
pub struct MapScene {
    /// One entry per sample; `None` where the position cannot be projected.
    track: Vec<Option<[f64; 2]>>,
    min: [f64; 2],
    max: [f64; 2],
    drone: Option<[f64; 2]>,
}

impl MapScene {
    pub fn new(series: &DerivedSeries) -> Self {
        let track: Vec<Option<[f64; 2]>> = series
            .latitude
            .iter()
            .zip(&series.longitude)
            .map(|(lat, lon)| {
                let [x, y] = web_mercator([*lat, *lon]);
                (x.is_finite() && y.is_finite()).then_some([x, y])
            })
            .collect();
        let (min, max) = track.iter().flatten().fold(
            ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
            |(min, max), [x, y]| ([min[0].min(*x), min[1].min(*y)], [max[0].max(*x), max[1].max(*y)]),
        );
        Self {
            track,
            min,
            max,
            drone: None,
        }
    }

    /// Where the flight started, in Web Mercator meters.
    pub fn home(&self) -> Option<[f64; 2]> {
        self.track.first().copied().flatten()
    }

    pub fn drone(&self) -> Option<[f64; 2]> {
        self.drone
    }

    fn transform(&self, canvas: &Canvas) -> PlotTransform {
        let frame = canvas.rect().shrink(FRAME_MARGIN);
        let pad = |axis: usize| ((self.max[axis] - self.min[axis]) * PADDING).max(MIN_PADDING_M);
        let (px, py) = (pad(0), pad(1));
        PlotTransform::equal_aspect(
            frame,
            self.min[0] - px..=self.max[0] + px,
            self.min[1] - py..=self.max[1] + py,
        )
    }
}

impl Replay for MapScene {
    fn update(&mut self, index: usize) {
        if let Some(Some(position)) = self.track.get(index) {
            self.drone = Some(*position);
        }
    }
}

impl Scene for MapScene {
    fn draw_static(&self, canvas: &mut Canvas) {
        let transform = self.transform(canvas);
        draw_graticule(canvas, &transform);
        let path = thin_path(self.track.iter().flatten().map(|p| transform.to_screen(*p)));
        canvas.polyline(&path, 2.0, PATH);
        if let Some(home) = self.home() {
            canvas.fill_polygon(&star(transform.to_screen(home), 9.0), HOME);
        }
    }

    fn draw_overlay(&self, canvas: &mut Canvas) {
        let Some(drone) = self.drone else {
            return;
        };
        let center = self.transform(canvas).to_screen(drone);
        canvas.circle_filled(center, 8.0, Color32::WHITE);
        canvas.circle_filled(center, 6.0, DRONE);
    }
}

/// Meridians and parallels at round degree values over the visible area.
fn draw_graticule(canvas: &mut Canvas, transform: &PlotTransform) {
    let (x0, x1) = transform.x_range().into_inner();
    let (y0, y1) = transform.y_range().into_inner();
    let [lat0, lon0] = inverse_web_mercator([x0, y0]);
    let [lat1, lon1] = inverse_web_mercator([x1, y1]);

    let step = nice_step(lon1 - lon0, GRATICULE_LINES);
    for lon in multiples(lon0, lon1, step) {
        let [x, _] = web_mercator([0.0, lon]);
        canvas.line(transform.to_screen([x, y0]), transform.to_screen([x, y1]), 1.0, GRATICULE);
    }
    let step = nice_step(lat1 - lat0, GRATICULE_LINES);
    for lat in multiples(lat0, lat1, step) {
        let [_, y] = web_mercator([lat, 0.0]);
        canvas.line(transform.to_screen([x0, y]), transform.to_screen([x1, y]), 1.0, GRATICULE);
    }
}

fn multiples(from: f64, to: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (from / step).ceil() as i64;
    let last = (to / step).floor() as i64;
    (first..=last).map(move |k| k as f64 * step)
}

/// Five pointed star, pointing up.
fn star(center: Pos2, radius: f32) -> Vec<Pos2> {
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { radius * 0.4 };
            let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
            center + r * egui::vec2(angle.cos(), angle.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing;
    use blit::{MemorySurface, Panel, PresentKind};

    #[test]
    fn test_web_mercator() {
        let [x, y] = web_mercator([0.0, 0.0]);
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        let [x, y] = web_mercator([0.0, 180.0]);
        assert!((x - 20_037_508.342_789_244).abs() < 1e-6);
        assert!(y.abs() < 1e-6);

        let [lat, lon] = inverse_web_mercator(web_mercator([48.137, 11.575]));
        assert!((lat - 48.137).abs() < 1e-9);
        assert!((lon - 11.575).abs() < 1e-9);
    }

    #[test]
    fn test_nice_step() {
        assert_eq!(nice_step(0.0, 6.0), 1.0);
        assert!((nice_step(0.007, 6.0) - 0.002).abs() < 1e-15);
        assert!((nice_step(0.05, 6.0) - 0.01).abs() < 1e-15);
        assert!((nice_step(30.0, 6.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiples() {
        let values: Vec<f64> = multiples(0.15, 0.62, 0.2).collect();
        assert_eq!(values.len(), 3);
        assert!((values[0] - 0.2).abs() < 1e-12);
        assert!((values[2] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_home_is_first_sample() {
        let series = testing::series(5);
        let scene = MapScene::new(&series);
        assert_eq!(
            scene.home(),
            Some(web_mercator([series.latitude[0], series.longitude[0]]))
        );
        assert_eq!(scene.drone(), None);
    }

    #[test]
    fn test_drone_moves_over_cached_map() {
        let _ = env_logger::builder().is_test(true).try_init();
        let series = testing::series(40);
        let mut panel = Panel::new("map", MapScene::new(&series), [96, 96], MemorySurface::default())
            .with_background(BACKGROUND);
        panel.scene_mut().update(0);
        assert_eq!(panel.present(), PresentKind::Full);
        let background = panel.background().cloned();

        panel.scene_mut().update(39);
        assert_eq!(
            panel.scene().drone(),
            Some(web_mercator([series.latitude[39], series.longitude[39]]))
        );
        assert_eq!(panel.present(), PresentKind::Blit);
        assert_eq!(panel.background().cloned(), background);

        panel.scene_mut().update(40);
        assert_eq!(
            panel.scene().drone(),
            Some(web_mercator([series.latitude[39], series.longitude[39]]))
        );
    }

    #[test]
    fn test_unprojectable_sample_keeps_alignment() {
        let mut series = testing::series(6);
        series.latitude[1] = f64::NAN;
        let mut scene = MapScene::new(&series);

        scene.update(2);
        let sample_2 = web_mercator([series.latitude[2], series.longitude[2]]);
        assert_eq!(scene.drone(), Some(sample_2));

        scene.update(1);
        assert_eq!(scene.drone(), Some(sample_2));

        scene.update(5);
        assert_eq!(
            scene.drone(),
            Some(web_mercator([series.latitude[5], series.longitude[5]]))
        );
    }

    #[test]
    fn test_unprojectable_home() {
        let mut series = testing::series(3);
        series.longitude[0] = f64::INFINITY;
        let mut panel = Panel::new("map", MapScene::new(&series), [32, 32], MemorySurface::default());
        assert_eq!(panel.scene().home(), None);
        panel.scene_mut().update(0);
        assert_eq!(panel.scene().drone(), None);
        assert_eq!(panel.present(), PresentKind::Full);
    }

    #[test]
    fn test_single_point_track() {
        let series = testing::series(1);
        let mut panel = Panel::new("map", MapScene::new(&series), [32, 32], MemorySurface::default());
        panel.scene_mut().update(0);
        assert_eq!(panel.present(), PresentKind::Full);
    }
}
