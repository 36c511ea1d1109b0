use blit::{Canvas, Color32, PlotTransform, Pos2, Rect, Scene};
use egui::Vec2;
use flight_log::DerivedSeries;

use super::Replay;

/// Radius of the polar grid, in percent of stick deflection.
pub const RMAX: f64 = 120.0;
const CARTH_OFFS: f64 = 0.09;
const POLAR_OFFS: f64 = 0.12;
/// Half width of the cartesian axes. The polar grid sits inside the
/// cartesian frame, so the axes extend further than [`RMAX`].
pub const XYMAX: f64 = RMAX * (1.0 - 2.0 * CARTH_OFFS) / (1.0 - 2.0 * CARTH_OFFS - 2.0 * POLAR_OFFS);
pub const TICK_INTERVAL: f64 = 50.0;

/// Stick tip radius in data units.
const TIP_RADIUS: f64 = 6.0;
const FRAME_MARGIN: f32 = 0.06;
const TICK_LENGTH: f32 = 5.0;

const AXES: Color32 = Color32::from_gray(40);
const GRID: Color32 = Color32::from_gray(210);
const STICK: Color32 = Color32::from_rgb(31, 119, 180);
const TIP: Color32 = Color32::from_rgb(214, 39, 40);
const BAR: Color32 = Color32::from_rgb(255, 127, 14);

/// Everything drawn for one stick at one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickGeometry {
    /// Angle of the deflection in degrees, counter clockwise from +x.
    pub theta_deg: f64,
    pub r: f64,
    pub tip: [f64; 2],
    pub bar_x: [[f64; 2]; 2],
    pub bar_y: [[f64; 2]; 2],
}

impl StickGeometry {
    pub fn from_deflection(x: f64, y: f64) -> Self {
        Self {
            theta_deg: y.atan2(x).to_degrees(),
            r: (x * x + y * y).sqrt(),
            tip: [x, y],
            bar_x: [[0.0, -XYMAX], [x, -XYMAX]],
            bar_y: [[-XYMAX, 0.0], [-XYMAX, y]],
        }
    }

    /// End of the stick line, taken from the polar representation.
    pub fn stick_end(&self) -> [f64; 2] {
        let theta = self.theta_deg.to_radians();
        [self.r * theta.cos(), self.r * theta.sin()]
    }
}

/// Two sticks side by side: climb/yaw on the left, pitch/roll on the right.
pub struct ControlsScene {
    yaw: Vec<f64>,
    climb: Vec<f64>,
    roll: Vec<f64>,
    pitch: Vec<f64>,
    left: StickGeometry,
    right: StickGeometry,
}

impl ControlsScene {
    pub const TITLES: [&'static str; 2] = ["climb / yaw", "pitch / roll"];

    pub fn new(series: &DerivedSeries) -> Self {
        Self {
            yaw: series.rudder.clone(),
            climb: series.throttle.clone(),
            roll: series.aileron.clone(),
            pitch: series.elevator.clone(),
            left: StickGeometry::from_deflection(0.0, 0.0),
            right: StickGeometry::from_deflection(0.0, 0.0),
        }
    }

    pub fn left(&self) -> &StickGeometry {
        &self.left
    }

    pub fn right(&self) -> &StickGeometry {
        &self.right
    }
}

impl Replay for ControlsScene {
    fn update(&mut self, index: usize) {
        let left = self.yaw.get(index).zip(self.climb.get(index));
        let right = self.roll.get(index).zip(self.pitch.get(index));
        if let (Some((yaw, climb)), Some((roll, pitch))) = (left, right) {
            self.left = StickGeometry::from_deflection(*yaw, *climb);
            self.right = StickGeometry::from_deflection(*roll, *pitch);
        }
    }
}

impl Scene for ControlsScene {
    fn draw_static(&self, canvas: &mut Canvas) {
        for transform in stick_transforms(canvas.rect()) {
            draw_polar_grid(canvas, &transform);
            draw_ticks(canvas, &transform);
            canvas.stroke_rect(transform.frame(), 1.0, AXES);
        }
    }

    fn draw_overlay(&self, canvas: &mut Canvas) {
        let [left, right] = stick_transforms(canvas.rect());
        draw_stick(canvas, &left, &self.left);
        draw_stick(canvas, &right, &self.right);
    }
}

/// One square frame per stick, each centered in its half of `area`.
fn stick_transforms(area: Rect) -> [PlotTransform; 2] {
    let half = area.width() / 2.0;
    let side = (half.min(area.height()) * (1.0 - 2.0 * FRAME_MARGIN)).max(1.0);
    [0.5_f32, 1.5].map(|slot| {
        let center = egui::pos2(area.left() + half * slot, area.center().y);
        PlotTransform::new(
            Rect::from_center_size(center, Vec2::splat(side)),
            -XYMAX..=XYMAX,
            -XYMAX..=XYMAX,
        )
    })
}

fn tick_values() -> impl Iterator<Item = f64> {
    let n = (XYMAX / TICK_INTERVAL).floor() as i32;
    (-n..=n).map(|k| f64::from(k) * TICK_INTERVAL)
}

fn draw_ticks(canvas: &mut Canvas, transform: &PlotTransform) {
    let frame = transform.frame();
    for value in tick_values() {
        let Pos2 { x, .. } = transform.to_screen([value, 0.0]);
        let Pos2 { y, .. } = transform.to_screen([0.0, value]);
        canvas.line(
            egui::pos2(x, frame.bottom()),
            egui::pos2(x, frame.bottom() - TICK_LENGTH),
            1.0,
            AXES,
        );
        canvas.line(
            egui::pos2(x, frame.top()),
            egui::pos2(x, frame.top() + TICK_LENGTH),
            1.0,
            AXES,
        );
        canvas.line(
            egui::pos2(frame.left(), y),
            egui::pos2(frame.left() + TICK_LENGTH, y),
            1.0,
            AXES,
        );
        canvas.line(
            egui::pos2(frame.right(), y),
            egui::pos2(frame.right() - TICK_LENGTH, y),
            1.0,
            AXES,
        );
    }
}

fn draw_polar_grid(canvas: &mut Canvas, transform: &PlotTransform) {
    let center = transform.to_screen([0.0, 0.0]);
    let scale = transform.pixels_per_unit_x();
    for ring in 1..=4 {
        let r = RMAX * f64::from(ring) / 4.0;
        let color = if ring == 4 { AXES } else { GRID };
        canvas.circle_stroke(center, r as f32 * scale, 1.0, color);
    }
    for spoke in 0..8 {
        let theta = f64::from(spoke * 45).to_radians();
        let end = transform.to_screen([RMAX * theta.cos(), RMAX * theta.sin()]);
        canvas.line(center, end, 1.0, GRID);
    }
}

fn draw_stick(canvas: &mut Canvas, transform: &PlotTransform, stick: &StickGeometry) {
    for [from, to] in [stick.bar_x, stick.bar_y] {
        canvas.line(transform.to_screen(from), transform.to_screen(to), 6.0, BAR);
    }
    canvas.line(
        transform.to_screen([0.0, 0.0]),
        transform.to_screen(stick.stick_end()),
        3.0,
        STICK,
    );
    let radius = (TIP_RADIUS as f32 * transform.pixels_per_unit_x()).max(2.0);
    canvas.circle_filled(transform.to_screen(stick.tip), radius, TIP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::testing;
    use blit::{MemorySurface, Panel, PresentKind};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_xymax() {
        assert!(close(XYMAX, 120.0 * 0.82 / 0.58));
        let ticks: Vec<f64> = tick_values().collect();
        assert_eq!(ticks, [-150.0, -100.0, -50.0, 0.0, 50.0, 100.0, 150.0]);
    }

    #[test]
    fn test_stick_geometry() {
        let up = StickGeometry::from_deflection(0.0, 100.0);
        assert!(close(up.theta_deg, 90.0));
        assert!(close(up.r, 100.0));
        assert_eq!(up.bar_x, [[0.0, -XYMAX], [0.0, -XYMAX]]);
        assert_eq!(up.bar_y, [[-XYMAX, 0.0], [-XYMAX, 100.0]]);

        let left = StickGeometry::from_deflection(-30.0, 0.0);
        assert!(close(left.theta_deg, 180.0));

        let diagonal = StickGeometry::from_deflection(30.0, -40.0);
        assert!(close(diagonal.r, 50.0));
        let [x, y] = diagonal.stick_end();
        assert!((x - 30.0).abs() < 1e-9 && (y + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_maps_axes_to_sticks() {
        let series = testing::series(10);
        let mut scene = ControlsScene::new(&series);
        scene.update(4);
        assert_eq!(scene.left().tip, [series.rudder[4], series.throttle[4]]);
        assert_eq!(scene.right().tip, [series.aileron[4], series.elevator[4]]);

        // Past the end: keep showing the last sample.
        scene.update(10);
        assert_eq!(scene.left().tip, [series.rudder[4], series.throttle[4]]);
    }

    #[test]
    fn test_update_is_idempotent_and_keeps_background() {
        let _ = env_logger::builder().is_test(true).try_init();
        let series = testing::series(20);
        let mut panel = Panel::new(
            "controls",
            ControlsScene::new(&series),
            [200, 100],
            MemorySurface::default(),
        );
        panel.scene_mut().update(3);
        assert_eq!(panel.present(), PresentKind::Full);
        let background = panel.background().cloned();
        let first = panel.surface().last_frame().cloned();

        panel.scene_mut().update(7);
        panel.scene_mut().update(3);
        panel.scene_mut().update(3);
        assert!(panel.is_cached());
        assert_eq!(panel.present(), PresentKind::Blit);
        assert_eq!(panel.background().cloned(), background);
        assert_eq!(panel.surface().last_frame().cloned(), first);
    }
}
