use blit::{Canvas, Color32, PlotTransform, Rect, Scene};
use flight_log::DerivedSeries;

use super::{thin_path, Replay};

const PLOT_MARGIN: f32 = 6.0;
const GRID_LINES: u32 = 4;
/// Head room above the largest value.
const Y_HEADROOM: f64 = 1.1;

const AXES: Color32 = Color32::from_gray(90);
const GRID: Color32 = Color32::from_gray(225);
const CURVE: Color32 = Color32::from_rgb(31, 119, 180);
const CURSOR: Color32 = Color32::from_rgb(214, 39, 40);

/// One plotted quantity and the value range its plot spans.
struct Trace {
    values: Vec<f64>,
    y_range: (f64, f64),
}

impl Trace {
    fn new(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
            y_range: value_range(values),
        }
    }
}

/// Where the overlay points on all three plots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub time: f64,
    pub values: [f64; 3],
}

/// Height, speed and distance over time, stacked top to bottom in the
/// order of [`GraphsScene::LABELS`].
pub struct GraphsScene {
    time: Vec<f64>,
    time_range: (f64, f64),
    traces: [Trace; 3],
    cursor: Option<Cursor>,
}

impl GraphsScene {
    pub const LABELS: [&'static str; 3] = ["height (m)", "speed (km/h)", "distance (m)"];

    pub fn new(series: &DerivedSeries) -> Self {
        let time_range = match (series.time_s.first(), series.time_s.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (0.0, 1.0),
        };
        Self {
            time: series.time_s.clone(),
            time_range,
            traces: [
                Trace::new(&series.height_m),
                Trace::new(&series.speed_kmh),
                Trace::new(&series.distance_m),
            ],
            cursor: None,
        }
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    fn transforms(&self, area: Rect) -> [PlotTransform; 3] {
        let height = ((area.height() - 4.0 * PLOT_MARGIN) / 3.0).max(1.0);
        let (t0, t1) = self.time_range;
        [0, 1, 2].map(|row| {
            let top = area.top() + PLOT_MARGIN + row as f32 * (height + PLOT_MARGIN);
            let frame = Rect::from_min_max(
                egui::pos2(area.left() + PLOT_MARGIN, top),
                egui::pos2(area.right() - PLOT_MARGIN, top + height),
            );
            let (y0, y1) = self.traces[row].y_range;
            PlotTransform::new(frame, t0..=t1, y0..=y1)
        })
    }
}

impl Replay for GraphsScene {
    fn update(&mut self, index: usize) {
        let Some(time) = self.time.get(index) else {
            return;
        };
        let [height, speed, distance] = &self.traces;
        if let (Some(h), Some(s), Some(d)) = (
            height.values.get(index),
            speed.values.get(index),
            distance.values.get(index),
        ) {
            self.cursor = Some(Cursor {
                time: *time,
                values: [*h, *s, *d],
            });
        }
    }
}

impl Scene for GraphsScene {
    fn draw_static(&self, canvas: &mut Canvas) {
        for (trace, transform) in self.traces.iter().zip(self.transforms(canvas.rect())) {
            let frame = transform.frame();
            let (y0, y1) = trace.y_range;
            for k in 1..GRID_LINES {
                let level = y0 + (y1 - y0) * f64::from(k) / f64::from(GRID_LINES);
                let y = transform.to_screen([self.time_range.0, level]).y;
                canvas.line(
                    egui::pos2(frame.left(), y),
                    egui::pos2(frame.right(), y),
                    1.0,
                    GRID,
                );
            }
            let path = thin_path(
                self.time
                    .iter()
                    .zip(&trace.values)
                    .map(|(t, v)| transform.to_screen([*t, *v])),
            );
            canvas.polyline(&path, 1.5, CURVE);
            canvas.stroke_rect(frame, 1.0, AXES);
        }
    }

    fn draw_overlay(&self, canvas: &mut Canvas) {
        let Some(cursor) = self.cursor else {
            return;
        };
        for (value, transform) in cursor.values.iter().zip(self.transforms(canvas.rect())) {
            let frame = transform.frame();
            let marker = transform.to_screen([cursor.time, *value]);
            canvas.line(
                egui::pos2(marker.x, frame.top()),
                egui::pos2(marker.x, frame.bottom()),
                1.0,
                CURSOR,
            );
            canvas.circle_filled(marker, 4.0, CURSOR);
        }
    }
}

/// Smallest value up to the largest plus head room. Non-finite values are
/// skipped.
fn value_range(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    let hi = if hi > 0.0 { hi * Y_HEADROOM } else { hi };
    (lo, hi)
}
