use std::ops::RangeInclusive;

use egui::{Pos2, Rect};

/// Maps data coordinates into a pixel frame, with the y axis pointing up.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotTransform {
    frame: Rect,
    x: (f64, f64),
    y: (f64, f64),
}

impl PlotTransform {
    /// Empty or non-finite ranges are widened to one unit around their
    /// center, so every transform is invertible.
    pub fn new(frame: Rect, x: RangeInclusive<f64>, y: RangeInclusive<f64>) -> Self {
        Self {
            frame,
            x: sanitize(x),
            y: sanitize(y),
        }
    }

    /// Like [`PlotTransform::new`], but grows one of the ranges so that one
    /// data unit spans the same number of pixels in x and y. Both ranges stay
    /// centered.
    pub fn equal_aspect(frame: Rect, x: RangeInclusive<f64>, y: RangeInclusive<f64>) -> Self {
        let ((x0, x1), (y0, y1)) = (sanitize(x), sanitize(y));
        let (w, h) = (frame.width().max(1.0) as f64, frame.height().max(1.0) as f64);
        let scale = ((x1 - x0) / w).max((y1 - y0) / h);
        let (xc, yc) = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);
        let (xh, yh) = (scale * w * 0.5, scale * h * 0.5);
        Self {
            frame,
            x: (xc - xh, xc + xh),
            y: (yc - yh, yc + yh),
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn x_range(&self) -> RangeInclusive<f64> {
        self.x.0..=self.x.1
    }

    pub fn y_range(&self) -> RangeInclusive<f64> {
        self.y.0..=self.y.1
    }

    pub fn to_screen(&self, [x, y]: [f64; 2]) -> Pos2 {
        let fx = (x - self.x.0) / (self.x.1 - self.x.0);
        let fy = (y - self.y.0) / (self.y.1 - self.y.0);
        egui::pos2(
            self.frame.left() + (fx as f32) * self.frame.width(),
            self.frame.bottom() - (fy as f32) * self.frame.height(),
        )
    }

    /// Number of pixels one data unit spans along x.
    pub fn pixels_per_unit_x(&self) -> f32 {
        self.frame.width() / (self.x.1 - self.x.0) as f32
    }
}

fn sanitize(range: RangeInclusive<f64>) -> (f64, f64) {
    let (lo, hi) = range.into_inner();
    if lo.is_finite() && hi.is_finite() && hi > lo {
        (lo, hi)
    } else if lo.is_finite() {
        (lo - 0.5, lo + 0.5)
    } else {
        (-0.5, 0.5)
    }
}
