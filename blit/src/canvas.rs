use egui::{Color32, ColorImage, Pos2, Rect};

/// An RGBA pixel buffer with a handful of drawing primitives.
///
/// Coordinates are in pixels, with the origin in the top left corner and
/// pixel `(x, y)` covering the square from `(x, y)` to `(x + 1, y + 1)`.
/// Everything is drawn opaque and without anti-aliasing.
#[derive(Clone, Debug)]
pub struct Canvas {
    image: ColorImage,
}

/// A copy of all pixels of a [`Canvas`], taken with [`Canvas::snapshot`].
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    image: ColorImage,
}

impl Snapshot {
    pub fn size(&self) -> [usize; 2] {
        self.image.size
    }

    pub fn pixels(&self) -> &[Color32] {
        &self.image.pixels
    }
}

impl Canvas {
    /// Zero sized dimensions are bumped to one pixel.
    pub fn new(size: [usize; 2], fill: Color32) -> Self {
        let size = [size[0].max(1), size[1].max(1)];
        Self {
            image: ColorImage::new(size, fill),
        }
    }

    pub fn size(&self) -> [usize; 2] {
        self.image.size
    }

    pub fn width(&self) -> f32 {
        self.image.size[0] as f32
    }

    pub fn height(&self) -> f32 {
        self.image.size[1] as f32
    }

    /// The full canvas area in pixel coordinates.
    pub fn rect(&self) -> Rect {
        Rect::from_min_max(Pos2::ZERO, egui::pos2(self.width(), self.height()))
    }

    pub fn image(&self) -> &ColorImage {
        &self.image
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color32> {
        let [w, h] = self.image.size;
        (x < w && y < h).then(|| self.image.pixels[y * w + x])
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            image: self.image.clone(),
        }
    }

    /// Copy the pixels of `snapshot` back into the canvas. Returns `false`
    /// (and leaves the canvas untouched) if the sizes differ.
    pub fn restore(&mut self, snapshot: &Snapshot) -> bool {
        if snapshot.image.size != self.image.size {
            log::warn!(
                "refusing to restore snapshot of size {:?} into canvas of size {:?}",
                snapshot.image.size,
                self.image.size
            );
            return false;
        }
        self.image.pixels.copy_from_slice(&snapshot.image.pixels);
        true
    }

    pub fn clear(&mut self, color: Color32) {
        self.image.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color32) {
        let Some((x0, x1, y0, y1)) = self.pixel_span(rect) else {
            return;
        };
        let w = self.image.size[0];
        for y in y0..y1 {
            self.image.pixels[y * w + x0..y * w + x1].fill(color);
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color32) {
        let corners = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
            rect.left_top(),
        ];
        self.polyline(&corners, width, color);
    }

    /// Thick line segment: every pixel whose center lies within `width / 2`
    /// of the segment is set.
    pub fn line(&mut self, a: Pos2, b: Pos2, width: f32, color: Color32) {
        let half = (width * 0.5).max(0.5);
        let bounds = Rect::from_two_pos(a, b).expand(half);
        let Some((x0, x1, y0, y1)) = self.pixel_span(bounds) else {
            return;
        };
        let ab = b - a;
        let len_sq = ab.length_sq();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = egui::pos2(x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq > 0.0 {
                    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                if (a + ab * t).distance(p) <= half {
                    self.put(x, y, color);
                }
            }
        }
    }

    pub fn polyline(&mut self, points: &[Pos2], width: f32, color: Color32) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], width, color);
        }
    }

    pub fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        let bounds = Rect::from_center_size(center, egui::Vec2::splat(2.0 * radius + 1.0));
        let Some((x0, x1, y0, y1)) = self.pixel_span(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = egui::pos2(x as f32 + 0.5, y as f32 + 0.5);
                if p.distance(center) <= radius {
                    self.put(x, y, color);
                }
            }
        }
    }

    pub fn circle_stroke(&mut self, center: Pos2, radius: f32, width: f32, color: Color32) {
        let half = (width * 0.5).max(0.5);
        let bounds =
            Rect::from_center_size(center, egui::Vec2::splat(2.0 * (radius + half) + 1.0));
        let Some((x0, x1, y0, y1)) = self.pixel_span(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = egui::pos2(x as f32 + 0.5, y as f32 + 0.5);
                if (p.distance(center) - radius).abs() <= half {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Fill a closed polygon (even-odd rule).
    pub fn fill_polygon(&mut self, points: &[Pos2], color: Color32) {
        if points.len() < 3 {
            return;
        }
        let bounds = points
            .iter()
            .fold(Rect::NOTHING, |rect, p| rect.union(Rect::from_min_max(*p, *p)));
        let Some((x0, x1, y0, y1)) = self.pixel_span(bounds) else {
            return;
        };
        let mut crossings = Vec::with_capacity(points.len());
        for y in y0..y1 {
            let yc = y as f32 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= yc) != (b.y <= yc) {
                    crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
            crossings.sort_by(f32::total_cmp);
            for span in crossings.chunks_exact(2) {
                for x in x0..x1 {
                    let xc = x as f32 + 0.5;
                    if xc >= span[0] && xc < span[1] {
                        self.put(x, y, color);
                    }
                }
            }
        }
    }

    fn put(&mut self, x: usize, y: usize, color: Color32) {
        let [w, h] = self.image.size;
        if x < w && y < h {
            self.image.pixels[y * w + x] = color;
        }
    }

    /// Pixel index ranges `(x0, x1, y0, y1)` (exclusive ends) covered by
    /// `rect`, clipped to the canvas. `None` if nothing is visible.
    fn pixel_span(&self, rect: Rect) -> Option<(usize, usize, usize, usize)> {
        if !rect.is_finite() {
            return None;
        }
        let [w, h] = self.image.size;
        let clip = |v: f32, max: usize| v.max(0.0).min(max as f32) as usize;
        let (x0, x1) = (clip(rect.min.x.floor(), w), clip(rect.max.x.ceil(), w));
        let (y0, y1) = (clip(rect.min.y.floor(), h), clip(rect.max.y.ceil(), h));
        (x0 < x1 && y0 < y1).then_some((x0, x1, y0, y1))
    }
}
