use std::time::Instant;

use egui::Color32;

use crate::{Canvas, Snapshot, Surface};

/// The content of a panel, split into the part that never changes during
/// playback and the part that moves.
pub trait Scene {
    /// Axes, grids, complete curves, the flight path.
    fn draw_static(&self, canvas: &mut Canvas);
    /// Markers and lines that follow the current sample.
    fn draw_overlay(&self, canvas: &mut Canvas);
}

/// Whether a panel holds a rendered copy of its static content.
#[derive(Debug)]
pub enum CacheState {
    Uncached,
    Cached(Snapshot),
}

/// How a call to [`Panel::present`] produced its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentKind {
    /// Static content was rendered and captured as the new background.
    Full,
    /// The cached background was restored and only the overlay was drawn.
    Blit,
}

pub struct Panel<S, O> {
    name: String,
    scene: S,
    canvas: Canvas,
    cache: CacheState,
    surface: O,
    background: Color32,
}

impl<S: Scene, O: Surface> Panel<S, O> {
    /// A new panel starts uncached; the first [`Panel::present`] renders it
    /// completely.
    pub fn new(name: &str, scene: S, size: [usize; 2], surface: O) -> Self {
        let background = Color32::WHITE;
        Self {
            name: name.to_owned(),
            scene,
            canvas: Canvas::new(size, background),
            cache: CacheState::Uncached,
            surface,
            background,
        }
    }

    pub fn with_background(mut self, color: Color32) -> Self {
        self.background = color;
        self.invalidate();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access for overlay updates. Changes to anything drawn by
    /// [`Scene::draw_static`] need an explicit [`Panel::invalidate`].
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn surface(&self) -> &O {
        &self.surface
    }

    pub fn size(&self) -> [usize; 2] {
        self.canvas.size()
    }

    pub fn cache_state(&self) -> &CacheState {
        &self.cache
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.cache, CacheState::Cached(_))
    }

    pub fn background(&self) -> Option<&Snapshot> {
        match &self.cache {
            CacheState::Cached(snapshot) => Some(snapshot),
            CacheState::Uncached => None,
        }
    }

    /// Drop the cached background.
    pub fn invalidate(&mut self) {
        if self.is_cached() {
            log::debug!("{}: background invalidated", self.name);
        }
        self.cache = CacheState::Uncached;
    }

    /// Reallocate the canvas if `size` differs from the current one, which
    /// invalidates the background. Returns whether anything changed.
    pub fn resize(&mut self, size: [usize; 2]) -> bool {
        let size = [size[0].max(1), size[1].max(1)];
        if size == self.canvas.size() {
            return false;
        }
        log::debug!("{}: resized to {:?}", self.name, size);
        self.canvas = Canvas::new(size, self.background);
        self.invalidate();
        true
    }

    /// Produce the next frame and flush it to the surface.
    pub fn present(&mut self) -> PresentKind {
        let restored = match &self.cache {
            CacheState::Cached(snapshot) => self.canvas.restore(snapshot),
            CacheState::Uncached => false,
        };
        let kind = match restored {
            true => PresentKind::Blit,
            false => {
                let tic = Instant::now();
                self.canvas.clear(self.background);
                self.scene.draw_static(&mut self.canvas);
                self.cache = CacheState::Cached(self.canvas.snapshot());
                log::debug!(
                    "{}: rendered background in {:.3} s",
                    self.name,
                    tic.elapsed().as_secs_f64()
                );
                PresentKind::Full
            }
        };
        self.scene.draw_overlay(&mut self.canvas);
        self.surface.flush(self.canvas.image());
        kind
    }
}
