#![warn(clippy::all, rust_2018_idioms)]

//! Software raster panels with a cached background.
//!
//! A [`Panel`] renders the static part of its [`Scene`] once, keeps a copy of
//! the pixels and afterwards only restores that copy and draws the moving
//! overlay on top before handing the frame to its [`Surface`].

mod canvas;
mod panel;
mod surface;
mod transform;

pub use canvas::{Canvas, Snapshot};
pub use panel::{CacheState, Panel, PresentKind, Scene};
pub use surface::{MemorySurface, Surface};
pub use transform::PlotTransform;

pub use egui::{Color32, ColorImage, Pos2, Rect};
