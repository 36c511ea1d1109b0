use blit::{ColorImage, Surface};
use egui::{Color32, TextureHandle, TextureOptions};

use crate::panels::{PanelKind, SurfaceFactory};

/// Uploads presented frames into an egui texture.
struct TextureSurface {
    handle: TextureHandle,
}

impl Surface for TextureSurface {
    fn flush(&mut self, image: &ColorImage) {
        self.handle.set(image.clone(), TextureOptions::LINEAR);
    }
}

/// Creates one texture per panel and keeps a handle to each for display.
pub struct TextureSurfaces {
    ctx: egui::Context,
    handles: [Option<TextureHandle>; 3],
}

impl TextureSurfaces {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            handles: Default::default(),
        }
    }

    pub fn texture(&self, kind: PanelKind) -> Option<&TextureHandle> {
        self.handles[kind.index()].as_ref()
    }
}

impl SurfaceFactory for TextureSurfaces {
    fn create(&mut self, kind: PanelKind) -> Box<dyn Surface> {
        let handle = self.ctx.load_texture(
            kind.name(),
            ColorImage::new([1, 1], Color32::TRANSPARENT),
            TextureOptions::LINEAR,
        );
        self.handles[kind.index()] = Some(handle.clone());
        Box::new(TextureSurface { handle })
    }
}
