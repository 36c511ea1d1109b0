use egui::ColorImage;

/// Where a presented frame ends up: a GPU texture in the GUI, memory in
/// tests and headless runs.
pub trait Surface {
    fn flush(&mut self, image: &ColorImage);
}

impl<T: Surface + ?Sized> Surface for Box<T> {
    fn flush(&mut self, image: &ColorImage) {
        (**self).flush(image)
    }
}

/// Keeps a copy of the last flushed frame.
#[derive(Debug, Default)]
pub struct MemorySurface {
    frame: Option<ColorImage>,
    flushes: usize,
}

impl MemorySurface {
    pub fn last_frame(&self) -> Option<&ColorImage> {
        self.frame.as_ref()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Surface for MemorySurface {
    fn flush(&mut self, image: &ColorImage) {
        match self.frame.as_mut() {
            Some(frame) if frame.size == image.size => frame.pixels.copy_from_slice(&image.pixels),
            _ => self.frame = Some(image.clone()),
        }
        self.flushes += 1;
    }
}
