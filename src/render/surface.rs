use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;

use crate::foundation::core::Canvas;
use crate::foundation::error::{PresenterError, PresenterResult};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**. The `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame of the given size.
    pub fn blank(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
            premultiplied: true,
        }
    }

    /// RGBA of the pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Write the frame as a PNG.
    pub fn save_png(&self, path: &Path) -> PresenterResult<()> {
        use anyhow::Context as _;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| PresenterError::render(format!("write png '{}': {e}", path.display())))
    }
}

/// Create the drawable surface's live stream: one writer (the frame loop), many readers.
pub fn surface_feed() -> (SurfacePublisher, SurfaceStream) {
    let (tx, rx) = watch::channel(None);
    (SurfacePublisher { tx: Arc::new(tx) }, SurfaceStream { rx })
}

/// Write side of the surface stream.
#[derive(Clone, Debug)]
pub struct SurfacePublisher {
    tx: Arc<watch::Sender<Option<Arc<FrameRGBA>>>>,
}

impl SurfacePublisher {
    /// Replace the current surface contents.
    pub fn publish(&self, frame: FrameRGBA) {
        self.tx.send_replace(Some(Arc::new(frame)));
    }

    /// A reader of this surface.
    pub fn stream(&self) -> SurfaceStream {
        SurfaceStream {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the surface stream. Always yields the most recent frame.
#[derive(Clone, Debug)]
pub struct SurfaceStream {
    rx: watch::Receiver<Option<Arc<FrameRGBA>>>,
}

impl SurfaceStream {
    /// Most recent frame, if one has been painted.
    pub fn latest(&self) -> Option<Arc<FrameRGBA>> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
