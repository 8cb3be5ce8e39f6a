//! Rasterization of nodes into PNG screenshots.
//!
//! Nodes Pandoc cannot express are shown to readers as images. A [`Rasterizer`]
//! turns an HTML rendering of the node into PNG bytes; the rPNG side channel
//! then hides the node itself inside those bytes.
//!
//! | Rasterizer               | Output                                       |
//! |--------------------------|----------------------------------------------|
//! | [`ChromeRasterizer`]     | real screenshot via headless Chrome's CLI    |
//! | [`PlaceholderRasterizer`]| blank image, for tests and headless hosts    |
//!
//! Rasterizers are explicitly owned handles shared as `Arc<dyn Rasterizer>`.
//! Implementations that hold a process or scratch space start it lazily on the
//! first screenshot and release it in [`Rasterizer::stop`].

#[cfg(feature = "chrome")]
mod chrome;
pub mod html;

#[cfg(feature = "chrome")]
pub use chrome::{resolve_chrome_binary, ChromeRasterizer};

use crate::error::RpngError;
use crate::rpng::Png;

/// Size of the browser window used for a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 800,
            height: 600,
        }
    }
}

/// A screenshot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// Complete HTML page to render.
    pub html: String,
    /// CSS selector of the element to capture.
    pub selector: String,
    /// Window size; the rasterizer's own default when absent.
    pub viewport: Option<Viewport>,
}

pub trait Rasterizer: Send + Sync {
    /// Renders the page and returns PNG bytes.
    fn screenshot(&self, request: &Screenshot) -> Result<Vec<u8>, RpngError>;

    /// Releases any resources started by earlier screenshots.
    fn stop(&self) {}
}

/// Produces blank images of a fixed size without rendering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderRasterizer {
    pub width: u32,
    pub height: u32,
}

impl Default for PlaceholderRasterizer {
    fn default() -> Self {
        PlaceholderRasterizer {
            width: 120,
            height: 40,
        }
    }
}

impl Rasterizer for PlaceholderRasterizer {
    fn screenshot(&self, _request: &Screenshot) -> Result<Vec<u8>, RpngError> {
        Ok(Png::blank(self.width, self.height)?.to_bytes())
    }
}
