//! Frame encoding for remote viewers
//!
//! Turns a [`RenderSnapshot`] into a self-contained image payload.
//! This module is READ-ONLY - it never modifies simulation state.

pub mod canvas;
pub mod colors;
pub mod font;
pub mod scene;
pub mod snapshot;

pub use snapshot::{AgentView, Overlay, RenderSnapshot};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::core::error::Result;
use canvas::Canvas;

/// One encoded still image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// PNG bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// Payload as sent over the wire
    pub fn data_base64(&self) -> String {
        BASE64.encode(&self.data)
    }
}

/// Replaceable rasterizer + serializer for snapshots
pub trait FrameEncoder: Send {
    fn encode(&mut self, snapshot: &RenderSnapshot) -> Result<Frame>;
}

/// Draws the track scene and encodes it as PNG
#[derive(Debug, Clone)]
pub struct PngFrameEncoder {
    width: u32,
    height: u32,
}

impl PngFrameEncoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rasterize without encoding
    pub fn rasterize(&self, snapshot: &RenderSnapshot) -> Canvas {
        let mut canvas = Canvas::new(self.width, self.height);
        scene::draw(&mut canvas, snapshot);
        canvas
    }
}

impl FrameEncoder for PngFrameEncoder {
    fn encode(&mut self, snapshot: &RenderSnapshot) -> Result<Frame> {
        let canvas = self.rasterize(snapshot);
        let mut data = Vec::new();
        PngEncoder::new(&mut data).write_image(
            canvas.image().as_raw(),
            self.width,
            self.height,
            ColorType::Rgb8,
        )?;

        Ok(Frame {
            width: self.width,
            height: self.height,
            data,
        })
    }
}
