use crate::slot::CHANNELS;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Image kind tag shared with the simulator's capture code.
///
/// The numeric tags 0..=9 are a cross-process contract. Tags the simulator
/// adds later decode as [`ImageKind::Unknown`] instead of failing the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageKind {
    Scene,
    DepthPlanar,
    DepthPerspective,
    DepthVis,
    DisparityNormalized,
    Segmentation,
    SurfaceNormals,
    Infrared,
    OpticalFlow,
    OpticalFlowVis,
    Unknown(u32),
}

impl ImageKind {
    pub fn tag(self) -> u32 {
        match self {
            ImageKind::Scene => 0,
            ImageKind::DepthPlanar => 1,
            ImageKind::DepthPerspective => 2,
            ImageKind::DepthVis => 3,
            ImageKind::DisparityNormalized => 4,
            ImageKind::Segmentation => 5,
            ImageKind::SurfaceNormals => 6,
            ImageKind::Infrared => 7,
            ImageKind::OpticalFlow => 8,
            ImageKind::OpticalFlowVis => 9,
            ImageKind::Unknown(tag) => tag,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ImageKind::Scene => "Scene",
            ImageKind::DepthPlanar => "DepthPlanar",
            ImageKind::DepthPerspective => "DepthPerspective",
            ImageKind::DepthVis => "DepthVis",
            ImageKind::DisparityNormalized => "DisparityNormalized",
            ImageKind::Segmentation => "Segmentation",
            ImageKind::SurfaceNormals => "SurfaceNormals",
            ImageKind::Infrared => "Infrared",
            ImageKind::OpticalFlow => "OpticalFlow",
            ImageKind::OpticalFlowVis => "OpticalFlowVis",
            ImageKind::Unknown(_) => "Unknown",
        }
    }
}

impl From<u32> for ImageKind {
    fn from(tag: u32) -> Self {
        match tag {
            0 => ImageKind::Scene,
            1 => ImageKind::DepthPlanar,
            2 => ImageKind::DepthPerspective,
            3 => ImageKind::DepthVis,
            4 => ImageKind::DisparityNormalized,
            5 => ImageKind::Segmentation,
            6 => ImageKind::SurfaceNormals,
            7 => ImageKind::Infrared,
            8 => ImageKind::OpticalFlow,
            9 => ImageKind::OpticalFlowVis,
            other => ImageKind::Unknown(other),
        }
    }
}

/// A decoded image that owns its pixels and outlives the slot it came from.
///
/// `pixels` is row-major RGB24, `height * width * 3` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub capture_timestamp: u64,
    pub image_kind: ImageKind,
    pub pixels: Vec<u8>,
}

/// Frame metadata without the pixel buffer, for logs and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub capture_timestamp: u64,
    pub image_kind: ImageKind,
    pub payload_len: usize,
}

impl Frame {
    fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// RGB triple at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.row_stride() + x as usize * CHANNELS;
        let rgb = self.pixels.get(offset..offset + CHANNELS)?;
        Some([rgb[0], rgb[1], rgb[2]])
    }

    /// Rows of `width * 3` bytes, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(self.row_stride().max(1))
    }

    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            width: self.width,
            height: self.height,
            capture_timestamp: self.capture_timestamp,
            image_kind: self.image_kind,
            payload_len: self.pixels.len(),
        }
    }

    /// Copy of the pixels with red and blue swapped, for BGR consumers.
    pub fn to_bgr(&self) -> Vec<u8> {
        let mut bgr = self.pixels.clone();
        for px in bgr.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        bgr
    }

    /// Write the frame as a binary PPM (P6) image.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        out.write_all(&self.pixels)?;
        out.flush()
    }
}
