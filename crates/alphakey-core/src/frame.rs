//! Frame buffer types for video frames in CPU memory.
//!
//! A [`Frame`] owns one [`FramePlane`] per component plane. Planar formats
//! carry four planes (Y, U, V, A); packed formats carry a single plane with
//! four interleaved bytes per pixel.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::error::{AlphaKeyError, Result};
use crate::time::RationalTime;

/// Pixel format enumeration.
///
/// Every format carries an alpha component; the stage only ever rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// YUV 4:4:4 planar with alpha plane
    Yuva444P,
    /// YUV 4:2:2 planar with alpha plane (chroma halved horizontally)
    Yuva422P,
    /// YUV 4:2:0 planar with alpha plane (chroma halved on both axes)
    Yuva420P,
    /// YUV 4:4:0 planar with alpha plane (chroma halved vertically)
    Yuva440P,
    /// 8-bit packed R, G, B, A
    Rgba,
    /// 8-bit packed B, G, R, A
    Bgra,
    /// 8-bit packed A, R, G, B
    Argb,
    /// 8-bit packed A, B, G, R
    Abgr,
    /// 8-bit packed Y, U, V, A (4:4:4)
    Yuva,
    /// 8-bit packed A, Y, U, V (4:4:4)
    Ayuv,
    /// 8-bit packed V, U, Y, A (4:4:4)
    Vuya,
    /// 8-bit packed A, V, U, Y (4:4:4)
    Avuy,
}

impl PixelFormat {
    /// Every format the crate knows about.
    pub const ALL: [PixelFormat; 12] = [
        Self::Yuva444P,
        Self::Yuva422P,
        Self::Yuva420P,
        Self::Yuva440P,
        Self::Rgba,
        Self::Bgra,
        Self::Argb,
        Self::Abgr,
        Self::Yuva,
        Self::Ayuv,
        Self::Vuya,
        Self::Avuy,
    ];

    /// Short lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Yuva444P => "yuva444p",
            Self::Yuva422P => "yuva422p",
            Self::Yuva420P => "yuva420p",
            Self::Yuva440P => "yuva440p",
            Self::Rgba => "rgba",
            Self::Bgra => "bgra",
            Self::Argb => "argb",
            Self::Abgr => "abgr",
            Self::Yuva => "yuva",
            Self::Ayuv => "ayuv",
            Self::Vuya => "vuya",
            Self::Avuy => "avuy",
        }
    }

    /// True for formats storing each component in its own plane.
    pub fn is_planar(self) -> bool {
        matches!(
            self,
            Self::Yuva444P | Self::Yuva422P | Self::Yuva420P | Self::Yuva440P
        )
    }

    /// True for packed formats whose colour channels are RGB.
    pub fn is_rgb(self) -> bool {
        matches!(self, Self::Rgba | Self::Bgra | Self::Argb | Self::Abgr)
    }

    /// Bytes per pixel for packed formats, or 0 for planar.
    pub fn bytes_per_pixel(self) -> usize {
        if self.is_planar() {
            0
        } else {
            4
        }
    }

    /// Number of planes for this format.
    pub fn plane_count(self) -> usize {
        if self.is_planar() {
            4
        } else {
            1
        }
    }

    /// Log2 chroma subsampling factors `(horizontal, vertical)`.
    pub fn chroma_shift(self) -> (u32, u32) {
        match self {
            Self::Yuva422P => (1, 0),
            Self::Yuva420P => (1, 1),
            Self::Yuva440P => (0, 1),
            _ => (0, 0),
        }
    }

    /// Byte offsets inside a packed pixel of, in order, the first colour
    /// component (R or Y), the second (G or U), the third (B or V) and alpha.
    ///
    /// Returns `None` for planar formats.
    pub fn component_offsets(self) -> Option<[usize; 4]> {
        match self {
            Self::Rgba | Self::Yuva => Some([0, 1, 2, 3]),
            Self::Bgra | Self::Vuya => Some([2, 1, 0, 3]),
            Self::Argb | Self::Ayuv => Some([1, 2, 3, 0]),
            Self::Abgr | Self::Avuy => Some([3, 2, 1, 0]),
            _ => None,
        }
    }

    /// Dimensions in samples of plane `index` for a `width` x `height` frame.
    pub fn plane_dimensions(self, index: usize, width: u32, height: u32) -> (u32, u32) {
        if !self.is_planar() || index == 0 || index == 3 {
            return (width, height);
        }
        let (sx, sy) = self.chroma_shift();
        (
            (width + (1 << sx) - 1) >> sx,
            (height + (1 << sy) - 1) >> sy,
        )
    }

    /// Bytes per sample of plane `index`.
    fn plane_bytes_per_pixel(self, _index: usize) -> usize {
        if self.is_planar() {
            1
        } else {
            4
        }
    }

    /// Total bytes of a tightly packed frame (no row padding).
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        (0..self.plane_count())
            .map(|i| {
                let (w, h) = self.plane_dimensions(i, width, height);
                w as usize * h as usize * self.plane_bytes_per_pixel(i)
            })
            .sum()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = AlphaKeyError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| AlphaKeyError::UnsupportedFormat(s.to_string()))
    }
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone)]
pub struct FramePlane {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in samples
    pub width: u32,
    /// Height in rows
    pub height: u32,
    /// Bytes per sample
    pub bytes_per_pixel: usize,
}

impl FramePlane {
    /// Create a new zeroed plane with the given dimensions.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        // Align stride to 64 bytes for SIMD friendliness
        let min_stride = (width as usize) * bytes_per_pixel;
        let stride = (min_stride + 63) & !63;
        let data = vec![0u8; stride * height as usize];
        Self {
            data,
            stride,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Wrap an existing buffer, checking that it can hold every row.
    pub fn from_vec(
        data: Vec<u8>,
        stride: usize,
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
    ) -> Result<Self> {
        let row_bytes = width as usize * bytes_per_pixel;
        if stride < row_bytes {
            return Err(AlphaKeyError::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_bytes
            )));
        }
        let needed = match height {
            0 => 0,
            h => stride * (h as usize - 1) + row_bytes,
        };
        if data.len() < needed {
            return Err(AlphaKeyError::InvalidFrame(format!(
                "plane buffer holds {} bytes, {} needed",
                data.len(),
                needed
            )));
        }
        Ok(Self {
            data,
            stride,
            width,
            height,
            bytes_per_pixel,
        })
    }

    /// Bytes of actual samples in one row.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Get a mutable row of pixel data.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.row_bytes();
        &mut self.data[start..end]
    }

    /// Set every sample byte of the plane to `value`.
    pub fn fill(&mut self, value: u8) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }
}

/// A video frame in CPU memory.
///
/// The frame is mutated in place; the keying stage never copies it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel format
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Presentation timestamp, `None` when unknown
    pub pts: Option<RationalTime>,
    /// Pixel data planes (1 for packed, 4 for planar)
    pub planes: SmallVec<[FramePlane; 4]>,
}

impl Frame {
    /// Create a new zeroed frame with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let planes = (0..format.plane_count())
            .map(|i| {
                let (w, h) = format.plane_dimensions(i, width, height);
                FramePlane::new(w, h, format.plane_bytes_per_pixel(i))
            })
            .collect();
        Self {
            format,
            width,
            height,
            pts: None,
            planes,
        }
    }

    /// Assemble a frame from externally allocated planes.
    pub fn from_planes(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: impl IntoIterator<Item = FramePlane>,
    ) -> Result<Self> {
        let frame = Self {
            format,
            width,
            height,
            pts: None,
            planes: planes.into_iter().collect(),
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Set the presentation timestamp.
    pub fn with_pts(mut self, pts: RationalTime) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Presentation time in seconds, NaN when the timestamp is unknown.
    pub fn pts_seconds(&self) -> f64 {
        self.pts.map_or(f64::NAN, RationalTime::to_seconds_f64)
    }

    /// Check that the planes match the format and dimensions.
    pub fn validate(&self) -> Result<()> {
        if self.planes.len() != self.format.plane_count() {
            return Err(AlphaKeyError::InvalidFrame(format!(
                "{} expects {} planes, frame has {}",
                self.format,
                self.format.plane_count(),
                self.planes.len()
            )));
        }
        for (i, plane) in self.planes.iter().enumerate() {
            let (w, h) = self.format.plane_dimensions(i, self.width, self.height);
            if plane.width < w
                || plane.height < h
                || plane.bytes_per_pixel != self.format.plane_bytes_per_pixel(i)
            {
                return Err(AlphaKeyError::InvalidFrame(format!(
                    "plane {} is {}x{}x{}, {} needs {}x{}x{}",
                    i,
                    plane.width,
                    plane.height,
                    plane.bytes_per_pixel,
                    self.format,
                    w,
                    h,
                    self.format.plane_bytes_per_pixel(i)
                )));
            }
        }
        Ok(())
    }

    /// Get plane `index`.
    #[inline]
    pub fn plane(&self, index: usize) -> &FramePlane {
        &self.planes[index]
    }

    /// Get plane `index` mutably.
    #[inline]
    pub fn plane_mut(&mut self, index: usize) -> &mut FramePlane {
        &mut self.planes[index]
    }

    /// Set every pixel to `components`, given in the order
    /// (R or Y, G or U, B or V, A).
    pub fn fill(&mut self, components: [u8; 4]) {
        match self.format.component_offsets() {
            None => {
                for (plane, value) in self.planes.iter_mut().zip(components) {
                    plane.fill(value);
                }
            }
            Some(offsets) => {
                let mut pixel = [0u8; 4];
                for (c, &off) in offsets.iter().enumerate() {
                    pixel[off] = components[c];
                }
                let plane = &mut self.planes[0];
                for y in 0..plane.height {
                    for px in plane.row_mut(y).chunks_exact_mut(4) {
                        px.copy_from_slice(&pixel);
                    }
                }
            }
        }
    }

    /// Copy tightly packed bytes (planes back to back, no row padding) into
    /// the frame.
    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.format.frame_size(self.width, self.height);
        if bytes.len() != expected {
            return Err(AlphaKeyError::InvalidFrame(format!(
                "{} {}x{} frame needs {} bytes, got {}",
                self.format,
                self.width,
                self.height,
                expected,
                bytes.len()
            )));
        }
        let mut offset = 0;
        for plane in self.planes.iter_mut() {
            let row_bytes = plane.row_bytes();
            for y in 0..plane.height {
                plane
                    .row_mut(y)
                    .copy_from_slice(&bytes[offset..offset + row_bytes]);
                offset += row_bytes;
            }
        }
        Ok(())
    }

    /// Append the frame's samples to `out`, tightly packed.
    pub fn write_bytes(&self, out: &mut Vec<u8>) {
        out.reserve(self.format.frame_size(self.width, self.height));
        for plane in &self.planes {
            for y in 0..plane.height {
                out.extend_from_slice(plane.row(y));
            }
        }
    }
}
