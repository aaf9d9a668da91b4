//! Pixel format adapter: uniform chroma reads and alpha writes over planar
//! and packed layouts.
//!
//! The descriptor is built once per negotiated format. The per-pixel keying
//! loop then works on plain rows of `(u, v)` pairs and alpha bytes and never
//! branches on the layout.

use alphakey_core::{Frame, PixelFormat};

use crate::error::{FormatNegotiationError, KeyError};

/// Formats the stage accepts, in order of preference.
pub const SUPPORTED_FORMATS: [PixelFormat; 12] = [
    PixelFormat::Yuva444P,
    PixelFormat::Yuva422P,
    PixelFormat::Yuva420P,
    PixelFormat::Yuva440P,
    PixelFormat::Yuva,
    PixelFormat::Ayuv,
    PixelFormat::Vuya,
    PixelFormat::Avuy,
    PixelFormat::Rgba,
    PixelFormat::Bgra,
    PixelFormat::Argb,
    PixelFormat::Abgr,
];

/// Pick the first supported format offered by the input and accepted by the
/// output.
pub fn negotiate(
    input: &[PixelFormat],
    output: &[PixelFormat],
) -> Result<PixelFormat, FormatNegotiationError> {
    SUPPORTED_FORMATS
        .iter()
        .copied()
        .find(|f| input.contains(f) && output.contains(f))
        .ok_or_else(|| FormatNegotiationError {
            input: input.to_vec(),
            output: output.to_vec(),
        })
}

/// How alpha is produced for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// No chroma available: alpha is a copy of the first colour channel.
    CopyChannel,
    /// Alpha from chroma distance to the key colour.
    Chroma,
}

/// Layout of a negotiated format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatDescriptor {
    Planar {
        format: PixelFormat,
        shift_x: u32,
        shift_y: u32,
    },
    Packed {
        format: PixelFormat,
        /// Byte offsets of (R|Y, G|U, B|V, A) inside a pixel
        map: [usize; 4],
        mode: KeyMode,
    },
}

impl FormatDescriptor {
    pub fn new(format: PixelFormat) -> Self {
        match format.component_offsets() {
            Some(map) => Self::Packed {
                format,
                map,
                mode: if format.is_rgb() {
                    KeyMode::CopyChannel
                } else {
                    KeyMode::Chroma
                },
            },
            None => {
                let (shift_x, shift_y) = format.chroma_shift();
                Self::Planar {
                    format,
                    shift_x,
                    shift_y,
                }
            }
        }
    }

    pub fn format(&self) -> PixelFormat {
        match *self {
            Self::Planar { format, .. } | Self::Packed { format, .. } => format,
        }
    }

    pub fn mode(&self) -> KeyMode {
        match *self {
            Self::Planar { .. } => KeyMode::Chroma,
            Self::Packed { mode, .. } => mode,
        }
    }

    /// Chroma sample coordinate for luma pixel `(x, y)`.
    #[inline]
    pub fn chroma_coords(&self, x: u32, y: u32) -> (u32, u32) {
        match *self {
            Self::Planar {
                shift_x, shift_y, ..
            } => (x >> shift_x, y >> shift_y),
            Self::Packed { .. } => (x, y),
        }
    }

    /// Reject frames the accessors cannot safely index.
    pub fn check(&self, frame: &Frame) -> Result<(), KeyError> {
        if frame.format != self.format() {
            return Err(KeyError::FrameMismatch(format!(
                "expected {}, got {}",
                self.format(),
                frame.format
            )));
        }
        frame.validate()?;
        Ok(())
    }

    /// Fill `out` with the `(u, v)` pair of every pixel of luma row `y`.
    pub fn read_chroma_row(&self, frame: &Frame, y: u32, out: &mut Vec<[u8; 2]>) {
        out.clear();
        match *self {
            Self::Planar {
                shift_x, shift_y, ..
            } => {
                let cy = y >> shift_y;
                let u_row = frame.plane(1).row(cy);
                let v_row = frame.plane(2).row(cy);
                out.extend((0..frame.width as usize).map(|x| {
                    let cx = x >> shift_x;
                    [u_row[cx], v_row[cx]]
                }));
            }
            Self::Packed { map, .. } => {
                let row = frame.plane(0).row(y);
                out.extend(
                    row.chunks_exact(4)
                        .take(frame.width as usize)
                        .map(|px| [px[map[1]], px[map[2]]]),
                );
            }
        }
    }

    /// Fill `out` with the first colour channel (R or Y) of luma row `y`.
    pub fn read_key_row(&self, frame: &Frame, y: u32, out: &mut Vec<u8>) {
        out.clear();
        match *self {
            Self::Planar { .. } => {
                out.extend_from_slice(&frame.plane(0).row(y)[..frame.width as usize]);
            }
            Self::Packed { map, .. } => {
                let row = frame.plane(0).row(y);
                out.extend(
                    row.chunks_exact(4)
                        .take(frame.width as usize)
                        .map(|px| px[map[0]]),
                );
            }
        }
    }

    /// Overwrite the alpha samples of row `y`.
    pub fn write_alpha_row(&self, frame: &mut Frame, y: u32, alpha: &[u8]) {
        let width = frame.width as usize;
        match *self {
            Self::Planar { .. } => {
                frame.plane_mut(3).row_mut(y)[..width].copy_from_slice(&alpha[..width]);
            }
            Self::Packed { map, .. } => {
                let row = frame.plane_mut(0).row_mut(y);
                for (px, &a) in row.chunks_exact_mut(4).zip(alpha).take(width) {
                    px[map[3]] = a;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_prefers_planar() {
        let picked = negotiate(
            &[PixelFormat::Rgba, PixelFormat::Yuva420P],
            &[PixelFormat::Yuva420P, PixelFormat::Rgba],
        )
        .unwrap();
        assert_eq!(picked, PixelFormat::Yuva420P);
    }

    #[test]
    fn test_negotiate_fails_without_overlap() {
        let err = negotiate(&[PixelFormat::Rgba], &[PixelFormat::Bgra]).unwrap_err();
        assert_eq!(err.input, vec![PixelFormat::Rgba]);
        assert!(negotiate(&[], &SUPPORTED_FORMATS).is_err());
    }

    #[test]
    fn test_modes() {
        assert_eq!(FormatDescriptor::new(PixelFormat::Bgra).mode(), KeyMode::CopyChannel);
        assert_eq!(FormatDescriptor::new(PixelFormat::Ayuv).mode(), KeyMode::Chroma);
        assert_eq!(FormatDescriptor::new(PixelFormat::Yuva422P).mode(), KeyMode::Chroma);
    }

    #[test]
    fn test_chroma_coords_follow_subsampling() {
        let d = |f| FormatDescriptor::new(f);
        assert_eq!(d(PixelFormat::Yuva444P).chroma_coords(5, 7), (5, 7));
        assert_eq!(d(PixelFormat::Yuva422P).chroma_coords(5, 7), (2, 7));
        assert_eq!(d(PixelFormat::Yuva420P).chroma_coords(5, 7), (2, 3));
        assert_eq!(d(PixelFormat::Yuva440P).chroma_coords(5, 7), (5, 3));
        assert_eq!(d(PixelFormat::Vuya).chroma_coords(5, 7), (5, 7));
    }

    #[test]
    fn test_planar_row_access() {
        let mut frame = Frame::new(4, 2, PixelFormat::Yuva420P);
        frame.plane_mut(1).row_mut(0).copy_from_slice(&[10, 20]);
        frame.plane_mut(2).row_mut(0).copy_from_slice(&[30, 40]);
        let desc = FormatDescriptor::new(PixelFormat::Yuva420P);

        let mut chroma = Vec::new();
        desc.read_chroma_row(&frame, 1, &mut chroma);
        assert_eq!(chroma, vec![[10, 30], [10, 30], [20, 40], [20, 40]]);

        desc.write_alpha_row(&mut frame, 1, &[1, 2, 3, 4]);
        assert_eq!(frame.plane(3).row(1), &[1, 2, 3, 4]);
        assert_eq!(frame.plane(3).row(0), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_packed_row_access() {
        let mut frame = Frame::new(2, 1, PixelFormat::Avuy);
        frame.fill([50, 60, 70, 255]);
        let desc = FormatDescriptor::new(PixelFormat::Avuy);

        let mut chroma = Vec::new();
        desc.read_chroma_row(&frame, 0, &mut chroma);
        assert_eq!(chroma, vec![[60, 70], [60, 70]]);

        let mut key = Vec::new();
        desc.read_key_row(&frame, 0, &mut key);
        assert_eq!(key, vec![50, 50]);

        desc.write_alpha_row(&mut frame, 0, &[9, 8]);
        // A V U Y
        assert_eq!(frame.plane(0).row(0), &[9, 70, 60, 50, 8, 70, 60, 50]);
    }

    #[test]
    fn test_check_rejects_mismatch() {
        let desc = FormatDescriptor::new(PixelFormat::Rgba);
        assert!(desc.check(&Frame::new(2, 2, PixelFormat::Rgba)).is_ok());
        assert!(matches!(
            desc.check(&Frame::new(2, 2, PixelFormat::Bgra)),
            Err(KeyError::FrameMismatch(_))
        ));
        let mut broken = Frame::new(2, 2, PixelFormat::Rgba);
        broken.planes.clear();
        assert!(matches!(desc.check(&broken), Err(KeyError::Frame(_))));
    }
}
