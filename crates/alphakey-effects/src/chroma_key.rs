//! Chroma keying: alpha from the distance between a pixel's chroma and the
//! key colour, with a linear feather between two thresholds.

use alphakey_core::Frame;
use tracing::info;

use crate::error::KeyError;
use crate::format::{FormatDescriptor, KeyMode};
use crate::params::{KeyParams, Thresholds};

/// Half-size of the centre window sampled for diagnostics.
pub const STATS_WINDOW: u32 = 100;

/// Mean chroma over the centre window of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaStats {
    pub mean_u: f64,
    pub mean_v: f64,
    pub samples: u64,
}

/// Result of keying one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyOutcome {
    /// Present when `print_uv` was set and the format carries chroma
    pub stats: Option<ChromaStats>,
}

/// Normalised alpha in `[0, 1]` for squared chroma distance `r2`.
///
/// A band with `outer <= inner` degenerates to a step at `inner`.
#[inline]
pub fn feather(r2: u32, th: Thresholds) -> f64 {
    if r2 < th.inner {
        0.0
    } else if r2 < th.outer {
        (r2 - th.inner) as f64 / (th.outer - th.inner) as f64
    } else {
        1.0
    }
}

/// Scale, clamp and quantise a normalised alpha to a sample.
#[inline]
pub fn quantize(r_norm: f64, scale: f64) -> u8 {
    ((r_norm * scale).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Squared distance between `(u, v)` and the key centre.
#[inline]
pub fn chroma_distance2(u: u8, v: u8, center_u: u8, center_v: u8) -> u32 {
    let du = u as i32 - center_u as i32;
    let dv = v as i32 - center_v as i32;
    (du * du + dv * dv) as u32
}

/// Alpha sample for a single chroma pair.
#[inline]
pub fn key_alpha(u: u8, v: u8, params: &KeyParams, scale: f64) -> u8 {
    let r2 = chroma_distance2(u, v, params.u, params.v);
    quantize(feather(r2, params.thresholds()), scale)
}

/// Keys frames of one negotiated format, reusing its row buffers.
pub struct ChromaKeyProcessor {
    descriptor: FormatDescriptor,
    chroma: Vec<[u8; 2]>,
    alpha: Vec<u8>,
}

impl ChromaKeyProcessor {
    pub fn new(descriptor: FormatDescriptor) -> Self {
        Self {
            descriptor,
            chroma: Vec::new(),
            alpha: Vec::new(),
        }
    }

    pub fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    /// Overwrite the alpha channel of `frame`.
    ///
    /// The frame is checked against the descriptor before any sample is
    /// written, so a rejected frame is left untouched.
    pub fn process(
        &mut self,
        frame: &mut Frame,
        params: &KeyParams,
        scale: f64,
    ) -> Result<KeyOutcome, KeyError> {
        self.descriptor.check(frame)?;
        match self.descriptor.mode() {
            KeyMode::CopyChannel => {
                self.copy_channel(frame);
                Ok(KeyOutcome::default())
            }
            KeyMode::Chroma => Ok(self.key_chroma(frame, params, scale)),
        }
    }

    fn copy_channel(&mut self, frame: &mut Frame) {
        for y in 0..frame.height {
            self.descriptor.read_key_row(frame, y, &mut self.alpha);
            self.descriptor.write_alpha_row(frame, y, &self.alpha);
        }
    }

    fn key_chroma(&mut self, frame: &mut Frame, params: &KeyParams, scale: f64) -> KeyOutcome {
        let th = params.thresholds();
        let (cx, cy) = (frame.width / 2, frame.height / 2);
        let x_range = cx.saturating_sub(STATS_WINDOW) as usize
            ..(cx + STATS_WINDOW + 1).min(frame.width) as usize;
        let (mut sum_u, mut sum_v, mut count) = (0u64, 0u64, 0u64);

        for y in 0..frame.height {
            self.descriptor.read_chroma_row(frame, y, &mut self.chroma);

            self.alpha.clear();
            self.alpha.extend(self.chroma.iter().map(|&[u, v]| {
                let r2 = chroma_distance2(u, v, params.u, params.v);
                quantize(feather(r2, th), scale)
            }));
            self.descriptor.write_alpha_row(frame, y, &self.alpha);

            if params.print_uv && y.abs_diff(cy) <= STATS_WINDOW {
                for &[u, v] in &self.chroma[x_range.clone()] {
                    sum_u += u as u64;
                    sum_v += v as u64;
                    count += 1;
                }
            }
        }

        if !params.print_uv || count == 0 {
            return KeyOutcome::default();
        }
        let stats = ChromaStats {
            mean_u: sum_u as f64 / count as f64,
            mean_v: sum_v as f64 / count as f64,
            samples: count,
        };
        info!(
            u = stats.mean_u,
            v = stats.mean_v,
            samples = stats.samples,
            "centre chroma"
        );
        KeyOutcome { stats: Some(stats) }
    }
}
