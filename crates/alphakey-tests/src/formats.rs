//! Integration tests for the pixel format adapter.
//!
//! The same picture stored in different layouts must key to the same alpha.

use alphakey_core::{Frame, PixelFormat};
use alphakey_effects::{ChromaKeyProcessor, FormatDescriptor, KeyParams};
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────

const W: u32 = 16;
const H: u32 = 12;

/// Chroma at `(x, y)`, constant over 2x2 blocks so every subsampling
/// stores the same picture.
fn chroma_at(x: u32, y: u32, seed: u8) -> (u8, u8) {
    let (bx, by) = (x / 2, y / 2);
    let u = (bx * 29 + by * 13) as u8 ^ seed;
    let v = (bx * 7 + by * 41) as u8 ^ seed.rotate_left(3);
    (u, v)
}

fn planar(format: PixelFormat, seed: u8) -> Frame {
    let mut frame = Frame::new(W, H, format);
    frame.fill([77, 0, 0, 0]);
    let desc = FormatDescriptor::new(format);
    for y in 0..H {
        for x in 0..W {
            let (cx, cy) = desc.chroma_coords(x, y);
            let (u, v) = chroma_at(x, y, seed);
            frame.plane_mut(1).row_mut(cy)[cx as usize] = u;
            frame.plane_mut(2).row_mut(cy)[cx as usize] = v;
        }
    }
    frame
}

fn packed(format: PixelFormat, seed: u8) -> Frame {
    let mut frame = Frame::new(W, H, format);
    let map = format.component_offsets().unwrap();
    for y in 0..H {
        let row = frame.plane_mut(0).row_mut(y);
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let (u, v) = chroma_at(x as u32, y, seed);
            px[map[0]] = 77;
            px[map[1]] = u;
            px[map[2]] = v;
            px[map[3]] = 0;
        }
    }
    frame
}

fn frame_for(format: PixelFormat, seed: u8) -> Frame {
    if format.is_planar() {
        planar(format, seed)
    } else {
        packed(format, seed)
    }
}

fn alpha_of(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::new();
    for y in 0..frame.height {
        match frame.format.component_offsets() {
            None => out.extend_from_slice(frame.plane(3).row(y)),
            Some(map) => out.extend(frame.plane(0).row(y).chunks_exact(4).map(|px| px[map[3]])),
        }
    }
    out
}

fn keyed(format: PixelFormat, params: &KeyParams, scale: f64, seed: u8) -> Vec<u8> {
    let mut frame = frame_for(format, seed);
    let mut proc = ChromaKeyProcessor::new(FormatDescriptor::new(format));
    proc.process(&mut frame, params, scale).unwrap();
    alpha_of(&frame)
}

const KEYED: [PixelFormat; 8] = [
    PixelFormat::Yuva444P,
    PixelFormat::Yuva422P,
    PixelFormat::Yuva420P,
    PixelFormat::Yuva440P,
    PixelFormat::Yuva,
    PixelFormat::Ayuv,
    PixelFormat::Vuya,
    PixelFormat::Avuy,
];

fn assert_close(a: &[u8], b: &[u8], what: &str) {
    assert_eq!(a.len(), b.len());
    for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
        assert!(
            (x as i32 - y as i32).abs() <= 1,
            "{what}: pixel {i} differs ({x} vs {y})"
        );
    }
}

// ── Equivalence ────────────────────────────────────────────────

#[test]
fn every_keyed_layout_matches_444() {
    let params = KeyParams::parse("u=100:v=120:min=20:max=90").unwrap();
    let reference = keyed(PixelFormat::Yuva444P, &params, 1.0, 5);
    assert!(reference.iter().any(|&a| a > 0 && a < 255), "no feathered pixels");
    for format in KEYED {
        assert_close(&keyed(format, &params, 1.0, 5), &reference, format.name());
    }
}

#[test]
fn squared_tolerance_matches_radius() {
    let radius = KeyParams::parse("u=40:v=200:min=15:max=60").unwrap();
    let squared = KeyParams::parse("u=40:v=200:min=225:max=3600:tolerance=squared").unwrap();
    for format in KEYED {
        assert_eq!(keyed(format, &radius, 1.0, 9), keyed(format, &squared, 1.0, 9));
    }
}

#[test]
fn rgb_layouts_copy_red() {
    for format in [
        PixelFormat::Rgba,
        PixelFormat::Bgra,
        PixelFormat::Argb,
        PixelFormat::Abgr,
    ] {
        let mut frame = Frame::new(W, H, format);
        frame.fill([201, 3, 4, 0]);
        let mut proc = ChromaKeyProcessor::new(FormatDescriptor::new(format));
        proc.process(&mut frame, &KeyParams::default(), 1.0).unwrap();
        assert!(alpha_of(&frame).iter().all(|&a| a == 201), "{}", format);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn packed_matches_planar(seed in any::<u8>(), u in any::<u8>(), v in any::<u8>(), min in 0u32..100, width in 0u32..100, scale in 0.0f64..1.5) {
        let params = KeyParams { u, v, min, max: min + width, ..Default::default() };
        let reference = keyed(PixelFormat::Yuva420P, &params, scale, seed);
        for format in [PixelFormat::Yuva, PixelFormat::Avuy] {
            let other = keyed(format, &params, scale, seed);
            for (&a, &b) in other.iter().zip(&reference) {
                prop_assert!((a as i32 - b as i32).abs() <= 1);
            }
        }
    }
}
