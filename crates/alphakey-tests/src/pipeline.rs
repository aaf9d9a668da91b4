//! Integration tests for the full pipeline.
//!
//! Exercises cross-crate interactions between alphakey-core,
//! alphakey-effects and alphakey-media.

use std::fs;
use std::thread;

use alphakey_core::{Frame, FrameRate, PixelFormat, RationalTime, StreamInfo};
use alphakey_effects::{
    ChromaKeyStage, FileSource, NoSource, ParameterStore, SharedSource, StageConfig,
};
use alphakey_media::{
    channel_link, FramePump, FrameSink, FrameSource, IterSource, RawFileSink, RawFileSource,
    StreamError, VecSink,
};

// ── Helpers ────────────────────────────────────────────────────

fn green_frames(n: i64, format: PixelFormat) -> Vec<Frame> {
    (0..n)
        .map(|i| {
            let mut frame = Frame::new(8, 4, format);
            frame.fill([60, 128, 128, 0]);
            frame.with_pts(RationalTime::from_frames(i, FrameRate::FPS_25))
        })
        .collect()
}

fn stage_with(options: &str, source: Box<dyn alphakey_effects::ConfigSource>) -> ChromaKeyStage {
    let config = StageConfig::from_options(options, PixelFormat::Yuva444P).unwrap();
    ChromaKeyStage::new(config, source)
}

fn first_alpha(frame: &Frame) -> u8 {
    frame.plane(3).row(0)[0]
}

// ── Scenario ───────────────────────────────────────────────────

#[test]
fn key_colour_becomes_transparent() {
    let mut sink = VecSink::new();
    let stage = stage_with("u=128:v=128:min=10:max=30", Box::new(NoSource));
    let mut pump = FramePump::new(
        stage,
        IterSource::from_frames(green_frames(5, PixelFormat::Yuva444P)),
        &mut sink,
    );
    assert_eq!(pump.run_to_end().unwrap(), 5);
    drop(pump);

    assert!(sink.finished);
    for frame in &sink.frames {
        assert!(frame.plane(3).row(2).iter().all(|&a| a == 0));
        // Luma is never touched
        assert!(frame.plane(0).row(2).iter().all(|&s| s == 60));
    }
}

#[test]
fn alpha_fades_in_over_time() {
    let mut sink = VecSink::new();
    let stage = stage_with("max=10:alpha=clip(t,0,1)", Box::new(NoSource));
    let mut pump = FramePump::new(
        stage,
        IterSource::from_frames(green_frames(30, PixelFormat::Yuva444P)),
        &mut sink,
    );
    pump.run_to_end().unwrap();
    drop(pump);

    let alphas: Vec<u8> = sink.frames.iter().map(first_alpha).collect();
    assert_eq!(alphas[0], 0);
    assert!(alphas.windows(2).all(|w| w[0] <= w[1]));
    // t = 0.2 s at frame 5
    assert_eq!(alphas[5], 51);
    assert_eq!(alphas[29], 255);
}

// ── Hot reload ─────────────────────────────────────────────────

#[test]
fn reload_file_between_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uv.txt");

    let stage = stage_with("u=128:v=128:min=10:max=30", Box::new(FileSource::new(&path)));
    let mut sink = VecSink::new();
    let mut pump = FramePump::new(
        stage,
        IterSource::from_frames(green_frames(4, PixelFormat::Yuva444P)),
        &mut sink,
    );

    // No file yet: initial parameters apply
    pump.on_downstream_request().unwrap();

    fs::write(&path, "u=0:v=0\n").unwrap();
    pump.on_downstream_request().unwrap();

    // Malformed lines are ignored
    fs::write(&path, "u=0:v=banana\n").unwrap();
    pump.on_downstream_request().unwrap();

    fs::remove_file(&path).unwrap();
    pump.on_downstream_request().unwrap();
    assert_eq!(pump.stage().store().generation(), 1);
    drop(pump);

    let alphas: Vec<u8> = sink.frames.iter().map(first_alpha).collect();
    assert_eq!(alphas, vec![0, 255, 255, 255]);
}

#[test]
fn reload_from_missing_file_keeps_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ParameterStore::fixed(
        alphakey_effects::KeyParams::parse("u=1:v=2:min=3:max=4:alpha=t").unwrap(),
    );
    let before = store.get();
    let mut missing = FileSource::new(dir.path().join("nope.txt"));
    assert!(!store.reload_from(&mut missing).unwrap());
    assert_eq!(*store.get(), *before);
}

#[test]
fn shared_source_tunes_running_stage() {
    let handle = SharedSource::new();
    let stage = stage_with("u=128:v=128:min=10:max=30", Box::new(handle.clone()));
    let mut sink = VecSink::new();
    let mut pump = FramePump::new(stage, IterSource::from_frames(vec![]), &mut sink);

    let mut frames = green_frames(2, PixelFormat::Yuva444P).into_iter();
    pump.on_upstream_frame(frames.next().unwrap()).unwrap();
    let tuner = thread::spawn(move || handle.set("min=0:max=0"));
    tuner.join().unwrap();
    pump.on_upstream_frame(frames.next().unwrap()).unwrap();
    drop(pump);

    let alphas: Vec<u8> = sink.frames.iter().map(first_alpha).collect();
    assert_eq!(alphas, vec![0, 255]);
}

// ── Links ──────────────────────────────────────────────────────

#[test]
fn stage_behind_channel_link() {
    let (mut tx, rx) = channel_link(2);
    let producer = thread::spawn(move || {
        for frame in green_frames(6, PixelFormat::Yuva444P) {
            tx.push(frame).unwrap();
        }
    });

    let mut sink = VecSink::new();
    let stage = stage_with("u=128:v=128:max=5", Box::new(NoSource));
    let mut pump = FramePump::new(stage, rx, &mut sink);
    assert_eq!(pump.run_to_end().unwrap(), 6);
    producer.join().unwrap();
    drop(pump);

    let pts: Vec<f64> = sink.frames.iter().map(Frame::pts_seconds).collect();
    assert_eq!(pts, vec![0.0, 0.04, 0.08, 0.12, 0.16, 0.2]);
}

#[test]
fn upstream_failure_reaches_caller() {
    let (tx, rx) = channel_link(1);
    tx.fail(StreamError::Upstream("capture device lost".into())).unwrap();
    drop(tx);

    let stage = stage_with("", Box::new(NoSource));
    let mut pump = FramePump::new(stage, rx, VecSink::new());
    assert!(pump.run_to_end().is_err());
    assert_eq!(pump.frames_emitted(), 0);
}

// ── Raw files ──────────────────────────────────────────────────

#[test]
fn raw_file_round_trip_through_stage() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.raw");
    let output = dir.path().join("out.raw");
    let info = StreamInfo::new(8, 4, PixelFormat::Ayuv, FrameRate::FPS_25).unwrap();

    let mut writer = RawFileSink::create(&input).unwrap();
    for frame in green_frames(3, PixelFormat::Ayuv) {
        writer.push(frame).unwrap();
    }
    writer.finish().unwrap();
    drop(writer);

    let config = StageConfig::from_options("u=128:v=128:min=10:max=30", PixelFormat::Ayuv).unwrap();
    let stage = ChromaKeyStage::new(config, Box::new(NoSource));
    assert_eq!(stage.configure_output(&info).unwrap(), info);

    let mut pump = FramePump::new(
        stage,
        RawFileSource::open(&input, info).unwrap(),
        RawFileSink::create(&output).unwrap(),
    );
    assert_eq!(pump.run_to_end().unwrap(), 3);
    drop(pump);

    let mut reader = RawFileSource::open(&output, info).unwrap();
    let mut count = 0;
    while let Ok(frame) = reader.pull() {
        // A Y U V, alpha first
        assert!(frame.plane(0).row(0).chunks_exact(4).all(|px| px == [0, 60, 128, 128]));
        count += 1;
    }
    assert_eq!(count, 3);
}
