//! Pull-driven frame pump.
//!
//! A downstream request pulls from upstream until a frame is queued, then
//! keys and emits exactly one frame. Frames delivered by push are drained
//! immediately, so the stage adds no latency in either mode. Everything
//! happens on the caller's stack; there is no worker thread.

use std::collections::VecDeque;

use alphakey_core::Frame;
use alphakey_effects::ChromaKeyStage;
use tracing::{debug, info, warn};

use crate::error::{PumpError, StreamError};
use crate::io::{FrameSink, FrameSource};

/// Where the pump is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    /// Blocked on an upstream pull
    AwaitingUpstream,
    /// Keying and emitting queued frames
    Draining,
}

/// Moves frames from `U` through a keying stage into `D`.
pub struct FramePump<U: FrameSource, D: FrameSink> {
    upstream: U,
    downstream: D,
    stage: ChromaKeyStage,
    queue: VecDeque<Frame>,
    state: PumpState,
    emitted: u64,
    dropped: u64,
}

impl<U: FrameSource, D: FrameSink> FramePump<U, D> {
    pub fn new(stage: ChromaKeyStage, upstream: U, downstream: D) -> Self {
        Self {
            upstream,
            downstream,
            stage,
            queue: VecDeque::new(),
            state: PumpState::Idle,
            emitted: 0,
            dropped: 0,
        }
    }

    /// Serve one downstream request.
    ///
    /// Emits exactly one frame, or returns the upstream error unchanged
    /// without emitting anything.
    pub fn on_downstream_request(&mut self) -> Result<(), PumpError> {
        self.state = PumpState::Draining;
        while self.queue.is_empty() {
            self.state = PumpState::AwaitingUpstream;
            match self.upstream.pull() {
                Ok(frame) => self.queue.push_back(frame),
                Err(err) => {
                    self.state = PumpState::Idle;
                    return Err(err.into());
                }
            }
        }
        self.state = PumpState::Draining;
        let result = match self.queue.pop_front() {
            Some(frame) => self.transform_and_emit(frame),
            None => Ok(()),
        };
        self.state = PumpState::Idle;
        result
    }

    /// Accept a frame pushed from upstream and drain the whole queue.
    ///
    /// Returns the number of frames emitted. On the first failure the
    /// failing frame is gone and any frames behind it stay queued.
    pub fn on_upstream_frame(&mut self, frame: Frame) -> Result<usize, PumpError> {
        self.queue.push_back(frame);
        self.state = PumpState::Draining;
        let mut count = 0;
        let result = loop {
            let Some(frame) = self.queue.pop_front() else {
                break Ok(count);
            };
            if let Err(err) = self.transform_and_emit(frame) {
                break Err(err);
            }
            count += 1;
        };
        self.state = PumpState::Idle;
        result
    }

    fn transform_and_emit(&mut self, mut frame: Frame) -> Result<(), PumpError> {
        if let Err(err) = self.stage.process(&mut frame) {
            self.dropped += 1;
            debug!(dropped = self.dropped, "frame dropped");
            return Err(err.into());
        }
        self.downstream.push(frame)?;
        self.emitted += 1;
        Ok(())
    }

    /// Request frames until upstream ends, then finish the downstream.
    ///
    /// Frames that fail to key are logged and skipped; link errors stop
    /// the run. Returns the number of frames emitted.
    pub fn run_to_end(&mut self) -> Result<u64, PumpError> {
        loop {
            match self.on_downstream_request() {
                Ok(()) => {}
                Err(PumpError::Stream(StreamError::EndOfStream)) => break,
                Err(PumpError::Key(err)) => warn!(%err, "skipping frame"),
                Err(err) => return Err(err),
            }
        }
        self.downstream.finish()?;
        info!(
            emitted = self.emitted,
            dropped = self.dropped,
            "stream finished"
        );
        Ok(self.emitted)
    }

    /// Release every queued frame without emitting it.
    pub fn discard_all(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        if count > 0 {
            debug!(count, "discarded queued frames");
        }
        count
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }

    pub fn frames_dropped(&self) -> u64 {
        self.dropped
    }

    pub fn stage(&self) -> &ChromaKeyStage {
        &self.stage
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub fn downstream(&self) -> &D {
        &self.downstream
    }
}

impl<U: FrameSource, D: FrameSink> Drop for FramePump<U, D> {
    fn drop(&mut self) {
        self.discard_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{IterSource, VecSink};
    use alphakey_core::{PixelFormat, RationalTime};
    use alphakey_effects::{NoSource, StageConfig};
    use proptest::prelude::*;

    fn stage(options: &str) -> ChromaKeyStage {
        let config = StageConfig::from_options(options, PixelFormat::Yuva444P).unwrap();
        ChromaKeyStage::new(config, Box::new(NoSource))
    }

    fn frames(n: i64) -> Vec<Frame> {
        (0..n)
            .map(|i| {
                let mut frame = Frame::new(4, 2, PixelFormat::Yuva444P);
                frame.fill([0, 200, 200, 0]);
                frame.with_pts(RationalTime::new(i, 25))
            })
            .collect()
    }

    fn pts(sink: &VecSink) -> Vec<f64> {
        sink.frames.iter().map(Frame::pts_seconds).collect()
    }

    #[test]
    fn test_request_emits_one_frame() {
        let mut sink = VecSink::new();
        let mut pump = FramePump::new(stage("max=30"), IterSource::from_frames(frames(3)), &mut sink);
        pump.on_downstream_request().unwrap();
        assert_eq!(pump.frames_emitted(), 1);
        assert_eq!(pump.state(), PumpState::Idle);
        assert_eq!(pump.upstream().pulls(), 1);
        drop(pump);
        assert_eq!(sink.frames.len(), 1);
        assert!(sink.frames[0].plane(3).row(0).iter().all(|&a| a == 255));
    }

    #[test]
    fn test_eof_on_kth_pull() {
        let mut sink = VecSink::new();
        let mut pump = FramePump::new(stage(""), IterSource::from_frames(frames(2)), &mut sink);
        pump.on_downstream_request().unwrap();
        pump.on_downstream_request().unwrap();
        let err = pump.on_downstream_request().unwrap_err();
        assert!(err.is_end_of_stream());
        assert_eq!(pump.state(), PumpState::Idle);
        drop(pump);
        assert_eq!(sink.frames.len(), 2);
    }

    #[test]
    fn test_upstream_error_propagates() {
        let items = vec![Err(StreamError::Upstream("decode".into()))];
        let mut pump = FramePump::new(stage(""), IterSource::new(items.into_iter()), VecSink::new());
        assert!(matches!(
            pump.on_downstream_request(),
            Err(PumpError::Stream(StreamError::Upstream(_)))
        ));
        assert_eq!(pump.frames_emitted(), 0);
    }

    #[test]
    fn test_push_drains_immediately() {
        let mut sink = VecSink::new();
        let mut pump = FramePump::new(stage(""), IterSource::from_frames(vec![]), &mut sink);
        for frame in frames(3) {
            assert_eq!(pump.on_upstream_frame(frame).unwrap(), 1);
            assert_eq!(pump.queued(), 0);
        }
        drop(pump);
        assert_eq!(pts(&sink), vec![0.0, 0.04, 0.08]);
    }

    #[test]
    fn test_failed_frame_is_dropped() {
        // `t` is undefined for a frame without a timestamp
        let mut input = frames(3);
        input[1].pts = None;
        let mut sink = VecSink::new();
        let mut pump = FramePump::new(stage("alpha=1+t*0"), IterSource::from_frames(input), &mut sink);

        pump.on_downstream_request().unwrap();
        assert!(matches!(pump.on_downstream_request(), Err(PumpError::Key(_))));
        pump.on_downstream_request().unwrap();
        assert_eq!(pump.frames_dropped(), 1);
        drop(pump);
        assert_eq!(pts(&sink), vec![0.0, 0.08]);
    }

    #[test]
    fn test_run_to_end_skips_failures() {
        let mut input = frames(4);
        input[2].pts = None;
        let mut sink = VecSink::new();
        let mut pump = FramePump::new(stage("alpha=t+1"), IterSource::from_frames(input), &mut sink);
        assert_eq!(pump.run_to_end().unwrap(), 3);
        drop(pump);
        assert!(sink.finished);
        assert_eq!(sink.frames.len(), 3);
    }

    #[test]
    fn test_discard_all() {
        let mut pump = FramePump::new(stage(""), IterSource::from_frames(vec![]), VecSink::new());
        pump.queue.extend(frames(2));
        assert_eq!(pump.discard_all(), 2);
        assert_eq!(pump.queued(), 0);
        assert_eq!(pump.frames_emitted(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_n_requests_n_frames_in_order(n in 1i64..24, extra in 0i64..8) {
            let mut sink = VecSink::new();
            let mut pump = FramePump::new(stage(""), IterSource::from_frames(frames(n + extra)), &mut sink);
            for _ in 0..n {
                pump.on_downstream_request().unwrap();
            }
            prop_assert_eq!(pump.upstream().pulls() as i64, n);
            drop(pump);
            let expected: Vec<f64> = (0..n).map(|i| i as f64 / 25.0).collect();
            prop_assert_eq!(pts(&sink), expected);
        }

        #[test]
        fn prop_eof_at_k(k in 0i64..16) {
            let mut sink = VecSink::new();
            let mut pump = FramePump::new(stage(""), IterSource::from_frames(frames(k)), &mut sink);
            for _ in 0..k {
                pump.on_downstream_request().unwrap();
            }
            prop_assert!(pump.on_downstream_request().unwrap_err().is_end_of_stream());
            drop(pump);
            prop_assert_eq!(sink.frames.len() as i64, k);
        }
    }
}
