//! In-memory stand-ins for the camera, detector and serial port used by unit tests.

use marker_signal_common::frame::{Frame, PixelLayout};
use marker_signal_common::marker::MarkerSet;
use std::collections::VecDeque;
use std::io;
use std::time::Instant;

use crate::detector::{DetectError, MarkerDetector};
use crate::link::SerialLink;
use crate::source::{FrameSource, SourceError};

/// Tiny gray frame with the given sequence number.
pub(crate) fn gray_frame(seq: u64) -> Frame {
    Frame::new(vec![0; 4], 2, 2, PixelLayout::Gray8, seq, 1708300000000 + seq as i64 * 100)
        .expect("valid frame")
}

/// Serial link that records every write with the instant it happened.
#[derive(Default)]
pub(crate) struct MemoryLink {
    inbound: VecDeque<u8>,
    writes: Vec<(Instant, u8)>,
    fail_writes: bool,
}

impl MemoryLink {
    pub(crate) fn with_inbound(bytes: &[u8]) -> Self {
        Self {
            inbound: bytes.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub(crate) fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.writes.iter().map(|(_, b)| *b).collect()
    }

    pub(crate) fn write_times(&self) -> Vec<Instant> {
        self.writes.iter().map(|(t, _)| *t).collect()
    }
}

impl SerialLink for MemoryLink {
    fn drain_input(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.inbound.drain(..).collect())
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        self.writes.push((Instant::now(), byte));
        Ok(())
    }
}

/// Bounded source that yields `count` frames, then reports exhaustion,
/// or fails on the given frame index.
pub(crate) struct ScriptedSource {
    next: u64,
    count: u64,
    fail_at: Option<u64>,
}

impl ScriptedSource {
    pub(crate) fn new(count: u64) -> Self {
        Self {
            next: 0,
            count,
            fail_at: None,
        }
    }

    pub(crate) fn failing_at(count: u64, fail_at: u64) -> Self {
        Self {
            next: 0,
            count,
            fail_at: Some(fail_at),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        if self.fail_at == Some(self.next) {
            return Err(SourceError::Capture("camera went away".into()));
        }
        if self.next >= self.count {
            return Ok(None);
        }
        let frame = gray_frame(self.next);
        self.next += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Detector that replays a fixed list of results, one per frame, repeating the last.
pub(crate) struct ScriptedDetector {
    results: Vec<MarkerSet>,
    calls: usize,
    fail: bool,
}

impl ScriptedDetector {
    pub(crate) fn new(results: Vec<MarkerSet>) -> Self {
        Self {
            results,
            calls: 0,
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            results: Vec::new(),
            calls: 0,
            fail: true,
        }
    }
}

impl MarkerDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<MarkerSet, DetectError> {
        if self.fail {
            return Err(DetectError::Library("dictionary not loaded".into()));
        }
        let idx = self.calls.min(self.results.len().saturating_sub(1));
        self.calls += 1;
        Ok(self.results.get(idx).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn markers(ids: &[i32]) -> MarkerSet {
    ids.iter().copied().collect()
}
