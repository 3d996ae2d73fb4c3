use simshm::{Frame, ImageKind};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Counters for one reporting window plus running totals.
#[derive(Debug)]
pub struct FrameStats {
    window_start: Instant,
    window_frames: u64,
    window_kinds: BTreeMap<u32, u64>,
    pub total_frames: u64,
    pub total_malformed: u64,
    pub last_timestamp: Option<u64>,
}

/// Snapshot of a finished window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub frames: u64,
    pub fps: f64,
    pub kinds: Vec<(ImageKind, u64)>,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            window_frames: 0,
            window_kinds: BTreeMap::new(),
            total_frames: 0,
            total_malformed: 0,
            last_timestamp: None,
        }
    }

    pub fn record(&mut self, frame: &Frame) {
        self.window_frames += 1;
        self.total_frames += 1;
        *self.window_kinds.entry(frame.image_kind.tag()).or_default() += 1;
        self.last_timestamp = Some(frame.capture_timestamp);
    }

    pub fn record_malformed(&mut self) {
        self.total_malformed += 1;
    }

    /// Close the window if `interval` has elapsed and start a new one.
    pub fn roll(&mut self, now: Instant, interval: Duration) -> Option<WindowReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < interval {
            return None;
        }

        let report = WindowReport {
            frames: self.window_frames,
            fps: self.window_frames as f64 / elapsed.as_secs_f64(),
            kinds: self
                .window_kinds
                .iter()
                .map(|(&tag, &count)| (ImageKind::from(tag), count))
                .collect(),
        };

        self.window_start = now;
        self.window_frames = 0;
        self.window_kinds.clear();
        Some(report)
    }
}
