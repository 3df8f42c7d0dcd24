//! The debug overlay hook.
//!
//! The renderer starts an overlay frame on every [`crate::Renderer::clear`],
//! renders it right before the buffer swap and shuts it down on quit. What the
//! overlay actually shows is up to the implementation.

use std::time::{Duration, Instant};

pub trait Overlay {
    /// Called once per frame after the framebuffer has been cleared.
    fn new_frame(&mut self);

    /// Called after the scene has been drawn, before presenting.
    fn render(&mut self) {}

    fn shutdown(&mut self) {}
}

/// An overlay that draws nothing.
#[derive(Debug, Default)]
pub struct NullOverlay;

impl Overlay for NullOverlay {
    fn new_frame(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame_ms: f32,
    pub fps: f32,
    pub frames: u32,
}

/// Averages frame times and logs them once per interval.
#[derive(Debug)]
pub struct FrameStats {
    interval: Duration,
    last_frame: Option<Instant>,
    accumulated: Duration,
    frames: u32,
    total_frames: u64,
    last_report: Option<FrameReport>,
}

impl FrameStats {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_frame: None,
            accumulated: Duration::ZERO,
            frames: 0,
            total_frames: 0,
            last_report: None,
        }
    }

    /// Adds one frame. Returns a report once `interval` worth of frames has been seen.
    ///
    /// No report is made until some time has passed, so the rates are always finite.
    pub fn record(&mut self, frame_time: Duration) -> Option<FrameReport> {
        self.accumulated += frame_time;
        self.frames += 1;
        self.total_frames += 1;
        if self.accumulated < self.interval || self.accumulated.is_zero() {
            return None;
        }

        let seconds = self.accumulated.as_secs_f32();
        let report = FrameReport {
            frame_ms: seconds * 1000.0 / self.frames as f32,
            fps: self.frames as f32 / seconds,
            frames: self.frames,
        };
        self.accumulated = Duration::ZERO;
        self.frames = 0;
        self.last_report = Some(report);
        Some(report)
    }

    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Overlay for FrameStats {
    fn new_frame(&mut self) {
        let now = Instant::now();
        if let Some(previous) = self.last_frame
            && let Some(report) = self.record(now - previous)
        {
            log::info!(
                "Application average {:.3} ms/frame ({:.1} FPS)",
                report.frame_ms,
                report.fps
            );
        }
        self.last_frame = Some(now);
    }

    fn shutdown(&mut self) {
        log::debug!("Frame stats stopped after {} frames", self.total_frames);
    }
}
