//! Backend: the rendering subsystem the renderer drives.
//!
//! A backend opens the display region, reports input events, presents
//! finished surfaces and supplies the frame clock. Every failure it reports
//! is a [`BackendError`] so the renderer can tell it apart from errors in
//! user code.

pub mod headless;
pub mod terminal;

use std::thread;
use std::time::{Duration, Instant};

use crate::error::BackendError;
use crate::surface::Surface;
use crate::types::Geometry;

pub use headless::HeadlessBackend;
pub use terminal::TerminalBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Stop the render loop.
    Quit,
    /// Rebuild the animation sequence, same as a watcher notification.
    Reload,
    /// The host display changed size.
    Resize { width: u16, height: u16 },
}

pub trait Backend {
    type Clock: Clock;

    /// Open the display region and create a surface of the requested size.
    fn open(&mut self, title: &str, geometry: Geometry) -> Result<Surface, BackendError>;

    /// Move or resize an already open display region.
    fn reconfigure(&mut self, geometry: Geometry) -> Result<(), BackendError>;

    /// Drain pending input without blocking.
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, BackendError>;

    fn present(&mut self, surface: &Surface) -> Result<(), BackendError>;

    fn clock(&mut self) -> Self::Clock;

    /// Release the display region. Called exactly once per successful `open`.
    fn close(&mut self) -> Result<(), BackendError>;
}

pub trait Clock {
    /// Wait out the rest of the frame budget for `fps` and return the
    /// milliseconds elapsed since the previous tick.
    fn tick(&mut self, fps: u32) -> u64;
}

/// Wall-clock pacing: sleeps so ticks are at least `1000 / fps` ms apart.
#[derive(Debug)]
pub struct SystemClock {
    last: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            last: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn tick(&mut self, fps: u32) -> u64 {
        if fps > 0 {
            let budget = Duration::from_secs(1) / fps;
            let spent = self.last.elapsed();
            if spent < budget {
                thread::sleep(budget - spent);
            }
        }
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        elapsed.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_caps_frame_rate() {
        let mut clock = SystemClock::new();
        let first = clock.tick(100);
        let second = clock.tick(100);
        assert!(first >= 10, "tick returned {first}ms");
        assert!(second >= 10, "tick returned {second}ms");
    }
}
