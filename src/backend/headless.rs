//! Headless backend: no display, scripted input.
//!
//! Used by the `check` command and by tests: events are queued up front,
//! the last presented surface is kept for inspection, and failures can be
//! injected at the points the renderer must survive.

use std::collections::VecDeque;

use crate::error::BackendError;
use crate::surface::Surface;
use crate::types::Geometry;

use super::{Backend, Clock, InputEvent};

/// Returns exactly one frame budget per tick without sleeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedClock;

impl Clock for FixedClock {
    fn tick(&mut self, fps: u32) -> u64 {
        1000 / u64::from(fps.max(1))
    }
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    events: VecDeque<Vec<InputEvent>>,
    title: Option<String>,
    geometry: Option<Geometry>,
    last_frame: Option<Surface>,
    presented: usize,
    polls: usize,
    open: bool,
    closes: usize,
    fail_reconfigure: bool,
    fail_present: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the events returned by one future poll.
    pub fn push_events(&mut self, events: Vec<InputEvent>) {
        self.events.push_back(events);
    }

    pub fn fail_reconfigure(&mut self, fail: bool) {
        self.fail_reconfigure = fail;
    }

    pub fn fail_present(&mut self, fail: bool) {
        self.fail_present = fail;
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.geometry
    }

    pub fn last_frame(&self) -> Option<&Surface> {
        self.last_frame.as_ref()
    }

    pub fn frames_presented(&self) -> usize {
        self.presented
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close_count(&self) -> usize {
        self.closes
    }
}

impl Backend for HeadlessBackend {
    type Clock = FixedClock;

    fn open(&mut self, title: &str, geometry: Geometry) -> Result<Surface, BackendError> {
        self.title = Some(title.to_string());
        self.geometry = Some(geometry);
        self.open = true;
        Ok(Surface::new(geometry.width, geometry.height))
    }

    fn reconfigure(&mut self, geometry: Geometry) -> Result<(), BackendError> {
        if self.fail_reconfigure {
            return Err(BackendError::Subsystem("cannot reconfigure display".into()));
        }
        self.geometry = Some(geometry);
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<InputEvent>, BackendError> {
        self.polls += 1;
        Ok(self.events.pop_front().unwrap_or_default())
    }

    fn present(&mut self, surface: &Surface) -> Result<(), BackendError> {
        if self.fail_present {
            return Err(BackendError::Subsystem("present failed".into()));
        }
        self.presented += 1;
        self.last_frame = Some(surface.clone());
        Ok(())
    }

    fn clock(&mut self) -> Self::Clock {
        FixedClock
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.open = false;
        self.closes += 1;
        Ok(())
    }
}
