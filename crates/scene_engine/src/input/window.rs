//! Window backends
//!
//! The renderer only needs a window to present frames, report its size and
//! deliver input. [`HeadlessWindow`] plays back scripted events instead of
//! talking to a windowing system.

use std::any::Any;
use std::collections::VecDeque;

use super::{KeyCode, KEY_COUNT};
use crate::config::WindowConfig;

/// Window system event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// Drawable area changed size
    Resized(u32, u32),
    /// Relative mouse motion
    MouseMotion(f32, f32),
    /// Cursor entered the window
    MouseEntered,
    /// Cursor left the window
    MouseLeft,
    /// User asked to close the window
    CloseRequested,
    /// Key went down (`true`) or up (`false`)
    Key(KeyCode, bool),
}

/// Interface to the platform window
pub trait WindowBackend {
    /// Drain the events received since the last call
    fn poll_events(&mut self) -> Vec<WindowEvent>;

    /// Down state of every key, indexed by scancode
    fn keyboard_state(&self) -> &[bool];

    /// Present the back buffer
    fn swap_buffers(&mut self);

    /// Drawable size in pixels
    fn size(&self) -> (u32, u32);

    /// Enable or disable waiting for vertical sync on present
    fn set_vsync(&mut self, enabled: bool);

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Window that replays one batch of scripted events per poll
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    width: u32,
    height: u32,
    vsync: bool,
    keys: Vec<bool>,
    script: VecDeque<Vec<WindowEvent>>,
    swap_count: u64,
}

impl HeadlessWindow {
    /// Create a window of the given size with an empty script
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            vsync: true,
            keys: vec![false; KEY_COUNT],
            script: VecDeque::new(),
            swap_count: 0,
        }
    }

    /// Create a window from configuration
    pub fn from_config(config: &WindowConfig) -> Self {
        let mut window = Self::new(config.width, config.height);
        window.vsync = config.vsync;
        window
    }

    /// Queue the events delivered by one future poll
    #[must_use]
    pub fn with_frame(mut self, events: Vec<WindowEvent>) -> Self {
        self.push_frame(events);
        self
    }

    /// Queue the events delivered by one future poll
    pub fn push_frame(&mut self, events: Vec<WindowEvent>) {
        self.script.push_back(events);
    }

    /// Number of presented frames
    pub const fn swap_count(&self) -> u64 {
        self.swap_count
    }

    /// Whether vsync is enabled
    pub const fn vsync(&self) -> bool {
        self.vsync
    }
}

impl WindowBackend for HeadlessWindow {
    fn poll_events(&mut self) -> Vec<WindowEvent> {
        let events = self.script.pop_front().unwrap_or_default();
        for event in &events {
            match *event {
                WindowEvent::Resized(width, height) => {
                    self.width = width;
                    self.height = height;
                }
                WindowEvent::Key(key, down) => {
                    if let Some(state) = self.keys.get_mut(key.scancode()) {
                        *state = down;
                    }
                }
                _ => {}
            }
        }
        events
    }

    fn keyboard_state(&self) -> &[bool] {
        &self.keys
    }

    fn swap_buffers(&mut self) {
        self.swap_count += 1;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
