//! Polled input state
//!
//! The renderer rolls the keyboard state once per frame so callers can ask
//! both "is it down" and "did it just go down". Mouse motion is accumulated
//! between frames into a single delta.

pub mod window;

pub use window::{HeadlessWindow, WindowBackend, WindowEvent};

use crate::foundation::math::Vec2;

/// Size of the keyboard state arrays
pub const KEY_COUNT: usize = 512;

/// Keys by scancode (USB HID usage IDs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// Q key
    Q,
    /// S key
    S,
    /// W key
    W,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Space key
    Space,
    /// Right arrow
    Right,
    /// Left arrow
    Left,
    /// Down arrow
    Down,
    /// Up arrow
    Up,
    /// Any other scancode
    Other(u16),
}

impl KeyCode {
    /// Index into the keyboard state arrays
    pub const fn scancode(self) -> usize {
        match self {
            Self::A => 4,
            Self::D => 7,
            Self::E => 8,
            Self::Q => 20,
            Self::S => 22,
            Self::W => 26,
            Self::Enter => 40,
            Self::Escape => 41,
            Self::Space => 44,
            Self::Right => 79,
            Self::Left => 80,
            Self::Down => 81,
            Self::Up => 82,
            Self::Other(code) => code as usize,
        }
    }
}

/// Keyboard state of this and the previous frame plus mouse motion
#[derive(Debug, Clone)]
pub struct InputState {
    current: Vec<bool>,
    previous: Vec<bool>,
    mouse_delta: Vec2,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// All keys up, no motion
    pub fn new() -> Self {
        Self {
            current: vec![false; KEY_COUNT],
            previous: vec![false; KEY_COUNT],
            mouse_delta: Vec2::zeros(),
        }
    }

    /// Start a new frame
    ///
    /// The current key state becomes the previous one, `keyboard` becomes
    /// the current one and the mouse delta is reset.
    pub fn roll(&mut self, keyboard: &[bool]) {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.fill(false);
        let count = keyboard.len().min(KEY_COUNT);
        self.current[..count].copy_from_slice(&keyboard[..count]);
        self.mouse_delta = Vec2::zeros();
    }

    /// Accumulate relative mouse motion
    pub fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    /// Mouse motion since the last roll
    pub const fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Whether the key is down this frame
    pub fn key(&self, key: KeyCode) -> bool {
        self.current.get(key.scancode()).copied().unwrap_or(false)
    }

    /// Whether the key was down last frame
    pub fn key_prev(&self, key: KeyCode) -> bool {
        self.previous.get(key.scancode()).copied().unwrap_or(false)
    }

    /// Whether the key went down this frame
    pub fn key_toggle_press(&self, key: KeyCode) -> bool {
        self.key(key) && !self.key_prev(key)
    }

    /// Whether the key went up this frame
    pub fn key_toggle_release(&self, key: KeyCode) -> bool {
        !self.key(key) && self.key_prev(key)
    }
}
