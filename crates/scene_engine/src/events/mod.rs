//! Window and renderer signals
//!
//! - Events carry key-value arguments, so handlers do not depend on order
//! - A handler returns `true` to consume an event and stop forwarding
//! - Handlers only receive the event types they registered for
//! - Events are either queued for the frame's dispatch or fired right away

use std::collections::HashMap;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The viewport changed size
    WindowResized,
    /// The mouse moved during the last frame
    MouseMoved,
    /// The cursor entered the window
    MouseEntered,
    /// The cursor left the window
    MouseLeft,
    /// The renderer was asked to close
    AboutToClose,
}

/// Typed event argument
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventArg {
    /// Size in pixels
    Size(u32, u32),
    /// Relative motion
    Delta(f32, f32),
}

/// Event with type and key-value arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Seconds since the renderer started
    pub timestamp: f64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create an event without arguments
    pub fn new(event_type: EventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            args: HashMap::new(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Argument by key
    pub fn arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// `size` argument of a resize
    pub fn size(&self) -> Option<(u32, u32)> {
        match self.arg("size") {
            Some(EventArg::Size(width, height)) => Some((*width, *height)),
            _ => None,
        }
    }

    /// `delta` argument of a mouse motion
    pub fn delta(&self) -> Option<(f32, f32)> {
        match self.arg("delta") {
            Some(EventArg::Delta(dx, dy)) => Some((*dx, *dy)),
            _ => None,
        }
    }
}

/// Receiver of events
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

impl<F: FnMut(&Event) -> bool> EventHandler for F {
    fn on_event(&mut self, event: &Event) -> bool {
        self(event)
    }
}

/// Event registry with a per-frame queue
#[derive(Default)]
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("queued", &self.queue.len())
            .field("event_types", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl EventSystem {
    /// Create an empty event system
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event type
    pub fn register_handler<H: EventHandler + 'static>(&mut self, event_type: EventType, handler: H) {
        self.handlers.entry(event_type).or_default().push(Box::new(handler));
    }

    /// Queue an event for the next `dispatch`
    pub fn send(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Deliver an event right away, bypassing the queue
    pub fn fire(&mut self, event: &Event) {
        self.dispatch_event(event);
    }

    /// Deliver queued events in the order they were sent
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for event in &queued {
            self.dispatch_event(event);
        }
    }

    fn dispatch_event(&mut self, event: &Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    break;
                }
            }
        }
    }
}
