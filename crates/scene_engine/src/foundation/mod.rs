//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types, the SQT transform and the matrix stack
//! - Frame timing
//! - Logging initialisation

pub mod math;
pub mod time;
pub mod logging;
