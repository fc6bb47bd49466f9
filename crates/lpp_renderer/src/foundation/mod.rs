//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the renderer:
//! - Math types, transforms and plane/sphere classification
//! - Logging utilities

pub mod math;
pub mod logging;
