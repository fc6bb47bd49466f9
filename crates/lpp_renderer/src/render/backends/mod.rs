//! Render backend implementations

pub mod recording;

pub use recording::{RecordingBackend, RecordedCommand};
