//! Light sorting and accumulation
//!
//! Lights are sorted by screen influence, then each resolves to a complete
//! draw descriptor that is added into the light buffer.

pub mod light;
pub mod priority;
pub mod constants;
pub mod state_machine;

pub use light::{Light, LightType};
pub use priority::{LightEntry, LightPrioritySorter};
pub use constants::LightConstants;
pub use state_machine::{light_technique, LightDraw, LightGeometry, LightState, LightingPass, VolumePlacement};
