//! Shadow maps for spot and directional lights
//!
//! A bounded pool of maps is shared by all lights each frame. Admission
//! hands slots out in light priority order, and a generator fills the
//! admitted slots before the GBuffer pass starts.

pub mod pool;
pub mod admission;
pub mod matrices;
pub mod generator;

pub use pool::{
    CascadeShadowMap, ShadowMapPool, ShadowPoolError, ShadowSlot, ShadowSlotAllocator, SpotShadowMap,
    SHADOW_MAP_FORMAT,
};
pub use admission::{admit_shadow_casters, AdmissionStats};
pub use generator::{MatrixShadowGenerator, ShadowMapGenerator};
