//! Shadow Map Pool
//!
//! A fixed set of shadow maps allocated once and handed out per frame.
//! Lights borrow slots in priority order; the pool never grows, so once it
//! is empty the remaining casters are drawn unshadowed.
//!
//! # Architecture
//!
//! ```text
//! ShadowMapPool
//!         ├── spot maps    (one 2D map + one view-projection each)
//!         └── cascade sets (N maps + N view-projections + N split distances)
//!                     ↓
//!          reset() at frame start, acquire_*() during admission
//! ```

use crate::foundation::math::Mat4;
use crate::render::api::{
    ContentsUsage, DepthFormat, RenderBackend, RenderTargetDesc, RendererConfig, SurfaceFormat, TargetHandle,
};
use crate::render::{RenderError, RenderResult};

/// Shadow map storage format
pub const SHADOW_MAP_FORMAT: SurfaceFormat = SurfaceFormat::R32Float;

/// Reference to a pool slot, valid until the next reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowSlot {
    /// Index into the spot maps
    Spot(usize),
    /// Index into the cascade sets
    Cascade(usize),
}

/// Errors raised by shadow slot allocation
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowPoolError {
    /// Every slot of the requested kind is already borrowed this frame
    #[error("Shadow pool exhausted ({capacity} slots)")]
    Exhausted {
        /// Slot count of the exhausted kind
        capacity: usize,
    },
}

/// Shadow map for one spot light
#[derive(Debug, Clone, PartialEq)]
pub struct SpotShadowMap {
    /// Depth target
    pub target: TargetHandle,
    /// Edge length in texels
    pub resolution: u32,
    /// World-to-light-clip matrix of the light that owns the slot this frame
    pub view_projection: Mat4,
}

/// Cascaded shadow maps for one directional light
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeShadowMap {
    /// One depth target per split
    pub targets: Vec<TargetHandle>,
    /// Edge length in texels
    pub resolution: u32,
    /// World-to-light-clip matrix per split
    pub view_projections: Vec<Mat4>,
    /// Far view distance of each split
    pub split_distances: Vec<f32>,
}

impl CascadeShadowMap {
    /// Number of splits
    pub fn split_count(&self) -> usize {
        self.targets.len()
    }
}

/// Source of per-frame shadow slots
pub trait ShadowSlotAllocator {
    /// Return every borrowed slot to the pool
    fn reset(&mut self);

    /// Borrow a spot light slot
    fn acquire_spot(&mut self) -> Result<ShadowSlot, ShadowPoolError>;

    /// Borrow a directional cascade slot
    fn acquire_cascade(&mut self) -> Result<ShadowSlot, ShadowPoolError>;

    /// Spot map behind a slot
    fn spot_map(&self, slot: ShadowSlot) -> Option<&SpotShadowMap>;

    /// Mutable spot map behind a slot
    fn spot_map_mut(&mut self, slot: ShadowSlot) -> Option<&mut SpotShadowMap>;

    /// Cascade set behind a slot
    fn cascade_map(&self, slot: ShadowSlot) -> Option<&CascadeShadowMap>;

    /// Mutable cascade set behind a slot
    fn cascade_map_mut(&mut self, slot: ShadowSlot) -> Option<&mut CascadeShadowMap>;
}

/// Bounded shadow map pool
#[derive(Debug)]
pub struct ShadowMapPool {
    spot: Vec<SpotShadowMap>,
    cascade: Vec<CascadeShadowMap>,
    spot_in_use: usize,
    cascade_in_use: usize,
}

impl ShadowMapPool {
    /// Allocate every shadow map up front
    ///
    /// Allocation failure is fatal: targets created so far are released.
    pub fn new(backend: &mut dyn RenderBackend, config: &RendererConfig) -> RenderResult<Self> {
        let mut created = Vec::new();
        match Self::allocate_maps(backend, config, &mut created) {
            Ok((spot, cascade)) => {
                log::info!(
                    "Shadow pool created: {} spot maps, {} cascade sets x {} splits",
                    spot.len(),
                    cascade.len(),
                    config.cascade_splits
                );
                Ok(Self {
                    spot,
                    cascade,
                    spot_in_use: 0,
                    cascade_in_use: 0,
                })
            }
            Err(e) => {
                for handle in created {
                    backend.destroy_render_target(handle);
                }
                log::error!("Shadow pool allocation failed: {}", e);
                Err(RenderError::ResourceCreationFailed(format!("shadow pool: {}", e)))
            }
        }
    }

    fn allocate_maps(
        backend: &mut dyn RenderBackend,
        config: &RendererConfig,
        created: &mut Vec<TargetHandle>,
    ) -> RenderResult<(Vec<SpotShadowMap>, Vec<CascadeShadowMap>)> {
        let mut spot = Vec::with_capacity(config.spot_shadow_slots);
        for _ in 0..config.spot_shadow_slots {
            let target = Self::allocate_target(backend, created, "shadow_spot", config.spot_shadow_resolution)?;
            spot.push(SpotShadowMap {
                target,
                resolution: config.spot_shadow_resolution,
                view_projection: Mat4::identity(),
            });
        }

        let mut cascade = Vec::with_capacity(config.cascade_shadow_slots);
        for _ in 0..config.cascade_shadow_slots {
            let mut targets = Vec::with_capacity(config.cascade_splits);
            for _ in 0..config.cascade_splits {
                targets.push(Self::allocate_target(
                    backend,
                    created,
                    "shadow_cascade",
                    config.cascade_shadow_resolution,
                )?);
            }
            cascade.push(CascadeShadowMap {
                targets,
                resolution: config.cascade_shadow_resolution,
                view_projections: vec![Mat4::identity(); config.cascade_splits],
                split_distances: vec![0.0; config.cascade_splits],
            });
        }
        Ok((spot, cascade))
    }

    fn allocate_target(
        backend: &mut dyn RenderBackend,
        created: &mut Vec<TargetHandle>,
        label: &'static str,
        resolution: u32,
    ) -> RenderResult<TargetHandle> {
        let desc = RenderTargetDesc {
            label,
            width: resolution,
            height: resolution,
            format: SHADOW_MAP_FORMAT,
            depth_stencil: Some(DepthFormat::Depth32Float),
            usage: ContentsUsage::Discard,
        };
        let handle = backend.create_render_target(&desc)?;
        created.push(handle);
        Ok(handle)
    }

    /// Release every shadow map target
    pub fn release(self, backend: &mut dyn RenderBackend) {
        for map in &self.spot {
            backend.destroy_render_target(map.target);
        }
        for set in &self.cascade {
            for target in &set.targets {
                backend.destroy_render_target(*target);
            }
        }
    }

    /// Total spot slots
    pub fn spot_capacity(&self) -> usize {
        self.spot.len()
    }

    /// Total cascade slots
    pub fn cascade_capacity(&self) -> usize {
        self.cascade.len()
    }

    /// Spot slots borrowed this frame
    pub fn spot_in_use(&self) -> usize {
        self.spot_in_use
    }

    /// Cascade slots borrowed this frame
    pub fn cascade_in_use(&self) -> usize {
        self.cascade_in_use
    }
}

impl ShadowSlotAllocator for ShadowMapPool {
    fn reset(&mut self) {
        self.spot_in_use = 0;
        self.cascade_in_use = 0;
    }

    fn acquire_spot(&mut self) -> Result<ShadowSlot, ShadowPoolError> {
        if self.spot_in_use >= self.spot.len() {
            return Err(ShadowPoolError::Exhausted { capacity: self.spot.len() });
        }
        let slot = ShadowSlot::Spot(self.spot_in_use);
        self.spot_in_use += 1;
        Ok(slot)
    }

    fn acquire_cascade(&mut self) -> Result<ShadowSlot, ShadowPoolError> {
        if self.cascade_in_use >= self.cascade.len() {
            return Err(ShadowPoolError::Exhausted { capacity: self.cascade.len() });
        }
        let slot = ShadowSlot::Cascade(self.cascade_in_use);
        self.cascade_in_use += 1;
        Ok(slot)
    }

    fn spot_map(&self, slot: ShadowSlot) -> Option<&SpotShadowMap> {
        match slot {
            ShadowSlot::Spot(index) if index < self.spot_in_use => self.spot.get(index),
            _ => None,
        }
    }

    fn spot_map_mut(&mut self, slot: ShadowSlot) -> Option<&mut SpotShadowMap> {
        match slot {
            ShadowSlot::Spot(index) if index < self.spot_in_use => self.spot.get_mut(index),
            _ => None,
        }
    }

    fn cascade_map(&self, slot: ShadowSlot) -> Option<&CascadeShadowMap> {
        match slot {
            ShadowSlot::Cascade(index) if index < self.cascade_in_use => self.cascade.get(index),
            _ => None,
        }
    }

    fn cascade_map_mut(&mut self, slot: ShadowSlot) -> Option<&mut CascadeShadowMap> {
        match slot {
            ShadowSlot::Cascade(index) if index < self.cascade_in_use => self.cascade.get_mut(index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::RecordingBackend;

    fn pool(spot: usize, cascade: usize) -> (RecordingBackend, ShadowMapPool) {
        let mut backend = RecordingBackend::new();
        let config = RendererConfig::new(256, 256).with_shadow_slots(spot, cascade);
        let pool = ShadowMapPool::new(&mut backend, &config).unwrap();
        (backend, pool)
    }

    #[test]
    fn test_allocates_all_maps_up_front() {
        let (backend, pool) = pool(2, 1);
        // 2 spot maps + 1 cascade set of 3 splits
        assert_eq!(backend.live_target_count(), 5);
        assert_eq!(pool.spot_capacity(), 2);
        assert_eq!(pool.cascade_capacity(), 1);
    }

    #[test]
    fn test_exhaustion_and_reset() {
        let (_backend, mut pool) = pool(1, 1);
        let slot = pool.acquire_spot().unwrap();
        assert_eq!(slot, ShadowSlot::Spot(0));
        assert_eq!(pool.acquire_spot(), Err(ShadowPoolError::Exhausted { capacity: 1 }));
        assert!(pool.acquire_cascade().is_ok());
        assert!(pool.acquire_cascade().is_err());

        pool.reset();
        assert_eq!(pool.spot_in_use(), 0);
        assert!(pool.acquire_spot().is_ok());
    }

    #[test]
    fn test_slots_resolve_only_while_borrowed() {
        let (_backend, mut pool) = pool(2, 0);
        assert!(pool.spot_map(ShadowSlot::Spot(0)).is_none());
        let slot = pool.acquire_spot().unwrap();
        assert!(pool.spot_map(slot).is_some());
        assert!(pool.cascade_map(slot).is_none());
        pool.reset();
        assert!(pool.spot_map(slot).is_none());
    }

    #[test]
    fn test_allocation_failure_releases_partial_pool() {
        let mut backend = RecordingBackend::new().with_target_budget(3);
        let config = RendererConfig::new(256, 256).with_shadow_slots(2, 1);
        let result = ShadowMapPool::new(&mut backend, &config);
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert_eq!(backend.live_target_count(), 0);
    }

    #[test]
    fn test_release_frees_targets() {
        let (mut backend, pool) = pool(2, 1);
        pool.release(&mut backend);
        assert_eq!(backend.live_target_count(), 0);
    }
}
