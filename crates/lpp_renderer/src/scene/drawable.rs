//! Drawable scene content
//!
//! The renderer only ever asks two things of a drawable: fill the GBuffer,
//! and draw again into the output while sampling the finished light buffer.
//! The set of drawable kinds is closed, so dispatch is a plain `match`.

use crate::foundation::math::{Mat4, Transform, Vec2, Vec3};
use crate::render::api::{MaterialHandle, MeshHandle, RenderBackend, TargetHandle};
use crate::render::pipeline::{PipelineState, SurfaceKind};
use crate::render::primitives::Camera;
use crate::render::RenderResult;

/// Texture slot the light buffer is bound to during shading reconstruction
pub const LIGHT_BUFFER_SLOT: u32 = 0;

/// Fraction of the far plane the sky dome is scaled to
pub const SKY_DOME_FAR_FRACTION: f32 = 0.95;

/// One square tile of the terrain grid
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTile {
    /// Unit tile mesh on the XZ plane
    pub mesh: MeshHandle,
    /// Terrain material
    pub material: MaterialHandle,
    /// World XZ of the tile's minimum corner
    pub origin: Vec2,
    /// Edge length in world units
    pub size: f32,
}

impl TerrainTile {
    /// Tile world transform
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(self.origin.x, 0.0, self.origin.y))
            * Mat4::new_nonuniform_scaling(&Vec3::new(self.size, 1.0, self.size))
    }
}

/// A static mesh placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMesh {
    /// Mesh
    pub mesh: MeshHandle,
    /// Material
    pub material: MaterialHandle,
    /// World transform
    pub transform: Transform,
}

/// Camera-facing quads drawn in one instanced call
#[derive(Debug, Clone, PartialEq)]
pub struct BillboardCluster {
    /// Unit quad mesh
    pub mesh: MeshHandle,
    /// Vegetation or particle material
    pub material: MaterialHandle,
    /// Instance positions
    pub positions: Vec<Vec3>,
    /// Width and height of each quad
    pub size: Vec2,
}

impl BillboardCluster {
    /// Per-instance transforms turned to face the camera
    pub fn instance_matrices(&self, camera: &Camera) -> Vec<Mat4> {
        let basis = camera.basis();
        let facing = Mat4::new(
            basis.right.x, basis.up.x, -basis.forward.x, 0.0,
            basis.right.y, basis.up.y, -basis.forward.y, 0.0,
            basis.right.z, basis.up.z, -basis.forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        let scale = Mat4::new_nonuniform_scaling(&Vec3::new(self.size.x, self.size.y, 1.0));
        self.positions
            .iter()
            .map(|position| Mat4::new_translation(position) * facing * scale)
            .collect()
    }
}

/// Sky dome that follows the camera
#[derive(Debug, Clone, PartialEq)]
pub struct Sky {
    /// Unit dome mesh
    pub mesh: MeshHandle,
    /// Sky material
    pub material: MaterialHandle,
}

impl Sky {
    /// Dome transform: centered on the camera, just inside the far plane
    pub fn world_matrix(&self, camera: &Camera) -> Mat4 {
        Mat4::new_translation(&camera.position) * Mat4::new_scaling(camera.far * SKY_DOME_FAR_FRACTION)
    }
}

/// Horizontal water plane
#[derive(Debug, Clone, PartialEq)]
pub struct Water {
    /// Unit plane mesh on the XZ plane
    pub mesh: MeshHandle,
    /// Water material
    pub material: MaterialHandle,
    /// World XZ center
    pub center: Vec2,
    /// Edge length in world units
    pub extent: f32,
    /// Surface height
    pub height: f32,
}

impl Water {
    /// Plane world transform
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::new_translation(&Vec3::new(self.center.x, self.height, self.center.y))
            * Mat4::new_nonuniform_scaling(&Vec3::new(self.extent, 1.0, self.extent))
    }
}

/// Anything the light pre-pass can draw
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    /// Terrain grid tile
    TerrainTile(TerrainTile),
    /// Static mesh
    StaticMesh(StaticMesh),
    /// Instanced billboards
    BillboardCluster(BillboardCluster),
    /// Sky dome
    Sky(Sky),
    /// Water plane
    Water(Water),
}

impl Drawable {
    /// Surface kind used to select shaders
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Self::TerrainTile(_) => SurfaceKind::Terrain,
            Self::StaticMesh(_) => SurfaceKind::Mesh,
            Self::BillboardCluster(_) => SurfaceKind::Billboard,
            Self::Sky(_) => SurfaceKind::Sky,
            Self::Water(_) => SurfaceKind::Water,
        }
    }

    /// Write linear depth, normal and specular power
    ///
    /// The sky is unlit and writes nothing; its pixels keep the cleared
    /// depth beyond the far plane.
    pub fn render_to_gbuffer(&self, backend: &mut dyn RenderBackend, camera: &Camera) -> RenderResult<()> {
        if let Self::Sky(_) = self {
            return Ok(());
        }
        backend.apply_pipeline_state(&PipelineState::gbuffer(self.kind()))?;
        self.draw(backend, camera)
    }

    /// Draw the final color, sampling the accumulated light buffer
    pub fn reconstruct_shading(
        &self,
        backend: &mut dyn RenderBackend,
        camera: &Camera,
        light_buffer: TargetHandle,
    ) -> RenderResult<()> {
        backend.apply_pipeline_state(&PipelineState::shading(self.kind()))?;
        if !matches!(self, Self::Sky(_)) {
            backend.bind_texture(LIGHT_BUFFER_SLOT, light_buffer)?;
        }
        self.draw(backend, camera)
    }

    fn draw(&self, backend: &mut dyn RenderBackend, camera: &Camera) -> RenderResult<()> {
        match self {
            Self::TerrainTile(tile) => backend.draw_mesh(tile.mesh, tile.material, &tile.world_matrix()),
            Self::StaticMesh(mesh) => backend.draw_mesh(mesh.mesh, mesh.material, &mesh.transform.to_matrix()),
            Self::BillboardCluster(cluster) => {
                if cluster.positions.is_empty() {
                    return Ok(());
                }
                backend.draw_instanced(cluster.mesh, cluster.material, &cluster.instance_matrices(camera))
            }
            Self::Sky(sky) => backend.draw_mesh(sky.mesh, sky.material, &sky.world_matrix(camera)),
            Self::Water(water) => backend.draw_mesh(water.mesh, water.material, &water.world_matrix()),
        }
    }
}
