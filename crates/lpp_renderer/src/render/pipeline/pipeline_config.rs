//! Pipeline state descriptors
//!
//! Every pass builds a complete [`PipelineState`] and hands it to the
//! backend in one call. Nothing is diffed against the previous draw, so two
//! adjacent lights never inherit each other's cull or depth configuration.

use bitflags::bitflags;

/// Face culling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Depth comparison functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    /// Always pass
    Always,
    /// Pass when incoming depth is less than or equal to stored depth
    LessEqual,
    /// Pass when incoming depth is greater than or equal to stored depth
    GreaterEqual,
}

/// Depth test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    /// Comparison applied to incoming fragments
    pub compare: CompareFunction,
    /// Whether passing fragments write depth
    pub write: bool,
}

impl DepthState {
    /// Standard opaque geometry: LessEqual with writes
    pub const OPAQUE: Self = Self { compare: CompareFunction::LessEqual, write: true };
    /// Force-write every pixel
    pub const OVERWRITE: Self = Self { compare: CompareFunction::Always, write: true };
    /// Light volumes fully in front of the near plane
    pub const VOLUME_FRONT: Self = Self { compare: CompareFunction::LessEqual, write: false };
    /// Light volumes crossing the near plane, drawn with their back faces
    pub const VOLUME_INSIDE: Self = Self { compare: CompareFunction::GreaterEqual, write: false };
    /// No depth interaction
    pub const DISABLED: Self = Self { compare: CompareFunction::Always, write: false };
}

/// Blending modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source replaces destination
    Opaque,
    /// Source is added to destination (light accumulation)
    Additive,
    /// Standard alpha blending
    Alpha,
}

bitflags! {
    /// Color channels written by a draw
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        /// Red channel
        const RED = 1 << 0;
        /// Green channel
        const GREEN = 1 << 1;
        /// Blue channel
        const BLUE = 1 << 2;
        /// Alpha channel
        const ALPHA = 1 << 3;
    }
}

/// Surface kinds with their own GBuffer and shading shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Terrain quad-tree tile
    Terrain,
    /// Static mesh
    Mesh,
    /// Instanced billboard / vegetation cluster
    Billboard,
    /// Sky dome
    Sky,
    /// Water surface
    Water,
}

/// Shader techniques the renderer selects between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    /// Write linear depth, normal and specular power
    GBuffer(SurfaceKind),
    /// Rebuild hardware depth from linear depth
    ReconstructDepth,
    /// Point light volume
    PointLight,
    /// Spot light volume without shadows
    SpotLight,
    /// Spot light volume sampling a shadow map
    SpotLightShadowed,
    /// Directional light quad without shadows
    DirectionalLight,
    /// Directional light quad sampling cascades
    DirectionalLightShadowed,
    /// Final shading from the light buffer
    ReconstructShading(SurfaceKind),
}

/// Complete pipeline state for a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Shader technique
    pub technique: Technique,
    /// Face culling
    pub cull_mode: CullMode,
    /// Depth test and write
    pub depth: DepthState,
    /// Blending
    pub blend: BlendMode,
    /// Written channels
    pub color_writes: ColorWrites,
}

impl PipelineState {
    /// Opaque geometry into the GBuffer
    pub fn gbuffer(kind: SurfaceKind) -> Self {
        Self {
            technique: Technique::GBuffer(kind),
            cull_mode: CullMode::Back,
            depth: DepthState::OPAQUE,
            blend: BlendMode::Opaque,
            color_writes: ColorWrites::all(),
        }
    }

    /// Full-screen depth rebuild: write depth everywhere, no color
    pub fn depth_reconstruction() -> Self {
        Self {
            technique: Technique::ReconstructDepth,
            cull_mode: CullMode::None,
            depth: DepthState::OVERWRITE,
            blend: BlendMode::Opaque,
            color_writes: ColorWrites::empty(),
        }
    }

    /// State left behind by depth reconstruction: GreaterEqual, no writes
    pub fn depth_reconstructed() -> Self {
        Self {
            depth: DepthState::VOLUME_INSIDE,
            ..Self::depth_reconstruction()
        }
    }

    /// Additive light accumulation with the given technique and volume state
    pub fn light(technique: Technique, cull_mode: CullMode, depth: DepthState) -> Self {
        Self {
            technique,
            cull_mode,
            depth,
            blend: BlendMode::Additive,
            color_writes: ColorWrites::all(),
        }
    }

    /// Second geometry pass sampling the light buffer
    pub fn shading(kind: SurfaceKind) -> Self {
        let depth = match kind {
            // Sky sits at the far plane behind everything already drawn
            SurfaceKind::Sky => DepthState::VOLUME_FRONT,
            _ => DepthState::OPAQUE,
        };
        let blend = match kind {
            SurfaceKind::Water | SurfaceKind::Billboard => BlendMode::Alpha,
            _ => BlendMode::Opaque,
        };
        Self {
            technique: Technique::ReconstructShading(kind),
            cull_mode: if kind == SurfaceKind::Billboard { CullMode::None } else { CullMode::Back },
            depth,
            blend,
            color_writes: ColorWrites::all(),
        }
    }
}
