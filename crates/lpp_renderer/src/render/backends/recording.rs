//! Recording backend
//!
//! A [`RenderBackend`] that executes nothing and records every command in
//! submission order. It validates handles and the texture/target hazard that
//! real APIs reject (sampling a target while it is bound for output), which
//! makes it suitable for headless runs and for asserting on pass order in
//! tests.

use slotmap::SlotMap;

use crate::foundation::math::{Mat4, Vec2};
use crate::render::api::{
    BackendResult, ClearOp, ConstantBlock, MaterialHandle, MeshHandle, RenderBackend,
    RenderTargetDesc, TargetHandle, VolumeMesh, MAX_BOUND_TARGETS,
};
use crate::render::pipeline::PipelineState;
use crate::render::RenderError;

/// A command captured by the recording backend
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// Targets bound for output
    BindTargets(Vec<TargetHandle>),
    /// Clear of the bound targets
    Clear(ClearOp),
    /// Full pipeline state replacement
    PipelineState(PipelineState),
    /// Texture binding
    BindTexture {
        /// Sampler slot
        slot: u32,
        /// Sampled target
        target: TargetHandle,
    },
    /// Constant upload
    Constants {
        /// Destination block
        block: ConstantBlock,
        /// Raw bytes
        data: Vec<u8>,
    },
    /// Light volume draw
    DrawVolume {
        /// Mesh
        volume: VolumeMesh,
        /// Transform used for rasterization
        world_view_projection: Mat4,
    },
    /// Screen quad draw
    DrawQuad {
        /// Lower-left NDC corner
        min: Vec2,
        /// Upper-right NDC corner
        max: Vec2,
    },
    /// Mesh draw
    DrawMesh {
        /// Mesh
        mesh: MeshHandle,
        /// Material
        material: MaterialHandle,
        /// World transform
        world: Mat4,
    },
    /// Instanced mesh draw
    DrawInstanced {
        /// Mesh
        mesh: MeshHandle,
        /// Material
        material: MaterialHandle,
        /// Number of instances
        instance_count: usize,
    },
}

impl RecordedCommand {
    /// Whether this command rasterizes anything
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawVolume { .. } | Self::DrawQuad { .. } | Self::DrawMesh { .. } | Self::DrawInstanced { .. }
        )
    }
}

/// Headless backend that records commands
#[derive(Debug)]
pub struct RecordingBackend {
    targets: SlotMap<TargetHandle, RenderTargetDesc>,
    target_budget: Option<usize>,
    bound_targets: Vec<TargetHandle>,
    commands: Vec<RecordedCommand>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Create an empty backend with no target budget
    pub fn new() -> Self {
        Self {
            targets: SlotMap::with_key(),
            target_budget: None,
            bound_targets: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Limit the number of simultaneously live targets
    pub fn with_target_budget(mut self, budget: usize) -> Self {
        self.target_budget = Some(budget);
        self
    }

    /// Commands recorded so far
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Drain the recorded commands
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of draw commands recorded so far
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Pipeline states in submission order
    pub fn pipeline_states(&self) -> impl Iterator<Item = &PipelineState> {
        self.commands.iter().filter_map(|c| match c {
            RecordedCommand::PipelineState(state) => Some(state),
            _ => None,
        })
    }

    /// Number of targets currently alive
    pub fn live_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Description of a live target
    pub fn target_desc(&self, target: TargetHandle) -> Option<RenderTargetDesc> {
        self.targets.get(target).copied()
    }

    fn ensure_live(&self, target: TargetHandle) -> BackendResult<()> {
        if self.targets.contains_key(target) {
            Ok(())
        } else {
            Err(RenderError::BackendError(format!("unknown render target {:?}", target)))
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> BackendResult<TargetHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::ResourceCreationFailed(format!(
                "target '{}' has zero size",
                desc.label
            )));
        }
        if let Some(budget) = self.target_budget {
            if self.targets.len() >= budget {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "target budget of {} exhausted creating '{}'",
                    budget, desc.label
                )));
            }
        }
        let handle = self.targets.insert(*desc);
        log::trace!("Created target '{}' {:?}", desc.label, handle);
        Ok(handle)
    }

    fn destroy_render_target(&mut self, target: TargetHandle) {
        if self.targets.remove(target).is_some() {
            self.bound_targets.retain(|bound| *bound != target);
        }
    }

    fn bind_render_targets(&mut self, colors: &[TargetHandle]) -> BackendResult<()> {
        if colors.is_empty() || colors.len() > MAX_BOUND_TARGETS {
            return Err(RenderError::BackendError(format!(
                "cannot bind {} render targets (1 to {} supported)",
                colors.len(),
                MAX_BOUND_TARGETS
            )));
        }
        for target in colors {
            self.ensure_live(*target)?;
        }
        self.bound_targets = colors.to_vec();
        self.commands.push(RecordedCommand::BindTargets(colors.to_vec()));
        Ok(())
    }

    fn clear(&mut self, clear: &ClearOp) -> BackendResult<()> {
        if self.bound_targets.is_empty() {
            return Err(RenderError::BackendError("clear with no bound targets".to_string()));
        }
        self.commands.push(RecordedCommand::Clear(*clear));
        Ok(())
    }

    fn apply_pipeline_state(&mut self, state: &PipelineState) -> BackendResult<()> {
        self.commands.push(RecordedCommand::PipelineState(*state));
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, target: TargetHandle) -> BackendResult<()> {
        self.ensure_live(target)?;
        if self.bound_targets.contains(&target) {
            return Err(RenderError::BackendError(format!(
                "target {:?} sampled while bound for output",
                target
            )));
        }
        self.commands.push(RecordedCommand::BindTexture { slot, target });
        Ok(())
    }

    fn set_constants(&mut self, block: ConstantBlock, data: &[u8]) -> BackendResult<()> {
        self.commands.push(RecordedCommand::Constants {
            block,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn draw_volume(&mut self, volume: VolumeMesh, world_view_projection: &Mat4) -> BackendResult<()> {
        self.commands.push(RecordedCommand::DrawVolume {
            volume,
            world_view_projection: *world_view_projection,
        });
        Ok(())
    }

    fn draw_quad(&mut self, ndc_min: Vec2, ndc_max: Vec2) -> BackendResult<()> {
        if ndc_min.x > ndc_max.x || ndc_min.y > ndc_max.y {
            return Err(RenderError::RenderingFailed(format!(
                "inverted quad bounds {:?} - {:?}",
                ndc_min, ndc_max
            )));
        }
        self.commands.push(RecordedCommand::DrawQuad { min: ndc_min, max: ndc_max });
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, material: MaterialHandle, world: &Mat4) -> BackendResult<()> {
        self.commands.push(RecordedCommand::DrawMesh {
            mesh,
            material,
            world: *world,
        });
        Ok(())
    }

    fn draw_instanced(&mut self, mesh: MeshHandle, material: MaterialHandle, instances: &[Mat4]) -> BackendResult<()> {
        self.commands.push(RecordedCommand::DrawInstanced {
            mesh,
            material,
            instance_count: instances.len(),
        });
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
