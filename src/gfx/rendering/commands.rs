//! Render command stream between the scene and a GPU backend
//!
//! The scene never touches wgpu directly. Each frame it submits a sequence of
//! [`RenderCommand`]s to a [`RenderBackend`], which owns the GPU resources and
//! decides how to execute them. The same trait covers resource creation and
//! the end-of-frame present (the vsync wait), so the whole frame loop can run
//! against a recording backend in tests.

use std::path::Path;

use crate::{
    error::{AssetError, RenderError, ShaderError},
    gfx::{
        resources::{
            global_bindings::{FrameUniform, LightsUniform},
            material::{InstanceUniform, TextureRole},
        },
        scene::vertex::VertexData,
    },
};

/// Arena index of a GPU mesh owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Arena index of a GPU texture owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// The shader programs the sandbox renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Phong shading for cube, sphere and model meshes
    Lit,
    /// Flat light-colored debug cubes
    Light,
    /// Vertex-colored line gizmo
    Axes,
    /// Alpha-blended ground grid
    Grid,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 4] = [
        ProgramKind::Lit,
        ProgramKind::Light,
        ProgramKind::Axes,
        ProgramKind::Grid,
    ];

    /// Source file name inside the shader directory
    pub fn file_name(self) -> &'static str {
        match self {
            ProgramKind::Lit => "lit.wgsl",
            ProgramKind::Light => "light.wgsl",
            ProgramKind::Axes => "axes.wgsl",
            ProgramKind::Grid => "grid.wgsl",
        }
    }

    pub fn uses_material_textures(self) -> bool {
        matches!(self, ProgramKind::Lit)
    }

    pub fn draws_lines(self) -> bool {
        matches!(self, ProgramKind::Axes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

/// A texture attached to a numbered unit under a shader-facing name
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub unit: u32,
    pub role: TextureRole,
    /// 1-based position among the bound maps of the same role
    pub counter: u32,
    pub name: String,
    pub texture: TextureHandle,
}

impl TextureBinding {
    /// Fixed material slot, e.g. `material.diffuse`
    pub fn material(unit: u32, role: TextureRole, texture: TextureHandle) -> Self {
        Self {
            unit,
            role,
            counter: 1,
            name: format!("material.{}", role.as_str()),
            texture,
        }
    }

    /// Counted slot, e.g. `texture_diffuse1`, `texture_diffuse2`
    pub fn numbered(unit: u32, role: TextureRole, counter: u32, texture: TextureHandle) -> Self {
        Self {
            unit,
            role,
            counter,
            name: format!("texture_{}{}", role.as_str(), counter),
            texture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub instance: InstanceUniform,
}

/// One step of a frame, in submission order
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Clear { color: [f32; 3] },
    SetPolygonMode(PolygonMode),
    UseProgram(ProgramKind),
    UploadFrame(FrameUniform),
    UploadLights(Box<LightsUniform>),
    BindTexture(TextureBinding),
    Draw(DrawCall),
    GuiOverlay,
}

/// Sink for everything the scene asks of the GPU
pub trait RenderBackend {
    /// Uploads a mesh; an empty `indices` slice means a non-indexed draw.
    fn upload_mesh(&mut self, label: &str, vertices: VertexData<'_>, indices: &[u32]) -> MeshHandle;

    fn release_mesh(&mut self, mesh: MeshHandle) -> Result<(), RenderError>;

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError>;

    /// Recompiles a program from its source. On failure the previous program
    /// stays in use.
    fn reload_program(&mut self, program: ProgramKind) -> Result<(), ShaderError>;

    fn submit(&mut self, command: RenderCommand) -> Result<(), RenderError>;

    /// Ends the frame and waits for the display.
    fn present(&mut self);
}
