//! Per-frame scene state threaded through every update and render call

use crate::{
    error::RenderError,
    gfx::{
        camera::{camera_utils::convert_matrix4_to_array, FlyCamera},
        lighting::LightSet,
        rendering::commands::{
            DrawCall, MeshHandle, PolygonMode, ProgramKind, RenderBackend, RenderCommand,
        },
        resources::{
            global_bindings::{FrameUniform, LightsUniform},
            material::{InstanceUniform, MaterialUniform},
        },
    },
};
use cgmath::Matrix4;

/// Elapsed time and per-frame delta, in seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameClock {
    time: f32,
    delta: f32,
    last: Option<f32>,
}

impl FrameClock {
    /// Advances to `now`; the first call yields a zero delta
    pub fn advance(&mut self, now: f32) -> f32 {
        self.delta = self.last.map_or(0.0, |last| (now - last).max(0.0));
        self.last = Some(now);
        self.time = now;
        self.delta
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }
}

/// The four mode toggles the GUI owns
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModeFlags {
    /// Draw the sphere instead of the cubes
    pub sphere: bool,
    /// Draw the imported model; overrides `sphere`
    pub model: bool,
    /// Axes, grid and gizmo overlays
    pub debug: bool,
    pub wireframe: bool,
}

/// Tracks the polygon mode last sent to the backend
///
/// Only a flip of the wireframe flag produces a command.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolygonModeLatch {
    applied: PolygonMode,
}

impl PolygonModeLatch {
    pub fn update(&mut self, wireframe: bool) -> Option<PolygonMode> {
        let wanted = if wireframe { PolygonMode::Line } else { PolygonMode::Fill };
        if wanted == self.applied {
            return None;
        }
        self.applied = wanted;
        Some(wanted)
    }

    pub fn applied(&self) -> PolygonMode {
        self.applied
    }
}

/// Everything the frame loop mutates, owned in one place
pub struct SceneState {
    pub camera: FlyCamera,
    pub lights: LightSet,
    pub clock: FrameClock,
    pub flags: ModeFlags,
    pub background: [f32; 3],
    /// Framebuffer size in pixels
    pub viewport: (u32, u32),
    polygon_mode: PolygonModeLatch,
}

impl SceneState {
    pub fn new(camera: FlyCamera, lights: LightSet, viewport: (u32, u32)) -> Self {
        Self {
            camera,
            lights,
            clock: FrameClock::default(),
            flags: ModeFlags::default(),
            background: [0.0; 3],
            viewport,
            polygon_mode: PolygonModeLatch::default(),
        }
    }

    /// Polygon mode to switch to this frame, if the wireframe flag flipped
    pub fn polygon_mode_change(&mut self) -> Option<PolygonMode> {
        self.polygon_mode.update(self.flags.wireframe)
    }

    pub fn frame_context(&self, axes: MeshHandle) -> FrameContext<'_> {
        FrameContext {
            time: self.clock.time(),
            resolution: [self.viewport.0 as f32, self.viewport.1 as f32],
            camera: &self.camera,
            lights: &self.lights,
            flags: self.flags,
            axes,
        }
    }
}

/// Read-only view of the scene handed to renderables for one frame
pub struct FrameContext<'a> {
    pub time: f32,
    pub resolution: [f32; 2],
    pub camera: &'a FlyCamera,
    pub lights: &'a LightSet,
    pub flags: ModeFlags,
    /// Shared axes gizmo mesh
    pub axes: MeshHandle,
}

impl FrameContext<'_> {
    pub fn frame_uniform(&self) -> FrameUniform {
        FrameUniform {
            view: convert_matrix4_to_array(self.camera.view_matrix()),
            projection: convert_matrix4_to_array(self.camera.projection_matrix()),
            view_pos: self.camera.position().extend(1.0).into(),
            resolution: self.resolution,
            time: self.time,
            _padding: 0.0,
        }
    }

    pub fn lights_uniform(&self) -> LightsUniform {
        self.lights.to_uniform(self.camera)
    }

    /// Binds `program` and uploads the camera and time values for it
    pub fn use_program(
        &self,
        program: ProgramKind,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        backend.submit(RenderCommand::UseProgram(program))?;
        backend.submit(RenderCommand::UploadFrame(self.frame_uniform()))
    }

    /// Draws the coordinate axes gizmo at `model`
    pub fn draw_axes(
        &self,
        model: Matrix4<f32>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        self.use_program(ProgramKind::Axes, backend)?;
        backend.submit(RenderCommand::Draw(DrawCall {
            mesh: self.axes,
            instance: InstanceUniform::new(model, MaterialUniform::default()),
        }))
    }

    /// Draws the axes gizmo at `model`. A failed gizmo is logged and never
    /// stops the object it decorates.
    pub fn draw_gizmo(&self, model: Matrix4<f32>, backend: &mut dyn RenderBackend) {
        if let Err(err) = self.draw_axes(model, backend) {
            log::warn!("Debug axes skipped: {err}");
        }
    }
}
