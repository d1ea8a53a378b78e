//! Debug overlays: world axes and the ground grid

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    error::RenderError,
    gfx::{
        geometry::{generate_axes, generate_grid},
        rendering::commands::{DrawCall, MeshHandle, ProgramKind, RenderBackend, RenderCommand},
        resources::material::{InstanceUniform, MaterialUniform},
        scene::{state::FrameContext, vertex::VertexData},
    },
};

pub const AXES_LENGTH: f32 = 5.0;
pub const GRID_HALF_EXTENT: f32 = 50.0;
pub const GRID_TILES: f32 = 50.0;

pub struct DebugOverlay {
    axes: MeshHandle,
    grid: MeshHandle,
}

impl DebugOverlay {
    pub fn new(backend: &mut dyn RenderBackend) -> Self {
        let axes = generate_axes(AXES_LENGTH);
        let axes = backend.upload_mesh("Axes", VertexData::Lines(&axes.to_line_vertices()), &[]);

        let grid = generate_grid(GRID_HALF_EXTENT, GRID_TILES);
        let grid = backend.upload_mesh(
            "Grid",
            VertexData::Lit(&grid.to_vertices()),
            &grid.indices,
        );

        Self { axes, grid }
    }

    /// The axes mesh, also used for per-object gizmos
    pub fn axes(&self) -> MeshHandle {
        self.axes
    }

    pub fn meshes(&self) -> [MeshHandle; 2] {
        [self.axes, self.grid]
    }

    /// World axes at the origin, then the grid
    pub fn render(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        ctx.draw_gizmo(Matrix4::identity(), backend);
        ctx.use_program(ProgramKind::Grid, backend)?;
        backend.submit(RenderCommand::Draw(DrawCall {
            mesh: self.grid,
            instance: InstanceUniform::new(Matrix4::identity(), MaterialUniform::default()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::headless::HeadlessBackend;

    #[test]
    fn test_overlay_meshes() {
        let mut backend = HeadlessBackend::new();
        let overlay = DebugOverlay::new(&mut backend);
        let axes = backend.mesh(overlay.axes()).unwrap();
        assert_eq!((axes.vertex_count, axes.index_count), (6, 0));
        let grid = backend.mesh(overlay.meshes()[1]).unwrap();
        assert_eq!((grid.vertex_count, grid.index_count), (4, 6));
    }
}
