//! The fixed set of lights every lit object is shaded with

use cgmath::Vector3;

use crate::{
    error::{LightingError, RenderError},
    gfx::{
        camera::FlyCamera,
        rendering::commands::{DrawCall, MeshHandle, ProgramKind, RenderBackend, RenderCommand},
        resources::{
            global_bindings::{LightsUniform, MAX_POINT_LIGHTS},
            material::InstanceUniform,
        },
        scene::state::FrameContext,
    },
};

use super::light::Light;

pub const POINT_LIGHT_POSITIONS: [Vector3<f32>; MAX_POINT_LIGHTS] = [
    Vector3::new(0.7, 0.2, 2.0),
    Vector3::new(2.3, -3.3, -4.0),
    Vector3::new(-4.0, 2.0, -12.0),
    Vector3::new(0.0, 0.0, -3.0),
];

/// Main light, one directional light, four point lights and the camera spot
///
/// The debug cube mesh belongs to the cube renderable; the set only holds its
/// handle, so the mesh must outlive the set.
#[derive(Debug, Clone)]
pub struct LightSet {
    pub main: Light,
    pub directional: Light,
    pub points: [Light; MAX_POINT_LIGHTS],
    pub spot: Light,
    debug_cube: MeshHandle,
}

impl LightSet {
    pub fn new(debug_cube: MeshHandle) -> Self {
        Self {
            main: Light::point(Vector3::new(1.2, 1.0, 2.0)),
            directional: Light::directional(
                Vector3::new(-0.2, -1.0, -0.3),
                Vector3::new(0.8, 0.8, 0.8),
                Vector3::new(0.5, 0.5, 0.5),
            ),
            points: POINT_LIGHT_POSITIONS.map(Light::point),
            spot: Light::spot(),
            debug_cube,
        }
    }

    /// Applies one attenuation preset to the main light and every point light
    pub fn apply_attenuation_preset(&mut self, index: usize) -> Result<(), LightingError> {
        self.main.set_attenuation_preset(index)?;
        for light in &mut self.points {
            light.set_attenuation_preset(index)?;
        }
        Ok(())
    }

    /// Packs the set; the spot light is placed at the camera, looking along its front
    pub fn to_uniform(&self, camera: &FlyCamera) -> LightsUniform {
        LightsUniform {
            light: self.main.to_point_uniform(),
            dir_light: self.directional.to_dir_uniform(),
            point_lights: self.points.map(|light| light.to_point_uniform()),
            spot_light: self.spot.to_spot_uniform(camera.position(), camera.front()),
        }
    }

    pub fn debug_cube(&self) -> MeshHandle {
        self.debug_cube
    }

    /// Draws the small light-colored cube at `light`'s position, plus the axes
    /// gizmo there in debug mode
    pub fn render_debug_cube(
        &self,
        light: &Light,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        let transform = light.debug_transform();
        if ctx.flags.debug {
            ctx.draw_gizmo(transform, backend);
        }
        ctx.use_program(ProgramKind::Light, backend)?;
        backend.submit(RenderCommand::Draw(DrawCall {
            mesh: self.debug_cube,
            instance: InstanceUniform::new(transform, light.debug_material()),
        }))
    }

    /// Draws every point light's cube; a failed cube does not stop the
    /// others, and the first error is returned
    pub fn render_point_cubes(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        let mut first_error = None;
        for light in &self.points {
            if let Err(err) = self.render_debug_cube(light, ctx, backend) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        lighting::light::ATTENUATION_PRESETS,
        rendering::headless::HeadlessBackend,
        scene::{
            overlay::DebugOverlay,
            state::ModeFlags,
            vertex::{Vertex3D, VertexData},
        },
    };

    /// Uploads a stand-in cube mesh and the debug overlay meshes
    fn meshes(backend: &mut HeadlessBackend) -> (MeshHandle, DebugOverlay) {
        let cube = backend.upload_mesh("Cube", VertexData::Lit(&[Vertex3D::default(); 36]), &[]);
        (cube, DebugOverlay::new(backend))
    }

    fn context<'a>(
        camera: &'a FlyCamera,
        lights: &'a LightSet,
        axes: MeshHandle,
        debug: bool,
    ) -> FrameContext<'a> {
        FrameContext {
            time: 0.0,
            resolution: [800.0, 600.0],
            camera,
            lights,
            flags: ModeFlags {
                debug,
                ..Default::default()
            },
            axes,
        }
    }

    #[test]
    fn test_spot_light_follows_camera() {
        let lights = LightSet::new(MeshHandle(0));
        let camera = FlyCamera::default();
        let uniform = lights.to_uniform(&camera);
        assert_eq!(uniform.spot_light.position, [0.0, 0.0, 3.0, 1.0]);
        assert!((uniform.spot_light.direction[2] + 1.0).abs() < 1e-5);
        assert_eq!(uniform.point_lights[1].position, [2.3, -3.3, -4.0, 1.0]);
    }

    #[test]
    fn test_attenuation_preset_reaches_main_and_points() {
        let mut lights = LightSet::new(MeshHandle(0));
        lights.apply_attenuation_preset(0).unwrap();
        assert_eq!(lights.main.attenuation.linear, ATTENUATION_PRESETS[0].linear);
        assert!(lights
            .points
            .iter()
            .all(|l| l.attenuation.quadratic == ATTENUATION_PRESETS[0].quadratic));
        // The spot light keeps its own coefficients.
        assert_eq!(lights.spot.attenuation.linear, 0.09);
    }

    #[test]
    fn test_debug_cube_reuses_shared_mesh() {
        let mut backend = HeadlessBackend::new();
        let (cube, overlay) = meshes(&mut backend);
        let lights = LightSet::new(cube);
        let camera = FlyCamera::default();
        let ctx = context(&camera, &lights, overlay.axes(), false);
        lights.render_point_cubes(&ctx, &mut backend).unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), MAX_POINT_LIGHTS);
        assert!(draws.iter().all(|d| d.mesh == cube));
        assert_eq!(draws[0].instance.model[3], [0.7, 0.2, 2.0, 1.0]);
        assert!((draws[0].instance.model[0][0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_debug_flag_adds_axes_at_light() {
        let mut backend = HeadlessBackend::new();
        let (cube, overlay) = meshes(&mut backend);
        let lights = LightSet::new(cube);
        let camera = FlyCamera::default();
        let ctx = context(&camera, &lights, overlay.axes(), true);
        lights.render_debug_cube(&lights.main, &ctx, &mut backend).unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].mesh, overlay.axes());
        assert_eq!(draws[0].instance.model, draws[1].instance.model);
    }

    #[test]
    fn test_broken_gizmo_keeps_light_cubes() {
        let mut backend = HeadlessBackend::new();
        let (cube, overlay) = meshes(&mut backend);
        backend.release_mesh(overlay.axes()).unwrap();
        let lights = LightSet::new(cube);
        let camera = FlyCamera::default();
        let ctx = context(&camera, &lights, overlay.axes(), true);

        lights.render_point_cubes(&ctx, &mut backend).unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), MAX_POINT_LIGHTS);
        assert!(draws.iter().all(|d| d.mesh == cube));
    }

    #[test]
    fn test_point_cubes_report_first_error() {
        let mut backend = HeadlessBackend::new();
        let (cube, overlay) = meshes(&mut backend);
        backend.release_mesh(cube).unwrap();
        let lights = LightSet::new(cube);
        let camera = FlyCamera::default();
        let ctx = context(&camera, &lights, overlay.axes(), false);

        let result = lights.render_point_cubes(&ctx, &mut backend);

        assert_eq!(result, Err(RenderError::ReleasedMesh(cube)));
        // Every light was still tried: one Light program bind each.
        let binds = backend
            .commands()
            .iter()
            .filter(|c| **c == RenderCommand::UseProgram(ProgramKind::Light))
            .count();
        assert_eq!(binds, MAX_POINT_LIGHTS);
    }
}
