//! Lit renderables: the shared draw sequence and the procedural objects
//!
//! Every object shaded by the lit program implements [`LitObject`]. The
//! provided [`LitObject::render`] fixes the order of a draw: debug gizmo,
//! program bind, light upload, texture binds, then one draw per instance.
//! Implementors only say where their instances are and which textures they
//! bind.

use cgmath::{InnerSpace, Matrix4, Rad, Vector3};
use rand::Rng;

use crate::{
    config::{SphereConfig, TextureMaps},
    error::{GeometryError, RenderError},
    gfx::{
        geometry::{generate_cube, generate_sphere},
        rendering::commands::{
            DrawCall, MeshHandle, ProgramKind, RenderBackend, RenderCommand, TextureBinding,
            TextureHandle,
        },
        resources::material::{InstanceUniform, Material, MaterialMaps, TextureRole},
        scene::{state::FrameContext, vertex::VertexData},
    },
};

/// World positions shared by the cube and sphere instances
pub const INSTANCE_POSITIONS: [Vector3<f32>; 10] = [
    Vector3::new(0.0, 0.0, 0.0),
    Vector3::new(2.0, 5.0, -15.0),
    Vector3::new(-1.5, -2.2, -2.5),
    Vector3::new(-3.8, -2.0, -12.3),
    Vector3::new(2.4, -0.4, -3.5),
    Vector3::new(-1.7, 3.0, -7.5),
    Vector3::new(1.3, -2.0, -2.5),
    Vector3::new(1.5, 2.0, -2.5),
    Vector3::new(1.5, 0.2, -1.5),
    Vector3::new(-1.3, 1.0, -1.5),
];

/// Cube instance the debug gizmo is attached to
const CUBE_GIZMO_INSTANCE: usize = 3;

pub trait LitObject {
    fn name(&self) -> &str;

    /// Transform of the representative instance the debug axes are drawn at
    fn debug_anchor(&self, ctx: &FrameContext<'_>) -> Matrix4<f32>;

    fn set_shininess(&mut self, shininess: f32);

    /// Meshes this object owns and must release at shutdown
    fn meshes(&self) -> Vec<MeshHandle>;

    fn bind(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        ctx.use_program(ProgramKind::Lit, backend)
    }

    fn upload_lights(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        backend.submit(RenderCommand::UploadLights(Box::new(ctx.lights_uniform())))
    }

    /// Object-wide texture binds; objects with per-mesh textures bind them
    /// while drawing instead
    fn bind_textures(&self, _backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        Ok(())
    }

    fn upload_transforms_and_draw(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError>;

    fn render(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        if ctx.flags.debug {
            ctx.draw_gizmo(self.debug_anchor(ctx), backend);
        }
        self.bind(ctx, backend)?;
        self.upload_lights(ctx, backend)?;
        self.bind_textures(backend)?;
        self.upload_transforms_and_draw(ctx, backend)
    }
}

/// One material per instance, colored randomly once at construction
fn random_materials(rng: &mut impl Rng, count: usize, shininess: f32) -> Vec<Material> {
    (0..count)
        .map(|_| {
            let color = Vector3::new(rng.random::<f32>(), rng.random::<f32>(), rng.random::<f32>());
            Material::from_color(color, Vector3::new(0.5, 0.5, 0.5), shininess)
        })
        .collect()
}

fn load_optional(
    backend: &mut dyn RenderBackend,
    path: Option<&std::path::Path>,
) -> Option<TextureHandle> {
    let path = path?;
    match backend.load_texture(path) {
        Ok(handle) => Some(handle),
        Err(err) => {
            log::warn!("{err}; drawing without it");
            None
        }
    }
}

/// Ten spinning textured cubes
pub struct Cube {
    mesh: MeshHandle,
    materials: Vec<Material>,
    diffuse_map: Option<TextureHandle>,
    specular_map: Option<TextureHandle>,
    emission_map: Option<TextureHandle>,
}

impl Cube {
    pub fn new(backend: &mut dyn RenderBackend, maps: &TextureMaps, rng: &mut impl Rng) -> Self {
        let geometry = generate_cube();
        let vertices = geometry.to_vertices();
        let mesh = backend.upload_mesh("Cube", VertexData::Lit(&vertices), &geometry.indices);

        Self {
            mesh,
            materials: random_materials(
                rng,
                INSTANCE_POSITIONS.len(),
                Material::default().shininess,
            ),
            diffuse_map: load_optional(backend, maps.diffuse.as_deref()),
            specular_map: load_optional(backend, maps.specular.as_deref()),
            emission_map: load_optional(backend, maps.emission.as_deref()),
        }
    }

    /// The unit cube mesh, also used for the light debug cubes
    pub fn mesh(&self) -> MeshHandle {
        self.mesh
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn instance_transform(index: usize, time: f32) -> Matrix4<f32> {
        let axis = Vector3::new(1.0, 0.3, 0.5).normalize();
        Matrix4::from_translation(INSTANCE_POSITIONS[index])
            * Matrix4::from_axis_angle(axis, Rad(time.sin()))
    }

    fn maps(&self) -> MaterialMaps {
        MaterialMaps {
            diffuse: self.diffuse_map.is_some(),
            specular: self.specular_map.is_some(),
            emission: self.emission_map.is_some(),
        }
    }
}

impl LitObject for Cube {
    fn name(&self) -> &str {
        "cube"
    }

    fn debug_anchor(&self, ctx: &FrameContext<'_>) -> Matrix4<f32> {
        Self::instance_transform(CUBE_GIZMO_INSTANCE, ctx.time)
    }

    fn set_shininess(&mut self, shininess: f32) {
        for material in &mut self.materials {
            material.shininess = shininess;
        }
    }

    fn meshes(&self) -> Vec<MeshHandle> {
        vec![self.mesh]
    }

    fn bind_textures(&self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        let maps = [
            (TextureRole::Diffuse, self.diffuse_map),
            (TextureRole::Specular, self.specular_map),
            (TextureRole::Emission, self.emission_map),
        ];
        for (unit, (role, texture)) in maps.into_iter().enumerate() {
            if let Some(texture) = texture {
                backend.submit(RenderCommand::BindTexture(TextureBinding::material(
                    unit as u32,
                    role,
                    texture,
                )))?;
            }
        }
        Ok(())
    }

    fn upload_transforms_and_draw(
        &self,
        ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        let maps = self.maps();
        for (index, material) in self.materials.iter().enumerate() {
            backend.submit(RenderCommand::Draw(DrawCall {
                mesh: self.mesh,
                instance: InstanceUniform::new(
                    Self::instance_transform(index, ctx.time),
                    material.to_uniform(maps),
                ),
            }))?;
        }
        Ok(())
    }
}

/// Ten untextured spheres
pub struct Sphere {
    mesh: MeshHandle,
    materials: Vec<Material>,
}

impl Sphere {
    pub fn new(
        backend: &mut dyn RenderBackend,
        config: &SphereConfig,
        rng: &mut impl Rng,
    ) -> Result<Self, GeometryError> {
        let geometry = generate_sphere(config.radius, config.sectors, config.stacks)?;
        let vertices = geometry.to_vertices();
        let mesh = backend.upload_mesh("Sphere", VertexData::Lit(&vertices), &geometry.indices);

        Ok(Self {
            mesh,
            materials: random_materials(
                rng,
                INSTANCE_POSITIONS.len(),
                Material::default().shininess,
            ),
        })
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn instance_transform(index: usize) -> Matrix4<f32> {
        Matrix4::from_translation(INSTANCE_POSITIONS[index])
    }
}

impl LitObject for Sphere {
    fn name(&self) -> &str {
        "sphere"
    }

    fn debug_anchor(&self, _ctx: &FrameContext<'_>) -> Matrix4<f32> {
        Self::instance_transform(0)
    }

    fn set_shininess(&mut self, shininess: f32) {
        for material in &mut self.materials {
            material.shininess = shininess;
        }
    }

    fn meshes(&self) -> Vec<MeshHandle> {
        vec![self.mesh]
    }

    fn upload_transforms_and_draw(
        &self,
        _ctx: &FrameContext<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), RenderError> {
        for (index, material) in self.materials.iter().enumerate() {
            backend.submit(RenderCommand::Draw(DrawCall {
                mesh: self.mesh,
                instance: InstanceUniform::new(
                    Self::instance_transform(index),
                    material.to_uniform(MaterialMaps::default()),
                ),
            }))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::FlyCamera,
        lighting::LightSet,
        rendering::headless::HeadlessBackend,
        scene::{overlay::DebugOverlay, state::ModeFlags},
    };
    use rand::{rngs::StdRng, SeedableRng};
    use std::path::PathBuf;

    fn maps() -> TextureMaps {
        TextureMaps {
            diffuse: Some(PathBuf::from("diffuse.png")),
            specular: Some(PathBuf::from("specular.png")),
            emission: Some(PathBuf::from("emission.png")),
        }
    }

    fn context<'a>(
        camera: &'a FlyCamera,
        lights: &'a LightSet,
        flags: ModeFlags,
    ) -> FrameContext<'a> {
        FrameContext {
            time: 1.0,
            resolution: [800.0, 600.0],
            camera,
            lights,
            flags,
            axes: MeshHandle(99),
        }
    }

    #[test]
    fn test_cube_render_sequence() {
        let mut backend = HeadlessBackend::new();
        let cube = Cube::new(&mut backend, &maps(), &mut StdRng::seed_from_u64(1));
        let camera = FlyCamera::default();
        let lights = LightSet::new(cube.mesh());
        cube.render(&context(&camera, &lights, ModeFlags::default()), &mut backend)
            .unwrap();

        let commands = backend.commands();
        assert_eq!(commands[0], RenderCommand::UseProgram(ProgramKind::Lit));
        assert!(matches!(commands[1], RenderCommand::UploadFrame(_)));
        assert!(matches!(commands[2], RenderCommand::UploadLights(_)));
        let names: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::BindTexture(binding) => Some((binding.unit, binding.name.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            vec![(0, "material.diffuse"), (1, "material.specular"), (2, "material.emission")]
        );

        let draws = backend.draws();
        assert_eq!(draws.len(), 10);
        assert!(draws.iter().all(|d| d.instance.material.use_emission_map == 1));
    }

    #[test]
    fn test_missing_texture_falls_back_to_flat_color() {
        let mut backend = HeadlessBackend::new();
        backend.fail_texture("specular.png");
        let cube = Cube::new(&mut backend, &maps(), &mut StdRng::seed_from_u64(1));
        let camera = FlyCamera::default();
        let lights = LightSet::new(cube.mesh());
        cube.render(&context(&camera, &lights, ModeFlags::default()), &mut backend)
            .unwrap();

        let binds = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, RenderCommand::BindTexture(_)))
            .count();
        assert_eq!(binds, 2);
        assert!(backend.draws().iter().all(|d| d.instance.material.use_specular_map == 0));
    }

    #[test]
    fn test_instance_colors_are_stable() {
        let mut backend = HeadlessBackend::new();
        let mut rng = StdRng::seed_from_u64(3);
        let sphere = Sphere::new(&mut backend, &SphereConfig::default(), &mut rng).unwrap();
        let camera = FlyCamera::default();
        let lights = LightSet::new(MeshHandle(0));
        let ctx = context(&camera, &lights, ModeFlags::default());

        sphere.render(&ctx, &mut backend).unwrap();
        backend.present();
        sphere.render(&ctx, &mut backend).unwrap();

        let first: Vec<_> = crate::gfx::rendering::headless::draws_in(&backend.frames()[0])
            .iter()
            .map(|d| d.instance.material)
            .collect();
        let second: Vec<_> = backend.draws().iter().map(|d| d.instance.material).collect();
        assert_eq!(first, second);
        // ambient = diffuse * 0.2 for every instance
        for material in sphere.materials() {
            assert!((material.ambient - material.diffuse * 0.2).magnitude() < 1e-6);
        }
    }

    fn debug_flags() -> ModeFlags {
        ModeFlags {
            debug: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_debug_gizmo_drawn_first() {
        let mut backend = HeadlessBackend::new();
        let cube = Cube::new(&mut backend, &TextureMaps::default(), &mut StdRng::seed_from_u64(1));
        let overlay = DebugOverlay::new(&mut backend);
        let camera = FlyCamera::default();
        let lights = LightSet::new(cube.mesh());
        let ctx = FrameContext {
            axes: overlay.axes(),
            ..context(&camera, &lights, debug_flags())
        };
        cube.render(&ctx, &mut backend).unwrap();

        assert_eq!(backend.commands()[0], RenderCommand::UseProgram(ProgramKind::Axes));
        let draws = backend.draws();
        assert_eq!(draws.len(), 11);
        assert_eq!(draws[0].mesh, overlay.axes());
        assert_eq!(draws[0].instance.model, draws[1 + CUBE_GIZMO_INSTANCE].instance.model);
    }

    #[test]
    fn test_broken_gizmo_keeps_object_draws() {
        let mut backend = HeadlessBackend::new();
        let cube = Cube::new(&mut backend, &TextureMaps::default(), &mut StdRng::seed_from_u64(1));
        let camera = FlyCamera::default();
        let lights = LightSet::new(cube.mesh());
        // The axes handle was never uploaded, so the gizmo draw is rejected.
        cube.render(&context(&camera, &lights, debug_flags()), &mut backend)
            .unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), INSTANCE_POSITIONS.len());
        assert!(draws.iter().all(|d| d.mesh == cube.mesh()));
        assert!(backend
            .commands()
            .contains(&RenderCommand::UseProgram(ProgramKind::Lit)));
    }

    #[test]
    fn test_sphere_instances_are_translations() {
        let m = Sphere::instance_transform(1);
        assert_eq!(m.w.truncate(), INSTANCE_POSITIONS[1]);
        assert_eq!(m.x, cgmath::Vector4::unit_x());
    }

    #[test]
    fn test_invalid_sphere_config_is_reported() {
        let mut backend = HeadlessBackend::new();
        let config = SphereConfig {
            radius: 0.0,
            ..Default::default()
        };
        assert!(Sphere::new(&mut backend, &config, &mut StdRng::seed_from_u64(1)).is_err());
        assert!(backend.meshes().is_empty());
    }

    #[test]
    fn test_shininess_reaches_uniforms() {
        let mut backend = HeadlessBackend::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut cube = Cube::new(&mut backend, &TextureMaps::default(), &mut rng);
        cube.set_shininess(8.0);
        let camera = FlyCamera::default();
        let lights = LightSet::new(cube.mesh());
        cube.render(&context(&camera, &lights, ModeFlags::default()), &mut backend)
            .unwrap();
        assert!(backend.draws().iter().all(|d| d.instance.material.shininess == 8.0));
    }
}
