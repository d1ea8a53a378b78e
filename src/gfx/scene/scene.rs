use cgmath::Vector3;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::SandboxConfig,
    error::GeometryError,
    gfx::{
        camera::{CameraController, InputState},
        lighting::LightSet,
        rendering::commands::{ProgramKind, RenderBackend, RenderCommand},
    },
    ui::panel::GuiState,
};

use super::{
    model::Model,
    object::{Cube, LitObject, Sphere},
    overlay::DebugOverlay,
    state::SceneState,
};

/// Which object is drawn as the main subject this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primary {
    Cube,
    Sphere,
    Model,
}

/// The sandbox scene: owns every renderable and the frame state, and turns
/// one frame of input and GUI values into a command stream
pub struct Scene {
    pub state: SceneState,
    controller: CameraController,
    cube: Cube,
    sphere: Sphere,
    model: Option<Model>,
    overlay: DebugOverlay,
    /// Preset last applied to the lights
    attenuation: Option<usize>,
}

impl Scene {
    pub fn new(
        config: &SandboxConfig,
        backend: &mut dyn RenderBackend,
    ) -> Result<Self, GeometryError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let cube = Cube::new(backend, &config.assets.cube, &mut rng);
        let sphere = Sphere::new(backend, &config.sphere, &mut rng)?;
        let overlay = DebugOverlay::new(backend);
        let model = config.assets.model.as_deref().and_then(|path| {
            Model::load(backend, path, config.assets.model_scale)
                .map_err(|err| log::warn!("{err}; model mode disabled"))
                .ok()
        });

        let camera = config.camera.build(config.window.width, config.window.height);
        let lights = LightSet::new(cube.mesh());

        Ok(Self {
            state: SceneState::new(camera, lights, (config.window.width, config.window.height)),
            controller: CameraController::default(),
            cube,
            sphere,
            model,
            overlay,
            attenuation: None,
        })
    }

    /// The controller that turns window events into [`InputState`]
    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// GUI values matching the scene's starting state
    pub fn gui_defaults(&self) -> GuiState {
        GuiState {
            model_available: self.has_model(),
            ..GuiState::default()
        }
    }

    pub fn primary(&self) -> Primary {
        let flags = self.state.flags;
        if flags.model && self.model.is_some() {
            Primary::Model
        } else if flags.sphere {
            Primary::Sphere
        } else {
            Primary::Cube
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.state.viewport = (width, height);
        self.state.camera.resize(width, height);
    }

    /// Recompiles every program; failures keep the old program and are logged
    pub fn reload_shaders(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let mut failed = 0;
        for program in ProgramKind::ALL {
            match backend.reload_program(program) {
                Ok(()) => log::info!("Reloaded {program:?} program"),
                Err(err) => {
                    failed += 1;
                    log::warn!("{err}; keeping previous program");
                }
            }
        }
        failed
    }

    /// Copies the GUI values into the lights, objects and flags
    fn apply_gui(&mut self, gui: &GuiState) {
        let lights = &mut self.state.lights;
        lights.main.position = Vector3::from(gui.light_position);
        lights.main.set_color(Vector3::from(gui.light_color));
        for (light, (position, color)) in lights
            .points
            .iter_mut()
            .zip(gui.point_positions.iter().zip(&gui.point_colors))
        {
            light.position = Vector3::from(*position);
            light.set_color(Vector3::from(*color));
        }

        if self.attenuation != Some(gui.attenuation) {
            match lights.apply_attenuation_preset(gui.attenuation) {
                Ok(()) => self.attenuation = Some(gui.attenuation),
                Err(err) => log::warn!("{err}"),
            }
        }

        self.cube.set_shininess(gui.shininess);
        self.sphere.set_shininess(gui.shininess);
        if let Some(model) = &mut self.model {
            model.set_shininess(gui.shininess);
        }

        self.state.background = gui.background;
        self.state.flags = gui.flags;
    }

    /// Runs one frame: input, GUI values, the command stream, then present
    ///
    /// A failure inside one object's draw is logged and the rest of the
    /// frame still renders.
    pub fn tick(
        &mut self,
        now: f32,
        input: &mut InputState,
        gui: &GuiState,
        backend: &mut dyn RenderBackend,
    ) {
        let delta = self.state.clock.advance(now);
        self.state.camera.set_frame_delta(delta);

        let actions = self.controller.update_camera(input, &mut self.state.camera);
        if actions.reload_shaders {
            self.reload_shaders(backend);
        }
        input.end_frame();

        self.apply_gui(gui);

        submit_logged(backend, RenderCommand::Clear {
            color: self.state.background,
        });
        if let Some(mode) = self.state.polygon_mode_change() {
            submit_logged(backend, RenderCommand::SetPolygonMode(mode));
        }

        let primary = self.primary();
        let ctx = self.state.frame_context(self.overlay.axes());

        if ctx.flags.debug {
            if let Err(err) = self.overlay.render(&ctx, backend) {
                log::warn!("Debug overlay skipped: {err}");
            }
        }

        let object: &dyn LitObject = match (primary, &self.model) {
            (Primary::Model, Some(model)) => model,
            (Primary::Sphere, _) => &self.sphere,
            _ => &self.cube,
        };
        if let Err(err) = object.render(&ctx, backend) {
            log::warn!("Skipped {} this frame: {err}", object.name());
        }

        let lights = &self.state.lights;
        let light_cubes = match primary {
            Primary::Sphere => lights.render_debug_cube(&lights.main, &ctx, backend),
            Primary::Cube | Primary::Model => lights.render_point_cubes(&ctx, backend),
        };
        if let Err(err) = light_cubes {
            log::warn!("Skipped light cubes this frame: {err}");
        }

        submit_logged(backend, RenderCommand::GuiOverlay);
        backend.present();
    }

    /// Releases every GPU mesh the scene owns
    pub fn release(self, backend: &mut dyn RenderBackend) {
        let mut meshes = self.cube.meshes();
        meshes.extend(self.sphere.meshes());
        meshes.extend(self.overlay.meshes());
        if let Some(model) = &self.model {
            meshes.extend(model.meshes());
        }
        for mesh in meshes {
            if let Err(err) = backend.release_mesh(mesh) {
                log::warn!("{err}");
            }
        }
    }
}

fn submit_logged(backend: &mut dyn RenderBackend, command: RenderCommand) {
    if let Err(err) = backend.submit(command) {
        log::warn!("{err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::Key,
        rendering::{
            commands::{MeshHandle, PolygonMode},
            headless::{draws_in, HeadlessBackend},
        },
    };

    fn config() -> SandboxConfig {
        let mut config = SandboxConfig {
            seed: Some(11),
            ..Default::default()
        };
        config.assets.cube = Default::default();
        config
    }

    fn scene(backend: &mut HeadlessBackend) -> Scene {
        Scene::new(&config(), backend).unwrap()
    }

    fn polygon_modes(backend: &HeadlessBackend) -> Vec<PolygonMode> {
        backend
            .frames()
            .iter()
            .flatten()
            .filter_map(|c| match c {
                RenderCommand::SetPolygonMode(mode) => Some(*mode),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_wireframe_transitions_are_edge_triggered() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut input = InputState::new();
        let mut gui = scene.gui_defaults();

        for frame in 0..3 {
            scene.tick(frame as f32, &mut input, &gui, &mut backend);
        }
        gui.flags.wireframe = true;
        for frame in 3..6 {
            scene.tick(frame as f32, &mut input, &gui, &mut backend);
        }
        gui.flags.wireframe = false;
        for frame in 6..9 {
            scene.tick(frame as f32, &mut input, &gui, &mut backend);
        }

        assert_eq!(polygon_modes(&backend), vec![PolygonMode::Line, PolygonMode::Fill]);
        assert_eq!(backend.present_count(), 9);
    }

    #[test]
    fn test_frame_starts_with_clear_and_ends_with_overlay() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        gui.background = [0.2, 0.3, 0.4];
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        let frame = backend.last_frame().unwrap();
        assert_eq!(frame[0], RenderCommand::Clear { color: [0.2, 0.3, 0.4] });
        assert_eq!(frame.last(), Some(&RenderCommand::GuiOverlay));
    }

    #[test]
    fn test_cube_mode_draws_cubes_and_point_lights() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let gui = scene.gui_defaults();
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        assert_eq!(scene.primary(), Primary::Cube);
        let draws = draws_in(backend.last_frame().unwrap());
        assert_eq!(draws.len(), 10 + 4);
    }

    #[test]
    fn test_sphere_mode_draws_main_light_cube() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        gui.flags.sphere = true;
        gui.light_position = [3.0, 4.0, 5.0];
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        assert_eq!(scene.primary(), Primary::Sphere);
        let draws = draws_in(backend.last_frame().unwrap());
        assert_eq!(draws.len(), 10 + 1);
        assert_eq!(draws[10].instance.model[3], [3.0, 4.0, 5.0, 1.0]);
    }

    #[test]
    fn test_model_flag_without_model_falls_back() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        assert!(!gui.model_available);
        gui.flags.model = true;
        gui.flags.sphere = true;
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);
        assert_eq!(scene.primary(), Primary::Sphere);
    }

    #[test]
    fn test_debug_mode_adds_overlays() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        gui.flags.debug = true;
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        let frame = backend.last_frame().unwrap();
        // world axes + grid + cube gizmo + 10 cubes + 4 x (gizmo + light cube)
        assert_eq!(draws_in(frame).len(), 2 + 1 + 10 + 8);
        assert!(frame.contains(&RenderCommand::UseProgram(ProgramKind::Grid)));
    }

    #[test]
    fn test_gui_colors_reach_lights() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        gui.light_color = [1.0, 0.0, 0.5];
        gui.point_colors[2] = [0.2, 0.4, 0.6];
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        let lights = &scene.state.lights;
        assert_eq!(lights.main.diffuse(), Vector3::new(0.5, 0.0, 0.25));
        assert!((lights.points[2].ambient().z - 0.06).abs() < 1e-6);
        assert_eq!(lights.main.attenuation.linear, 0.045);
    }

    #[test]
    fn test_attenuation_follows_gui_selection() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        gui.attenuation = 0;
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);
        assert_eq!(scene.state.lights.points[3].attenuation.quadratic, 1.8);

        gui.attenuation = 99;
        scene.tick(1.0, &mut InputState::new(), &gui, &mut backend);
        assert_eq!(scene.state.lights.points[3].attenuation.quadratic, 1.8);
    }

    #[test]
    fn test_reload_is_edge_triggered_and_tolerates_failure() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let gui = scene.gui_defaults();
        let mut input = InputState::new();
        backend.break_program(ProgramKind::Lit);

        input.set_key(Key::R, true);
        scene.tick(0.0, &mut input, &gui, &mut backend);
        input.set_key(Key::R, true);
        scene.tick(1.0, &mut input, &gui, &mut backend);

        assert_eq!(
            backend.reloads(),
            &[ProgramKind::Light, ProgramKind::Axes, ProgramKind::Grid]
        );
        // The broken program did not stop the frame.
        assert_eq!(draws_in(backend.last_frame().unwrap()).len(), 14);
    }

    #[test]
    fn test_movement_scales_with_frame_delta() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let gui = scene.gui_defaults();
        let mut input = InputState::new();
        input.set_key(Key::W, true);

        scene.tick(10.0, &mut input, &gui, &mut backend);
        assert!((scene.state.camera.position().z - 3.0).abs() < 1e-5);
        scene.tick(10.5, &mut input, &gui, &mut backend);
        assert!((scene.state.camera.position().z - (3.0 - 2.5 * 0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_object_failure_is_contained() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let gui = scene.gui_defaults();
        // Cube mesh is shared with the light cubes, so both fail.
        backend.release_mesh(MeshHandle(0)).unwrap();
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        let frame = backend.last_frame().unwrap();
        assert!(draws_in(frame).is_empty());
        assert_eq!(frame.last(), Some(&RenderCommand::GuiOverlay));
        assert_eq!(backend.present_count(), 1);
    }

    #[test]
    fn test_broken_gizmo_keeps_rest_of_debug_frame() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        let mut gui = scene.gui_defaults();
        gui.flags.debug = true;
        backend.release_mesh(scene.overlay.axes()).unwrap();
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        let draws = draws_in(backend.last_frame().unwrap());
        let grid = scene.overlay.meshes()[1];
        let cube = scene.cube.mesh();
        // grid + 10 cubes + 4 light cubes, only the axes gizmos are missing
        assert_eq!(draws.len(), 1 + 10 + 4);
        assert_eq!(draws.iter().filter(|d| d.mesh == grid).count(), 1);
        assert_eq!(draws.iter().filter(|d| d.mesh == cube).count(), 14);
    }

    #[test]
    fn test_release_frees_every_mesh_once() {
        let mut backend = HeadlessBackend::new();
        let scene = scene(&mut backend);
        assert_eq!(backend.live_mesh_count(), 4);
        scene.release(&mut backend);
        assert_eq!(backend.live_mesh_count(), 0);
    }

    #[test]
    fn test_resize_updates_viewport_and_ignores_zero() {
        let mut backend = HeadlessBackend::new();
        let mut scene = scene(&mut backend);
        scene.resize(1024, 512);
        scene.resize(0, 300);
        assert_eq!(scene.state.viewport, (1024, 512));
        assert!((scene.state.camera.aspect() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_model_scene_draws_sub_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tri.obj");
        std::fs::write(&obj, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mut config = config();
        config.assets.model = Some(obj);

        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new(&config, &mut backend).unwrap();
        let mut gui = scene.gui_defaults();
        assert!(gui.model_available);
        gui.flags.model = true;
        scene.tick(0.0, &mut InputState::new(), &gui, &mut backend);

        assert_eq!(scene.primary(), Primary::Model);
        assert_eq!(draws_in(backend.last_frame().unwrap()).len(), 1 + 4);
    }
}
