//! Window, event loop and frame driver
//!
//! [`SandboxApp`] owns the winit event loop. Window and device events are
//! folded into an [`InputState`]; every redraw builds the GUI, then hands the
//! scene one tick against the GPU backend.

use std::{path::Path, sync::Arc, time::Instant};

use anyhow::Context;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::SandboxConfig,
    error::{AssetError, RenderError, ShaderError},
    gfx::{
        camera::InputState,
        rendering::{
            commands::{MeshHandle, ProgramKind, RenderBackend, RenderCommand, TextureHandle},
            render_engine::{EngineSettings, RenderEngine},
        },
        scene::{vertex::VertexData, Scene},
    },
    ui::{debug_window, GuiState, UiManager},
};

/// The GPU backend for one frame: the engine plus the UI overlay it composites
struct FrameRecorder<'a> {
    engine: &'a mut RenderEngine,
    ui: &'a mut UiManager,
}

impl RenderBackend for FrameRecorder<'_> {
    fn upload_mesh(
        &mut self,
        label: &str,
        vertices: VertexData<'_>,
        indices: &[u32],
    ) -> MeshHandle {
        self.engine.upload_mesh(label, vertices, indices)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) -> Result<(), RenderError> {
        self.engine.release_mesh(mesh)
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        self.engine.load_texture(path)
    }

    fn reload_program(&mut self, program: ProgramKind) -> Result<(), ShaderError> {
        self.engine.reload_program(program)
    }

    fn submit(&mut self, command: RenderCommand) -> Result<(), RenderError> {
        self.engine.submit(command)
    }

    fn present(&mut self) {
        self.engine.render_frame(&mut *self.ui);
    }
}

pub struct SandboxApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: SandboxConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Option<Scene>,
    input: InputState,
    gui: GuiState,
    start: Instant,
    startup_error: Option<anyhow::Error>,
}

impl SandboxApp {
    pub fn new(config: SandboxConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene: None,
                input: InputState::new(),
                gui: GuiState::default(),
                start: Instant::now(),
                startup_error: None,
            },
        })
    }

    /// Runs until the window closes; returns any error that aborted startup
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self.event_loop.take().context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .context("Event loop failed")?;

        match self.app_state.startup_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_config = &self.config.window;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(window_config.title.clone())
                    .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);
        let (width, height) = window.inner_size().into();

        let settings = EngineSettings {
            vsync: window_config.vsync,
            shader_dir: self.config.assets.shader_dir.clone(),
            flip_textures: self.config.assets.flip_textures,
        };
        let mut engine =
            pollster::block_on(RenderEngine::new(window.clone(), width, height, &settings))?;

        let mut scene = Scene::new(&self.config, &mut engine).context("Failed to build the scene")?;
        scene.resize(width, height);

        let mut ui_manager = UiManager::new(
            engine.device(),
            engine.queue(),
            engine.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);

        self.gui = scene.gui_defaults();
        info!(
            "Sandbox ready ({}x{}, model {})",
            width,
            height,
            if scene.has_model() { "loaded" } else { "absent" }
        );

        self.window = Some(window);
        self.render_engine = Some(engine);
        self.ui_manager = Some(ui_manager);
        self.scene = Some(scene);
        self.start = Instant::now();
        Ok(())
    }

    fn redraw(&mut self) {
        let (Some(window), Some(engine), Some(ui), Some(scene)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
            self.scene.as_mut(),
        ) else {
            return;
        };

        self.gui.frame_ms = ui.frame_ms();
        let gui = &mut self.gui;
        ui.update_logic(window, |frame| debug_window(frame, gui));

        let now = self.start.elapsed().as_secs_f32();
        let mut recorder = FrameRecorder { engine, ui };
        scene.tick(now, &mut self.input, &self.gui, &mut recorder);
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            error!("{e:#}");
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let ui_captured = match self.ui_manager.as_mut() {
            Some(ui_manager) => ui_manager.handle_input(
                &window,
                &Event::<()>::WindowEvent {
                    window_id,
                    event: event.clone(),
                },
            ),
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                // Releases always go through, so keys never stick
                if !ui_captured || key_event.state == ElementState::Released {
                    if let Some(scene) = self.scene.as_ref() {
                        scene.controller().process_keyed_events(&key_event, &mut self.input);
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Right,
                ..
            } => {
                self.input.mouse_look = state == ElementState::Pressed && !ui_captured;
            }
            WindowEvent::Focused(false) => {
                self.input.release_all();
                self.input.mouse_look = false;
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.render_engine.as_mut() {
                    engine.resize(width, height);
                }
                if let Some(scene) = self.scene.as_mut() {
                    scene.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if self.ui_manager.as_ref().is_some_and(UiManager::wants_mouse) {
            return;
        }
        if let Some(scene) = self.scene.as_ref() {
            scene.controller().process_events(&event, &mut self.input);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let (Some(scene), Some(engine)) = (self.scene.take(), self.render_engine.as_mut()) {
            scene.release(engine);
            info!("Released scene meshes");
        }
    }
}
