// src/ui/manager.rs
//! ImGui integration for the sandbox
//!
//! Handles the ImGui context, winit input forwarding, frame timing and the
//! overlay render pass drawn over the 3D scene.

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use log::warn;
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::Window,
};

use crate::gfx::rendering::render_engine::{FrameOverlay, OverlayTarget};

/// ImGui UI manager
///
/// Owns the ImGui context, platform integration and the wgpu renderer. Input
/// the UI wants is reported back so the camera does not react to it.
pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// Creates a new UI manager with a dark theme and locked DPI scaling
    ///
    /// # Arguments
    /// * `device` - WGPU device for creating renderer resources
    /// * `queue` - WGPU queue for renderer operations
    /// * `output_color_format` - Surface format the overlay is drawn into
    /// * `window` - Window for platform integration
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: 16.0,
                ..Default::default()
            }),
        }]);

        let style = context.style_mut();
        style.use_dark_colors();
        style.window_rounding = 6.0;
        style.frame_rounding = 3.0;

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Keeps ImGui's display size in step with the surface
    ///
    /// # Arguments
    /// * `width` - New display width in pixels
    /// * `height` - New display height in pixels
    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Handles input events and returns whether UI captured them
    ///
    /// Only pointer, keyboard and focus events reach ImGui.
    ///
    /// # Arguments
    /// * `window` - Window reference for platform integration
    /// * `event` - Input event to process
    ///
    /// # Returns
    /// True if UI captured the input, false otherwise
    pub fn handle_input<T>(&mut self, window: &Window, event: &Event<T>) -> bool {
        match event {
            Event::WindowEvent {
                event: window_event,
                ..
            } => match window_event {
                WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::Focused(_) => {
                    self.platform.handle_event(self.context.io_mut(), window, event);

                    let io = self.context.io();
                    io.want_capture_mouse || io.want_capture_keyboard
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether the UI currently wants mouse input for itself
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    /// ImGui's smoothed frame time in milliseconds
    pub fn frame_ms(&self) -> f32 {
        let framerate = self.context.io().framerate;
        if framerate > 0.0 {
            1000.0 / framerate
        } else {
            0.0
        }
    }

    /// Starts a UI frame and builds its widgets
    ///
    /// The frame stays open until the overlay is drawn or discarded at the
    /// end of the render frame.
    ///
    /// # Arguments
    /// * `window` - Window reference for platform operations
    /// * `run_ui` - Callback function that builds the UI
    ///
    /// # Returns
    /// True if UI wants to capture input this frame
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            warn!("Failed to prepare UI frame: {e}");
        }

        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }

        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Draws the UI built by the last `update_logic` over `color_attachment`
    ///
    /// # Arguments
    /// * `device` - WGPU device for renderer operations
    /// * `queue` - WGPU queue for buffer uploads
    /// * `encoder` - Command encoder the overlay pass is recorded into
    /// * `color_attachment` - Target view, already holding the 3D scene
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) {
        let draw_data = self.context.render();

        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    // Keep the 3D scene underneath
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self.renderer.render(draw_data, queue, device, &mut render_pass) {
            warn!("Failed to render UI: {e}");
        }
    }

    /// Ends the open UI frame without drawing it, for frames the surface dropped
    pub fn discard_frame(&mut self) {
        self.context.render();
    }
}

impl FrameOverlay for UiManager {
    fn draw(&mut self, target: OverlayTarget<'_>) {
        self.render_display_only(target.device, target.queue, target.encoder, target.view);
    }

    fn discard(&mut self) {
        self.discard_frame();
    }
}
