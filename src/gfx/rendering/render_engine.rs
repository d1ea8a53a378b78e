//! WGPU-based rendering engine for the sandbox
//!
//! [`RenderEngine`] is the GPU implementation of [`RenderBackend`]. Commands
//! are recorded as they are submitted and executed on `present`: the uniform
//! blocks of the whole frame are staged into dynamic-offset buffers, then one
//! render pass replays the draws, and the GUI overlay is composited on top.

use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;
use log::{debug, error, info, warn};
use wgpu::{util::DeviceExt, TextureFormat};

use crate::{
    error::{AssetError, RenderError, ShaderError},
    gfx::{
        resources::{
            global_bindings::{FrameUBO, FrameUniform, GlobalBindings, LightsUBO, LightsUniform},
            material::{
                InstanceBindings, InstanceUBO, InstanceUniform, MaterialBindings,
                MATERIAL_TEXTURE_SLOTS,
            },
            texture_resource::TextureResource,
        },
        scene::vertex::VertexData,
    },
};

use super::{
    commands::{MeshHandle, PolygonMode, ProgramKind, RenderBackend, RenderCommand, TextureHandle},
    pipeline_manager::{PipelineConfig, PipelineManager},
};

/// Startup options for [`RenderEngine::new`]
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub vsync: bool,
    pub shader_dir: std::path::PathBuf,
    /// Flip decoded textures so UV (0, 0) is the bottom-left corner
    pub flip_textures: bool,
}

/// Texture handles bound to the material slots for one draw
pub type MaterialSet = [Option<TextureHandle>; MATERIAL_TEXTURE_SLOTS];

/// One draw with every piece of state it needs resolved to an index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedDraw {
    pub program: ProgramKind,
    pub mode: PolygonMode,
    pub mesh: MeshHandle,
    pub frame: usize,
    pub lights: usize,
    pub instance: usize,
    /// Index into [`FramePlan::material_sets`], for programs that sample maps
    pub material: Option<usize>,
}

/// A frame's command list replayed without a GPU
///
/// Uniform uploads become entries in the block lists, bound textures are
/// grouped into distinct material sets, and every draw records which of them
/// were current when it was submitted.
#[derive(Debug, Default)]
pub struct FramePlan {
    pub clear: [f32; 3],
    /// Fill state after the frame; it persists into the next one
    pub polygon_mode: PolygonMode,
    pub frames: Vec<FrameUniform>,
    pub lights: Vec<LightsUniform>,
    pub instances: Vec<InstanceUniform>,
    pub material_sets: Vec<MaterialSet>,
    pub draws: Vec<PlannedDraw>,
    pub gui_overlay: bool,
}

impl FramePlan {
    pub fn build(commands: &[RenderCommand], polygon_mode: PolygonMode) -> Self {
        let mut plan = FramePlan {
            polygon_mode,
            ..Default::default()
        };
        let mut program = None;
        let mut slots: MaterialSet = [None; MATERIAL_TEXTURE_SLOTS];
        let mut set_index: HashMap<MaterialSet, usize> = HashMap::new();

        for command in commands {
            match command {
                RenderCommand::Clear { color } => plan.clear = *color,
                RenderCommand::SetPolygonMode(mode) => plan.polygon_mode = *mode,
                RenderCommand::UseProgram(kind) => {
                    program = Some(*kind);
                    slots = [None; MATERIAL_TEXTURE_SLOTS];
                }
                RenderCommand::UploadFrame(frame) => plan.frames.push(*frame),
                RenderCommand::UploadLights(lights) => plan.lights.push(**lights),
                RenderCommand::BindTexture(binding) => match binding.role.slot() {
                    // One sampler per role: the first map of each role fills it
                    Some(slot) if binding.counter == 1 => slots[slot] = Some(binding.texture),
                    Some(_) => debug!(
                        "{} not sampled, the slot holds the first {} map",
                        binding.name,
                        binding.role.as_str()
                    ),
                    None => debug!("{} has no sampler slot, skipped", binding.name),
                },
                RenderCommand::Draw(draw) => {
                    let Some(program) = program else {
                        debug!("draw of {:?} before any program was bound", draw.mesh);
                        continue;
                    };
                    if plan.frames.is_empty() {
                        plan.frames.push(bytemuck::Zeroable::zeroed());
                    }
                    if plan.lights.is_empty() {
                        plan.lights.push(LightsUniform::default());
                    }
                    let material = program.uses_material_textures().then(|| {
                        *set_index.entry(slots).or_insert_with(|| {
                            plan.material_sets.push(slots);
                            plan.material_sets.len() - 1
                        })
                    });
                    plan.instances.push(draw.instance);
                    plan.draws.push(PlannedDraw {
                        program,
                        mode: plan.polygon_mode,
                        mesh: draw.mesh,
                        frame: plan.frames.len() - 1,
                        lights: plan.lights.len() - 1,
                        instance: plan.instances.len() - 1,
                        material,
                    });
                }
                RenderCommand::GuiOverlay => plan.gui_overlay = true,
            }
        }
        plan
    }
}

/// GPU state an overlay records its pass with
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
}

/// Something composited over the scene at the end of a frame, such as the GUI
///
/// Every frame ends the overlay exactly once: [`FrameOverlay::draw`] when the
/// surface was acquired and the frame asked for the overlay, otherwise
/// [`FrameOverlay::discard`].
pub trait FrameOverlay {
    fn draw(&mut self, target: OverlayTarget<'_>);

    /// Closes the overlay's frame without drawing it
    fn discard(&mut self) {}
}

/// Overlay for frames presented without a GUI
struct NoOverlay;

impl FrameOverlay for NoOverlay {
    fn draw(&mut self, _target: OverlayTarget<'_>) {}
}

/// Draws or discards `overlay`; `target` is `None` when the frame was dropped
fn finish_overlay(
    plan: &FramePlan,
    target: Option<OverlayTarget<'_>>,
    overlay: &mut dyn FrameOverlay,
) {
    match target {
        Some(target) if plan.gui_overlay => overlay.draw(target),
        _ => overlay.discard(),
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
}

/// Core rendering engine managing GPU resources and draw calls
///
/// Owns the surface, the mesh and texture arenas, the uniform buffers and the
/// pipelines. Commands submitted through [`RenderBackend`] are buffered until
/// [`RenderEngine::render_frame`] replays them.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,

    frame_ubo: FrameUBO,
    lights_ubo: LightsUBO,
    instance_ubo: InstanceUBO,
    global_bindings: GlobalBindings,
    instance_bindings: InstanceBindings,
    material_bindings: MaterialBindings,

    meshes: Vec<Option<GpuMesh>>,
    textures: Vec<TextureResource>,
    fallback_texture: TextureResource,
    sampler: wgpu::Sampler,
    flip_textures: bool,

    commands: Vec<RenderCommand>,
    polygon_mode: PolygonMode,
    wireframe_warned: bool,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`
    ///
    /// Requests `POLYGON_MODE_LINE` when the adapter has it and compiles every
    /// program before returning.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `settings` - Vsync, shader directory and texture orientation
    ///
    /// # Returns
    /// A configured engine, or the first adapter, device or shader error
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        settings: &EngineSettings,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let wireframe_supported = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if wireframe_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features,
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        device.on_uncaptured_error(Box::new(|e: wgpu::Error| error!("wgpu error: {e}")));

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(settings.vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let frame_ubo = FrameUBO::new(&device, alignment, 16);
        let lights_ubo = LightsUBO::new(&device, alignment, 8);
        let instance_ubo = InstanceUBO::new(&device, alignment, 64);

        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &frame_ubo, &lights_ubo);
        let mut instance_bindings = InstanceBindings::new(&device);
        instance_bindings.create_bind_group(&device, &instance_ubo);
        let material_bindings = MaterialBindings::new(&device);

        let fallback_texture =
            TextureResource::solid_color(&device, &queue, [255; 4], "Fallback Texture");
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();

        let mut pipeline_manager =
            PipelineManager::new(device.clone(), settings.shader_dir.clone(), wireframe_supported);
        for kind in ProgramKind::ALL {
            let mut layouts = vec![
                global_bindings.bind_group_layout().clone(),
                instance_bindings.bind_group_layout().clone(),
            ];
            if kind.uses_material_textures() {
                layouts.push(material_bindings.bind_group_layout().clone());
            }
            pipeline_manager.register_program(
                kind,
                PipelineConfig::for_program(kind, format).with_bind_group_layouts(layouts),
            );
            pipeline_manager
                .load_program(kind)
                .with_context(|| format!("Failed to build the {kind:?} program"))?;
        }

        info!(
            "Render engine ready: {} ({:?}), {:?}, wireframe {}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            if wireframe_supported { "supported" } else { "unavailable" }
        );

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            frame_ubo,
            lights_ubo,
            instance_ubo,
            global_bindings,
            instance_bindings,
            material_bindings,
            meshes: Vec::new(),
            textures: Vec::new(),
            fallback_texture,
            sampler,
            flip_textures: settings.flip_textures,
            commands: Vec::new(),
            polygon_mode: PolygonMode::Fill,
            wireframe_warned: false,
        })
    }

    fn gpu_mesh(&self, handle: MeshHandle) -> Result<&GpuMesh, RenderError> {
        match self.meshes.get(handle.0 as usize) {
            None => Err(RenderError::UnknownMesh(handle)),
            Some(None) => Err(RenderError::ReleasedMesh(handle)),
            Some(Some(mesh)) => Ok(mesh),
        }
    }

    fn material_bind_group(&self, set: &MaterialSet) -> wgpu::BindGroup {
        let views = set.map(|slot| {
            slot.and_then(|handle| self.textures.get(handle.0 as usize))
                .map_or(&self.fallback_texture.view, |texture| &texture.view)
        });
        self.material_bindings.create_bind_group(&self.device, views, &self.sampler)
    }

    /// Stages the plan's uniform blocks and returns their dynamic offsets
    fn upload_uniforms(&mut self, plan: &FramePlan) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
        self.frame_ubo.clear();
        self.lights_ubo.clear();
        self.instance_ubo.clear();

        let frames = plan
            .frames
            .iter()
            .map(|f| self.frame_ubo.push(f))
            .collect();
        let lights = plan
            .lights
            .iter()
            .map(|l| self.lights_ubo.push(l))
            .collect();
        let instances = plan
            .instances
            .iter()
            .map(|i| self.instance_ubo.push(i))
            .collect();

        let frame_grown = self.frame_ubo.flush(&self.device, &self.queue);
        let lights_grown = self.lights_ubo.flush(&self.device, &self.queue);
        if frame_grown || lights_grown {
            self.global_bindings
                .create_bind_group(&self.device, &self.frame_ubo, &self.lights_ubo);
        }
        if self.instance_ubo.flush(&self.device, &self.queue) {
            self.instance_bindings.create_bind_group(&self.device, &self.instance_ubo);
        }

        (frames, lights, instances)
    }

    /// Executes the recorded frame, composites `overlay` and presents
    ///
    /// Replays the commands submitted since the last present into one render
    /// pass. A lost or outdated surface is reconfigured and the frame is
    /// dropped; the overlay is discarded in that case so its frame still ends.
    ///
    /// # Arguments
    /// * `overlay` - Drawn over the scene, usually the GUI
    pub fn render_frame(&mut self, overlay: &mut dyn FrameOverlay) {
        let commands = std::mem::take(&mut self.commands);
        let plan = FramePlan::build(&commands, self.polygon_mode);
        self.polygon_mode = plan.polygon_mode;

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                finish_overlay(&plan, None, overlay);
                return;
            }
            Err(e) => {
                warn!("Dropping frame: {e}");
                finish_overlay(&plan, None, overlay);
                return;
            }
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (frame_offsets, light_offsets, instance_offsets) = self.upload_uniforms(&plan);
        let material_groups: Vec<wgpu::BindGroup> = plan
            .material_sets
            .iter()
            .map(|set| self.material_bind_group(set))
            .collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b] = plan.clear.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some(globals), Some(instances)) =
                (self.global_bindings.bind_group(), self.instance_bindings.bind_group())
            {
                for draw in &plan.draws {
                    let Some(pipeline) = self.pipeline_manager.pipeline(draw.program, draw.mode)
                    else {
                        continue;
                    };
                    let Ok(mesh) = self.gpu_mesh(draw.mesh) else {
                        continue;
                    };

                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(
                        0,
                        globals,
                        &[frame_offsets[draw.frame], light_offsets[draw.lights]],
                    );
                    render_pass.set_bind_group(1, instances, &[instance_offsets[draw.instance]]);
                    if let Some(material) = draw.material {
                        render_pass.set_bind_group(2, &material_groups[material], &[]);
                    }

                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    match &mesh.index_buffer {
                        Some(index_buffer) => {
                            render_pass.set_index_buffer(
                                index_buffer.slice(..),
                                wgpu::IndexFormat::Uint32,
                            );
                            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                        }
                        None => render_pass.draw(0..mesh.vertex_count, 0..1),
                    }
                }
            }
        }

        let target = OverlayTarget {
            device: self.device.as_ref(),
            queue: self.queue.as_ref(),
            encoder: &mut encoder,
            view: &surface_texture_view,
        };
        finish_overlay(&plan, Some(target), overlay);

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero sizes (a minimised window) are ignored.
    ///
    /// # Arguments
    /// * `width` - New surface width in pixels
    /// * `height` - New surface height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Switches between `Fifo` (vsync) and an unsynchronised present mode
    ///
    /// # Arguments
    /// * `enable` - True to wait for the display on every present
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(&self.device, &self.config);
    }

    /// Returns the configured surface size in pixels
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Returns the wgpu device, shared with the GUI renderer
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Color format of the surface, needed by the GUI renderer
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

impl RenderBackend for RenderEngine {
    fn upload_mesh(
        &mut self,
        label: &str,
        vertices: VertexData<'_>,
        indices: &[u32],
    ) -> MeshHandle {
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: vertices.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = (!indices.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
        }));
        debug!(
            "Uploaded {label} as {handle:?}: {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );
        handle
    }

    fn release_mesh(&mut self, mesh: MeshHandle) -> Result<(), RenderError> {
        match self.meshes.get_mut(mesh.0 as usize) {
            None => Err(RenderError::UnknownMesh(mesh)),
            Some(slot) => match slot.take() {
                Some(gpu_mesh) => {
                    gpu_mesh.vertex_buffer.destroy();
                    if let Some(index_buffer) = gpu_mesh.index_buffer {
                        index_buffer.destroy();
                    }
                    Ok(())
                }
                None => Err(RenderError::ReleasedMesh(mesh)),
            },
        }
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, AssetError> {
        let texture =
            TextureResource::from_path(&self.device, &self.queue, path, self.flip_textures)?;
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        info!("Loaded texture {}", path.display());
        Ok(handle)
    }

    fn reload_program(&mut self, program: ProgramKind) -> Result<(), ShaderError> {
        self.pipeline_manager.reload_program(program)
    }

    fn submit(&mut self, command: RenderCommand) -> Result<(), RenderError> {
        match &command {
            RenderCommand::Draw(draw) => {
                self.gpu_mesh(draw.mesh)?;
            }
            RenderCommand::UseProgram(kind) if !self.pipeline_manager.has_program(*kind) => {
                return Err(RenderError::ProgramUnavailable(*kind));
            }
            RenderCommand::SetPolygonMode(PolygonMode::Line)
                if !self.pipeline_manager.wireframe_supported() && !self.wireframe_warned =>
            {
                warn!("Wireframe needs POLYGON_MODE_LINE, which this adapter lacks; filling");
                self.wireframe_warned = true;
            }
            _ => {}
        }
        self.commands.push(command);
        Ok(())
    }

    fn present(&mut self) {
        self.render_frame(&mut NoOverlay);
    }
}
