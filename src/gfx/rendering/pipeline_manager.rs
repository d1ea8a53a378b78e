//! Shader program management with hot reload
//!
//! Every [`ProgramKind`] owns a [`ProgramSlot`]. A slot only ever changes when
//! a replacement has fully compiled, so a broken edit to a shader file leaves
//! the last working program in use.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use wgpu::{BindGroupLayout, Device, TextureFormat};

use crate::{
    error::ShaderError,
    gfx::{
        rendering::commands::{PolygonMode, ProgramKind},
        resources::texture_resource::TextureResource,
        scene::vertex::{LineVertex, Vertex3D},
    },
};

/// Fixed-function state a program's pipelines are built with
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_layout: wgpu::VertexBufferLayout<'static>,
    pub primitive_topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    pub depth_write: bool,
    pub color_target: wgpu::ColorTargetState,
}

impl PipelineConfig {
    /// Lit triangles, no culling and an opaque color target
    pub fn new(label: &str, color_format: TextureFormat) -> Self {
        Self {
            label: label.to_string(),
            bind_group_layouts: Vec::new(),
            vertex_layout: Vertex3D::desc(),
            primitive_topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth_write: true,
            color_target: wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            },
        }
    }

    /// The default config adjusted for what `kind` draws
    pub fn for_program(kind: ProgramKind, color_format: TextureFormat) -> Self {
        let config = Self::new(&format!("{kind:?}"), color_format);
        match kind {
            ProgramKind::Lit | ProgramKind::Light => config,
            ProgramKind::Axes => config
                .with_vertex_layout(LineVertex::desc())
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList),
            ProgramKind::Grid => config
                .with_depth_write(false)
                .with_blend(wgpu::BlendState::ALPHA_BLENDING),
        }
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_vertex_layout(mut self, layout: wgpu::VertexBufferLayout<'static>) -> Self {
        self.vertex_layout = layout;
        self
    }

    pub fn with_primitive_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_depth_write(mut self, enabled: bool) -> Self {
        self.depth_write = enabled;
        self
    }

    pub fn with_blend(mut self, blend: wgpu::BlendState) -> Self {
        self.color_target.blend = Some(blend);
        self
    }

    /// Line rasterization only applies to triangle topologies
    pub fn supports_wireframe(&self) -> bool {
        matches!(
            self.primitive_topology,
            wgpu::PrimitiveTopology::TriangleList | wgpu::PrimitiveTopology::TriangleStrip
        )
    }
}

/// The last successfully built value plus how many times it was replaced
#[derive(Debug)]
pub struct ProgramSlot<P> {
    current: Option<P>,
    generation: u32,
}

impl<P> Default for ProgramSlot<P> {
    fn default() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }
}

impl<P> ProgramSlot<P> {
    /// Installs the result of `build`; an error leaves the slot untouched
    pub fn replace_with<E>(&mut self, build: impl FnOnce() -> Result<P, E>) -> Result<(), E> {
        let program = build()?;
        self.current = Some(program);
        self.generation += 1;
        Ok(())
    }

    pub fn get(&self) -> Option<&P> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A compiled program: one pipeline per polygon mode
pub struct Program {
    fill: wgpu::RenderPipeline,
    line: Option<wgpu::RenderPipeline>,
}

impl Program {
    /// Falls back to the fill pipeline when no line variant exists
    pub fn pipeline(&self, mode: PolygonMode) -> &wgpu::RenderPipeline {
        match (mode, &self.line) {
            (PolygonMode::Line, Some(line)) => line,
            _ => &self.fill,
        }
    }
}

/// Source compiled in when the shader directory has no copy of a program
pub fn embedded_source(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Lit => include_str!("../../../shaders/lit.wgsl"),
        ProgramKind::Light => include_str!("../../../shaders/light.wgsl"),
        ProgramKind::Axes => include_str!("../../../shaders/axes.wgsl"),
        ProgramKind::Grid => include_str!("../../../shaders/grid.wgsl"),
    }
}

/// Statistics about the pipeline manager state
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub registered_programs: usize,
    pub compiled_programs: usize,
    pub total_reloads: u32,
    pub wireframe_supported: bool,
}

/// Compiles, caches and hot-reloads the sandbox's shader programs
pub struct PipelineManager {
    device: Arc<Device>,
    shader_dir: PathBuf,
    wireframe_supported: bool,
    configs: HashMap<ProgramKind, PipelineConfig>,
    programs: HashMap<ProgramKind, ProgramSlot<Program>>,
}

impl PipelineManager {
    /// `wireframe_supported` reports whether the device has `POLYGON_MODE_LINE`
    pub fn new(
        device: Arc<Device>,
        shader_dir: impl Into<PathBuf>,
        wireframe_supported: bool,
    ) -> Self {
        Self {
            device,
            shader_dir: shader_dir.into(),
            wireframe_supported,
            configs: HashMap::new(),
            programs: HashMap::new(),
        }
    }

    pub fn register_program(&mut self, kind: ProgramKind, config: PipelineConfig) {
        self.configs.insert(kind, config);
        self.programs.entry(kind).or_default();
    }

    pub fn source_path(&self, kind: ProgramKind) -> PathBuf {
        self.shader_dir.join(kind.file_name())
    }

    /// Startup compile from disk. A missing or broken file falls back to the
    /// embedded copy.
    pub fn load_program(&mut self, kind: ProgramKind) -> Result<(), ShaderError> {
        let path = self.source_path(kind);
        if path.is_file() {
            match read_source(&path).and_then(|source| self.install(kind, &source)) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("{e}; using the embedded {kind:?} source"),
            }
        } else {
            debug!("{} not found, using the embedded {:?} source", path.display(), kind);
        }
        self.install(kind, embedded_source(kind))
    }

    /// Recompiles `kind` from disk. On any failure the old program stays.
    pub fn reload_program(&mut self, kind: ProgramKind) -> Result<(), ShaderError> {
        let source = read_source(&self.source_path(kind))?;
        self.install(kind, &source)?;
        debug!("Recompiled {:?} from {}", kind, self.source_path(kind).display());
        Ok(())
    }

    fn install(&mut self, kind: ProgramKind, source: &str) -> Result<(), ShaderError> {
        let Some(config) = self.configs.get(&kind) else {
            return Err(ShaderError::Compile {
                program: kind,
                message: "program was never registered".to_string(),
            });
        };
        let program = Self::compile(&self.device, self.wireframe_supported, kind, config, source);
        self.programs
            .entry(kind)
            .or_default()
            .replace_with(|| program)
    }

    /// Builds the module and pipelines inside a validation error scope, so a
    /// bad shader surfaces as an error instead of a device panic.
    fn compile(
        device: &Device,
        wireframe_supported: bool,
        kind: ProgramKind,
        config: &PipelineConfig,
        source: &str,
    ) -> Result<Program, ShaderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", config.label)),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout_refs: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", config.label)),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let fill = create_pipeline(device, config, &layout, &module, wgpu::PolygonMode::Fill);
        let line = (wireframe_supported && config.supports_wireframe())
            .then(|| create_pipeline(device, config, &layout, &module, wgpu::PolygonMode::Line));

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Compile {
                program: kind,
                message: error.to_string(),
            });
        }

        Ok(Program { fill, line })
    }

    pub fn pipeline(&self, kind: ProgramKind, mode: PolygonMode) -> Option<&wgpu::RenderPipeline> {
        self.programs
            .get(&kind)
            .and_then(ProgramSlot::get)
            .map(|program| program.pipeline(mode))
    }

    pub fn has_program(&self, kind: ProgramKind) -> bool {
        self.programs
            .get(&kind)
            .is_some_and(|slot| slot.get().is_some())
    }

    pub fn wireframe_supported(&self) -> bool {
        self.wireframe_supported
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            registered_programs: self.configs.len(),
            compiled_programs: self
                .programs
                .values()
                .filter(|s| s.get().is_some())
                .count(),
            total_reloads: self
                .programs
                .values()
                .map(|s| s.generation().saturating_sub(1))
                .sum(),
            wireframe_supported: self.wireframe_supported,
        }
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_pipeline(
    device: &Device,
    config: &PipelineConfig,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let label = format!("{} Pipeline ({:?})", config.label, polygon_mode);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: std::slice::from_ref(&config.vertex_layout),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(config.color_target.clone())],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: config.primitive_topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: config.cull_mode,
            polygon_mode,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: TextureResource::DEPTH_FORMAT,
            depth_write_enabled: config.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_keeps_program_on_failure() {
        let mut slot: ProgramSlot<&str> = ProgramSlot::default();
        assert!(slot.get().is_none());

        slot.replace_with(|| Ok::<_, String>("v1")).unwrap();
        assert_eq!(slot.get(), Some(&"v1"));

        let result = slot.replace_with(|| Err::<&str, _>("syntax error".to_string()));
        assert_eq!(result, Err("syntax error".to_string()));
        assert_eq!(slot.get(), Some(&"v1"));
        assert_eq!(slot.generation(), 1);

        slot.replace_with(|| Ok::<_, String>("v2")).unwrap();
        assert_eq!(slot.get(), Some(&"v2"));
        assert_eq!(slot.generation(), 2);
    }

    #[test]
    fn test_program_configs() {
        let format = TextureFormat::Bgra8Unorm;
        let axes = PipelineConfig::for_program(ProgramKind::Axes, format);
        assert_eq!(axes.primitive_topology, wgpu::PrimitiveTopology::LineList);
        assert!(!axes.supports_wireframe());
        assert_eq!(axes.vertex_layout.array_stride, std::mem::size_of::<LineVertex>() as u64);

        let grid = PipelineConfig::for_program(ProgramKind::Grid, format);
        assert_eq!(grid.color_target.blend, Some(wgpu::BlendState::ALPHA_BLENDING));
        assert!(!grid.depth_write);

        let lit = PipelineConfig::for_program(ProgramKind::Lit, format);
        assert!(lit.supports_wireframe());
        assert!(lit.depth_write);
    }

    #[test]
    fn test_embedded_sources_define_entry_points() {
        for kind in ProgramKind::ALL {
            let source = embedded_source(kind);
            assert!(source.contains("fn vs_main"), "{kind:?}");
            assert!(source.contains("fn fs_main"), "{kind:?}");
        }
    }
}
