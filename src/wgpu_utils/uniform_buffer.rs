// src/wgpu_utils/uniform_buffer.rs
use std::{marker::PhantomData, num::NonZeroU64};

/// Rounds `size` up to the next multiple of `alignment` (a power of two)
pub fn align_up(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// CPU staging area for many copies of one uniform block, each at an aligned offset
pub struct UniformArena<Content> {
    stride: u64,
    staging: Vec<u8>,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> UniformArena<Content> {
    pub fn new(alignment: u32) -> Self {
        Self {
            stride: align_up(std::mem::size_of::<Content>() as u64, alignment.max(1) as u64),
            staging: Vec::new(),
            content_type: PhantomData,
        }
    }

    /// Appends one block and returns its dynamic offset
    pub fn push(&mut self, content: &Content) -> u32 {
        let offset = self.staging.len();
        self.staging.extend_from_slice(bytemuck::bytes_of(content));
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    pub fn clear(&mut self) {
        self.staging.clear();
    }

    pub fn len(&self) -> usize {
        self.staging.len() / self.stride as usize
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn bytes(&self) -> &[u8] {
        &self.staging
    }
}

/// Uniform buffer holding an array of `Content` blocks bound with dynamic offsets
///
/// Blocks are staged with [`Self::push`] during a frame and written in one go
/// by [`Self::flush`], which grows the GPU buffer when needed.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    capacity: usize,
    arena: UniformArena<Content>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        let pos = type_name.rfind(':').unwrap_or(0);
        if pos > 0 {
            &type_name[(pos + 1)..]
        } else {
            type_name
        }
    }

    fn create_buffer(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer: {}", Self::name())),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// `alignment` is the device's `min_uniform_buffer_offset_alignment`
    pub fn new(device: &wgpu::Device, alignment: u32, capacity: usize) -> Self {
        let arena = UniformArena::new(alignment);
        let capacity = capacity.max(1);
        DynamicUniformBuffer {
            buffer: Self::create_buffer(device, arena.stride(), capacity),
            capacity,
            arena,
        }
    }

    pub fn push(&mut self, content: &Content) -> u32 {
        self.arena.push(content)
    }

    pub fn clear(&mut self) {
        self.arena.clear();
    }

    /// Uploads the staged blocks. Returns `true` if the buffer was recreated,
    /// in which case every bind group referencing it must be rebuilt.
    pub fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let mut recreated = false;
        if self.arena.len() > self.capacity {
            self.capacity = self.arena.len().next_power_of_two();
            self.buffer = Self::create_buffer(device, self.arena.stride(), self.capacity);
            recreated = true;
        }
        if !self.arena.is_empty() {
            queue.write_buffer(&self.buffer, 0, self.arena.bytes());
        }
        recreated
    }

    /// Binding covering exactly one block; the dynamic offset selects which
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: NonZeroU64::new(std::mem::size_of::<Content>() as u64),
        })
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
