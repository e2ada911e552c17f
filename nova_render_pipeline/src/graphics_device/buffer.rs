/// Constant buffers, geometry buffers, and their descriptors

use std::sync::Arc;

// ===== CONSTANT BUFFERS =====

/// Data type of one field in a constant-buffer element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDataType {
    /// 4-component float vector (16 bytes)
    Float4,
    /// 4x4 float matrix (64 bytes)
    Float4x4,
}

impl ShaderDataType {
    /// Size of this field in bytes
    pub fn byte_size(&self) -> u64 {
        match self {
            ShaderDataType::Float4 => 16,
            ShaderDataType::Float4x4 => 64,
        }
    }
}

/// Field layout of one constant-buffer element.
///
/// A constant buffer holds `element_count` elements of this layout;
/// per-element indexing lets one buffer serve all models (or materials,
/// or light slots) of a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstBufferLayout {
    fields: Vec<ShaderDataType>,
}

impl ConstBufferLayout {
    /// Create a layout from an ordered field list
    pub fn new(fields: impl Into<Vec<ShaderDataType>>) -> Self {
        Self { fields: fields.into() }
    }

    /// Ordered fields of one element
    pub fn fields(&self) -> &[ShaderDataType] {
        &self.fields
    }

    /// Number of fields in one element
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Size of one element in bytes
    pub fn element_byte_size(&self) -> u64 {
        self.fields.iter().map(ShaderDataType::byte_size).sum()
    }
}

/// Constant buffer resource trait
///
/// Implemented by backend-specific buffer types. Updated per element/field
/// through [`CommandList::update_const_buffer`](crate::graphics_device::CommandList::update_const_buffer).
pub trait ConstBuffer: Send + Sync {
    /// Field layout of one element
    fn layout(&self) -> &ConstBufferLayout;

    /// Number of elements in the buffer
    fn element_count(&self) -> u64;

    /// Debug name assigned at creation time
    fn name(&self) -> &str;
}

// ===== GEOMETRY BUFFERS =====

/// Index element width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// CPU-side geometry payload consumed at scene registration.
///
/// Vertex and index bytes are opaque to the pipeline; the backend uploads
/// them and (for ray tracing) builds the bottom-level structure from them.
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Raw vertex bytes
    pub vertex_data: Vec<u8>,
    /// Stride of one vertex in bytes
    pub vertex_stride: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// Raw index bytes
    pub index_data: Vec<u8>,
    /// Index element width
    pub index_type: IndexType,
    /// Number of indices
    pub index_count: u32,
}

/// Generic GPU buffer trait (vertex, index, or bottom-level structure)
pub trait GpuBuffer: Send + Sync {
    /// Debug name assigned at creation time
    fn name(&self) -> &str;
}

/// GPU-resident buffers of one geometry: vertex + index data plus the
/// bottom-level acceleration structure built over them.
#[derive(Clone)]
pub struct GeometryBuffers {
    pub vertex_buffer: Arc<dyn GpuBuffer>,
    pub index_buffer: Arc<dyn GpuBuffer>,
    pub blas_buffer: Arc<dyn GpuBuffer>,
}
