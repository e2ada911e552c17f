/// Ray-tracing backend objects: acceleration structures and shader tables

use std::sync::Arc;

use glam::Mat4;

use crate::graphics_device::{GpuBuffer, Shader, ShaderArgument};

/// One instance of the top-level acceleration structure
#[derive(Clone)]
pub struct AccelInstanceDesc {
    /// Instance id reported to hit shaders; the pipeline keeps this equal
    /// to the model's constant-buffer slot index
    pub instance_id: u64,
    /// Bottom-level structure of the instanced geometry
    pub blas_buffer: Arc<dyn GpuBuffer>,
    /// World transform of the instance
    pub transform: Mat4,
}

/// Top-level acceleration structure trait
///
/// Backend-maintained spatial index over scene geometry instances enabling
/// ray-trace queries.
pub trait AccelerationStructure: Send + Sync {}

/// Shader table trait
///
/// Per-instance record array consumed by a ray-trace dispatch to resolve
/// hit-group bindings. Entries are (re)written through
/// [`CommandList::update_shader_table`](crate::graphics_device::CommandList::update_shader_table).
pub trait ShaderTable: Send + Sync {
    /// Number of hit-group entries
    fn entry_count(&self) -> u64;
}

/// One hit-group entry rewrite in a shader table
#[derive(Clone)]
pub struct ShaderTableUpdate {
    /// Ray-trace shader the table belongs to
    pub shader: Arc<dyn Shader>,
    /// Table being updated
    pub shader_table: Arc<dyn ShaderTable>,
    /// Entry index (equals the instance id of the model)
    pub index: u64,
    /// Arguments recorded into the entry
    pub arguments: Vec<Arc<dyn ShaderArgument>>,
}
