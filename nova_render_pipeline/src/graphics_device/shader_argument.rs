/// Shader arguments: bundled resource bindings for one shader invocation
///
/// A ShaderArgument is an immutable set of GPU resource bindings (constant
/// buffers with per-element offsets, readable resources, writable
/// resources). It is the pipeline's abstraction over descriptor tables.
/// Immutable after creation; create a new one to change resources.

use std::sync::Arc;

use crate::graphics_device::{AccelerationStructure, ConstBuffer, GpuBuffer, Texture};

/// A readable resource bound into a shader argument
#[derive(Clone)]
pub enum ResourceRef {
    /// Sampled or loaded texture (G-buffers, depth, history)
    Texture(Arc<dyn Texture>),
    /// Structured buffer (geometry vertex/index data for hit groups)
    Buffer(Arc<dyn GpuBuffer>),
    /// Top-level acceleration structure for ray queries
    AccelerationStructure(Arc<dyn AccelerationStructure>),
}

/// Concrete resources to bundle into one shader argument.
///
/// `const_buffer_offsets[i]` selects the element of `const_buffers[i]` the
/// shader sees at binding i; this is how one scene-wide buffer serves every
/// model, material, and light slot.
#[derive(Clone, Default)]
pub struct ShaderArgumentValue {
    /// Constant buffers, in binding order
    pub const_buffers: Vec<Arc<dyn ConstBuffer>>,
    /// Element offset per constant buffer
    pub const_buffer_offsets: Vec<u64>,
    /// Readable resources, in binding order
    pub shader_resources: Vec<ResourceRef>,
    /// Writable resources, in binding order
    pub unordered_accesses: Vec<Arc<dyn Texture>>,
}

/// An immutable set of GPU resource bindings.
///
/// Implemented by backend-specific binding objects. Creation is the
/// dominant per-frame allocation cost in a naive design, which is why the
/// pipeline caches these aggressively.
pub trait ShaderArgument: Send + Sync {}
