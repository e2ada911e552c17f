/// Declarative shader descriptors: binding-layout declarations per pass
///
/// Each pass of the pipeline declares the resources its shader expects,
/// grouped into binding spaces. The descriptors are consumed once at
/// pipeline construction to create backend shader objects; the backend
/// decides how a space maps to descriptor tables or descriptor sets.

use crate::graphics_device::ResourceFormat;

/// Resource slots of one binding space.
///
/// Counts only: the pipeline declares how many constant buffers, readable
/// resources, writable resources, and static samplers the shader binds in
/// this space. Slot order within a space follows the order of the
/// matching [`ShaderArgumentValue`](crate::graphics_device::ShaderArgumentValue) vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderParameterSpace {
    /// Number of constant-buffer bindings
    pub const_buffers: u32,
    /// Number of readable resource bindings (textures, buffers, TLAS)
    pub shader_resources: u32,
    /// Number of writable resource bindings
    pub unordered_accesses: u32,
    /// Number of immutable samplers
    pub static_samplers: u32,
}

/// Ordered binding spaces of one shader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSignature {
    /// Binding spaces; index in this vector is the space number
    pub spaces: Vec<ShaderParameterSpace>,
}

impl ShaderSignature {
    /// Signature with the given spaces
    pub fn new(spaces: impl Into<Vec<ShaderParameterSpace>>) -> Self {
        Self { spaces: spaces.into() }
    }
}

/// Descriptor for a rasterization shader
#[derive(Debug, Clone)]
pub struct RasterShaderDesc {
    /// Binding layout
    pub signature: ShaderSignature,
    /// Formats of the render targets written by the pixel stage, in order
    pub render_target_formats: Vec<ResourceFormat>,
    /// Whether the depth-stencil stage is active
    pub depth_stencil_enabled: bool,
}

/// Descriptor for a compute shader
#[derive(Debug, Clone)]
pub struct ComputeShaderDesc {
    /// Binding layout
    pub signature: ShaderSignature,
}

/// Descriptor for a ray-tracing shader
#[derive(Debug, Clone)]
pub struct RayTraceShaderDesc {
    /// Binding layout shared by all ray-trace stages of a dispatch
    pub global_signature: ShaderSignature,
    /// Binding layout of one hit-group shader-table entry
    pub hitgroup_signature: ShaderSignature,
    /// Ray-generation entry point name
    pub raygen_name: String,
    /// Miss entry point name
    pub miss_name: String,
    /// Closest-hit entry point name
    pub closest_hit_name: String,
    /// Hit-group name referenced by shader-table entries
    pub hitgroup_name: String,
}

/// Pass kind a shader object was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Raster,
    Compute,
    RayTrace,
}

/// Tagged shader descriptor.
///
/// The orchestrator dispatches on the tag; there is no virtual descriptor
/// hierarchy.
#[derive(Debug, Clone)]
pub enum ShaderDesc {
    Raster(RasterShaderDesc),
    Compute(ComputeShaderDesc),
    RayTrace(RayTraceShaderDesc),
}

impl ShaderDesc {
    /// Pass kind of this descriptor
    pub fn kind(&self) -> ShaderKind {
        match self {
            ShaderDesc::Raster(_) => ShaderKind::Raster,
            ShaderDesc::Compute(_) => ShaderKind::Compute,
            ShaderDesc::RayTrace(_) => ShaderKind::RayTrace,
        }
    }
}

/// Shader program trait
///
/// Implemented by backend-specific shader objects. Program compilation and
/// binary loading happen behind the backend; the pipeline identifies a
/// program by name and binding layout only.
pub trait Shader: Send + Sync {
    /// Pass kind this shader was created for
    fn kind(&self) -> ShaderKind;

    /// Program name assigned at creation time
    fn name(&self) -> &str;
}
