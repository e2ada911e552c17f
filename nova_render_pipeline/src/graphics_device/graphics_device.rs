/// GraphicsDevice trait - central factory interface for GPU resources
///
/// Implemented by backend-specific devices (Vulkan, D3D12) in plugin
/// crates; the pipeline consumes the trait only. A mock implementation for
/// tests lives in [`mock_graphics_device`](crate::graphics_device::mock_graphics_device).

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    AccelInstanceDesc, AccelerationStructure, CommandList, ConstBuffer, ConstBufferLayout,
    GeometryBuffers, GeometryData, ResourceState, Shader, ShaderArgument, ShaderArgumentValue,
    ShaderDesc, ShaderTable, Texture, TextureDesc,
};

/// Opaque identifier of a presentable output surface.
///
/// Window creation and event glue live outside the pipeline; the caller
/// passes whatever surface token its platform layer issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Swapchain for presenting rendered images to an output surface
pub trait Swapchain: Send + Sync {
    /// Width of the swapchain images in pixels
    fn width(&self) -> u32;

    /// Height of the swapchain images in pixels
    fn height(&self) -> u32;

    /// Number of images in the swapchain
    fn image_count(&self) -> usize;
}

/// Main graphics device trait
///
/// All creation calls are one-shot: on failure the requested object does
/// not exist and the error is fatal for the operation that needed it.
pub trait GraphicsDevice: Send + Sync {
    /// Create a 2-D texture in the given initial resource state
    fn create_texture_2d(
        &mut self,
        desc: TextureDesc,
        initial_state: ResourceState,
        name: &str,
    ) -> Result<Arc<dyn Texture>>;

    /// Create a constant buffer of `element_count` elements of `layout`
    fn create_const_buffer(
        &mut self,
        layout: ConstBufferLayout,
        element_count: u64,
        name: &str,
    ) -> Result<Arc<dyn ConstBuffer>>;

    /// Upload one geometry and build its bottom-level structure
    fn create_geometry_buffers(
        &mut self,
        geometry: &GeometryData,
        name: &str,
    ) -> Result<GeometryBuffers>;

    /// Create a shader program from its name and binding-layout descriptor
    fn create_shader(&mut self, name: &str, desc: &ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create an immutable binding object over the given resource set
    fn create_shader_argument(
        &mut self,
        value: &ShaderArgumentValue,
    ) -> Result<Arc<dyn ShaderArgument>>;

    /// Build a top-level acceleration structure over the given instances
    fn create_acceleration_structure(
        &mut self,
        instances: &[AccelInstanceDesc],
    ) -> Result<Arc<dyn AccelerationStructure>>;

    /// Create a shader table with one hit-group entry per instance
    fn create_shader_table(
        &mut self,
        entry_count: u64,
        shader: &Arc<dyn Shader>,
    ) -> Result<Arc<dyn ShaderTable>>;

    /// Create a swapchain on an output surface
    fn create_swapchain(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
        image_count: u32,
    ) -> Result<Arc<dyn Swapchain>>;

    /// Fetch the back-buffer the swapchain will present next
    fn fetch_swapchain_buffer(&mut self, swapchain: &Arc<dyn Swapchain>) -> Result<Arc<dyn Texture>>;

    /// Whether clip-space depth is normalized to [0,1] (as opposed to
    /// [-1,1]); selects which projection variant the pipeline caches
    fn is_depth_range_01(&self) -> bool;

    /// Create a command list for recording one frame
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;
}
