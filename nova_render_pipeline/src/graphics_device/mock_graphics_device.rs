/// Mock graphics device for unit tests (no GPU required)
///
/// Records every created resource and every recorded command as strings in
/// shared logs, so tests can count draws, dispatches, transitions, and
/// binding-object creations after the device has been moved behind
/// `Arc<Mutex<dyn GraphicsDevice>>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use glam::Vec4;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AccelInstanceDesc, AccelerationStructure, CommandList, ConstBuffer, ConstBufferLayout,
    ConstValue, DispatchCommand, DrawCommand, GeometryBuffers, GeometryData, GpuBuffer,
    GraphicsDevice, RayTraceCommand, Rect2D, RenderPassDesc, ResourceState, Shader,
    ShaderArgument, ShaderArgumentValue, ShaderDesc, ShaderKind, ShaderTable, ShaderTableUpdate,
    SurfaceId, Swapchain, Texture, TextureDesc, TextureInfo,
};

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
    pub name: String,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct MockConstBuffer {
    pub layout: ConstBufferLayout,
    pub element_count: u64,
    pub name: String,
}

impl ConstBuffer for MockConstBuffer {
    fn layout(&self) -> &ConstBufferLayout {
        &self.layout
    }

    fn element_count(&self) -> u64 {
        self.element_count
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct MockGpuBuffer {
    pub name: String,
}

impl GpuBuffer for MockGpuBuffer {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct MockShader {
    pub kind: ShaderKind,
    pub name: String,
}

impl Shader for MockShader {
    fn kind(&self) -> ShaderKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct MockShaderArgument;

impl ShaderArgument for MockShaderArgument {}

pub struct MockAccelerationStructure {
    pub instance_count: usize,
}

impl AccelerationStructure for MockAccelerationStructure {}

pub struct MockShaderTable {
    pub entry_count: u64,
}

impl ShaderTable for MockShaderTable {
    fn entry_count(&self) -> u64 {
        self.entry_count
    }
}

pub struct MockSwapchain {
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
}

impl Swapchain for MockSwapchain {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn image_count(&self) -> usize {
        self.image_count as usize
    }
}

// ============================================================================
// Mock command list
// ============================================================================

/// Command list that appends one line per recorded command to a shared log
pub struct MockCommandList {
    log: Arc<Mutex<Vec<String>>>,
}

impl MockCommandList {
    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl CommandList for MockCommandList {
    fn transition(&mut self, texture: &Arc<dyn Texture>, state: ResourceState) -> Result<()> {
        self.push(format!("transition:{}:{:?}", texture.name(), state));
        Ok(())
    }

    fn uav_barrier(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        self.push(format!("uav_barrier:{}", texture.name()));
        Ok(())
    }

    fn update_const_buffer(
        &mut self,
        buffer: &Arc<dyn ConstBuffer>,
        element: u64,
        field: u64,
        _value: ConstValue,
    ) -> Result<()> {
        self.push(format!("update_const_buffer:{}:{}:{}", buffer.name(), element, field));
        Ok(())
    }

    fn update_shader_table(&mut self, update: &ShaderTableUpdate) -> Result<()> {
        self.push(format!("update_shader_table:{}", update.index));
        Ok(())
    }

    fn begin_render_pass(&mut self, _desc: &RenderPassDesc) -> Result<()> {
        self.push("begin_render_pass".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.push("end_render_pass".to_string());
        Ok(())
    }

    fn draw(&mut self, cmd: &DrawCommand) -> Result<()> {
        self.push(format!("draw:{}", cmd.shader.name()));
        Ok(())
    }

    fn dispatch(&mut self, cmd: &DispatchCommand) -> Result<()> {
        let (x, y, z) = cmd.group_count;
        self.push(format!("dispatch:{}:{}x{}x{}", cmd.shader.name(), x, y, z));
        Ok(())
    }

    fn trace_rays(&mut self, cmd: &RayTraceCommand) -> Result<()> {
        self.push(format!("trace_rays:{}:{}x{}", cmd.shader.name(), cmd.width, cmd.height));
        Ok(())
    }

    fn clear_texture(&mut self, texture: &Arc<dyn Texture>, _color: Vec4, _area: Rect2D) -> Result<()> {
        self.push(format!("clear_texture:{}", texture.name()));
        Ok(())
    }

    fn present(&mut self, _swapchain: &Arc<dyn Swapchain>, vsync: bool) -> Result<()> {
        self.push(format!("present:vsync={}", vsync));
        Ok(())
    }
}

// ============================================================================
// Mock graphics device
// ============================================================================

/// Mock device that tracks created resources without a GPU
pub struct MockGraphicsDevice {
    /// Names of created textures
    pub created_textures: Arc<Mutex<Vec<String>>>,
    /// Names of created constant and geometry buffers
    pub created_buffers: Arc<Mutex<Vec<String>>>,
    /// Names of created shaders
    pub created_shaders: Arc<Mutex<Vec<String>>>,
    /// One summary entry per created shader argument
    pub created_shader_arguments: Arc<Mutex<Vec<String>>>,
    /// Shared command log appended to by every command list
    pub command_log: Arc<Mutex<Vec<String>>>,
    /// Back-buffers by swapchain identity
    backbuffers: HashMap<usize, Arc<dyn Texture>>,
    /// Depth-range query answer
    pub depth_range_01: bool,
    /// Force texture creation to fail (allocation-failure tests)
    pub fail_texture_creation: bool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            created_textures: Arc::new(Mutex::new(Vec::new())),
            created_buffers: Arc::new(Mutex::new(Vec::new())),
            created_shaders: Arc::new(Mutex::new(Vec::new())),
            created_shader_arguments: Arc::new(Mutex::new(Vec::new())),
            command_log: Arc::new(Mutex::new(Vec::new())),
            backbuffers: HashMap::new(),
            depth_range_01: true,
            fail_texture_creation: false,
        }
    }

    /// Device whose texture creation always fails
    pub fn failing_textures() -> Self {
        let mut device = Self::new();
        device.fail_texture_creation = true;
        device
    }

    /// Snapshot of the command log
    pub fn commands(&self) -> Vec<String> {
        self.command_log.lock().unwrap().clone()
    }

    /// Number of created shader arguments
    pub fn shader_argument_count(&self) -> usize {
        self.created_shader_arguments.lock().unwrap().len()
    }

    fn swapchain_key(swapchain: &Arc<dyn Swapchain>) -> usize {
        Arc::as_ptr(swapchain) as *const () as usize
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture_2d(
        &mut self,
        desc: TextureDesc,
        _initial_state: ResourceState,
        name: &str,
    ) -> Result<Arc<dyn Texture>> {
        if self.fail_texture_creation {
            return Err(Error::BackendAllocation(format!(
                "mock texture creation failed: {}",
                name
            )));
        }
        self.created_textures.lock().unwrap().push(name.to_string());
        Ok(Arc::new(MockTexture {
            info: TextureInfo {
                width: desc.width,
                height: desc.height,
                format: desc.format,
                usage: desc.usage,
            },
            name: name.to_string(),
        }))
    }

    fn create_const_buffer(
        &mut self,
        layout: ConstBufferLayout,
        element_count: u64,
        name: &str,
    ) -> Result<Arc<dyn ConstBuffer>> {
        self.created_buffers.lock().unwrap().push(name.to_string());
        Ok(Arc::new(MockConstBuffer {
            layout,
            element_count,
            name: name.to_string(),
        }))
    }

    fn create_geometry_buffers(
        &mut self,
        geometry: &GeometryData,
        name: &str,
    ) -> Result<GeometryBuffers> {
        self.created_buffers.lock().unwrap().push(format!(
            "{}:v{}i{}",
            name, geometry.vertex_count, geometry.index_count
        ));
        Ok(GeometryBuffers {
            vertex_buffer: Arc::new(MockGpuBuffer { name: format!("{} Vertices", name) }),
            index_buffer: Arc::new(MockGpuBuffer { name: format!("{} Indices", name) }),
            blas_buffer: Arc::new(MockGpuBuffer { name: format!("{} BLAS", name) }),
        })
    }

    fn create_shader(&mut self, name: &str, desc: &ShaderDesc) -> Result<Arc<dyn Shader>> {
        self.created_shaders.lock().unwrap().push(name.to_string());
        Ok(Arc::new(MockShader {
            kind: desc.kind(),
            name: name.to_string(),
        }))
    }

    fn create_shader_argument(
        &mut self,
        value: &ShaderArgumentValue,
    ) -> Result<Arc<dyn ShaderArgument>> {
        self.created_shader_arguments.lock().unwrap().push(format!(
            "arg:cb={},srv={},uav={}",
            value.const_buffers.len(),
            value.shader_resources.len(),
            value.unordered_accesses.len()
        ));
        Ok(Arc::new(MockShaderArgument))
    }

    fn create_acceleration_structure(
        &mut self,
        instances: &[AccelInstanceDesc],
    ) -> Result<Arc<dyn AccelerationStructure>> {
        self.created_buffers
            .lock()
            .unwrap()
            .push(format!("tlas:{}", instances.len()));
        Ok(Arc::new(MockAccelerationStructure {
            instance_count: instances.len(),
        }))
    }

    fn create_shader_table(
        &mut self,
        entry_count: u64,
        shader: &Arc<dyn Shader>,
    ) -> Result<Arc<dyn ShaderTable>> {
        self.created_buffers
            .lock()
            .unwrap()
            .push(format!("shader_table:{}:{}", shader.name(), entry_count));
        Ok(Arc::new(MockShaderTable { entry_count }))
    }

    fn create_swapchain(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
        image_count: u32,
    ) -> Result<Arc<dyn Swapchain>> {
        let swapchain: Arc<dyn Swapchain> = Arc::new(MockSwapchain {
            width,
            height,
            image_count,
        });
        let backbuffer = self.create_texture_2d(
            TextureDesc::render_target(width, height, crate::graphics_device::ResourceFormat::B8G8R8A8_UNORM),
            ResourceState::Present,
            &format!("BackBuffer (surface {})", surface.0),
        )?;
        self.backbuffers
            .insert(Self::swapchain_key(&swapchain), backbuffer);
        Ok(swapchain)
    }

    fn fetch_swapchain_buffer(&mut self, swapchain: &Arc<dyn Swapchain>) -> Result<Arc<dyn Texture>> {
        self.backbuffers
            .get(&Self::swapchain_key(swapchain))
            .cloned()
            .ok_or_else(|| Error::StateAssumption("unknown swapchain".to_string()))
    }

    fn is_depth_range_01(&self) -> bool {
        self.depth_range_01
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList {
            log: Arc::clone(&self.command_log),
        }))
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
