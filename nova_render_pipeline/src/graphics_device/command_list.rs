/// CommandList trait - per-frame command recording
///
/// One command list carries all pass submissions of one frame, recorded in
/// the exact order the orchestrator emits them. The backend may execute GPU
/// work asynchronously; resource-state transitions are ordering hints, not
/// synchronous waits.

use std::sync::Arc;

use glam::{Mat4, Vec4};

use crate::error::Result;
use crate::graphics_device::{
    ConstBuffer, GpuBuffer, ResourceState, Shader, ShaderArgument, ShaderTable,
    ShaderTableUpdate, Swapchain, Texture,
};

// ===== GEOMETRY OF A PASS =====

/// Viewport rectangle with depth range
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering the full target
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Sub-viewport of the given size anchored at the upper-left corner,
    /// offset by (offset_x, offset_y). Used for debug overlays.
    pub fn shrink_to_upper_left(&self, width: u32, height: u32, offset_x: u32, offset_y: u32) -> Self {
        Self {
            x: self.x + offset_x as f32,
            y: self.y + offset_y as f32,
            width: width as f32,
            height: height as f32,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
        }
    }
}

/// 2D scissor rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    /// Rectangle covering the full target
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Sub-rectangle of the given size anchored at the upper-left corner,
    /// offset by (offset_x, offset_y)
    pub fn shrink_to_upper_left(&self, width: u32, height: u32, offset_x: u32, offset_y: u32) -> Self {
        Self {
            x: self.x + offset_x as i32,
            y: self.y + offset_y as i32,
            width,
            height,
        }
    }
}

// ===== COMMAND PAYLOADS =====

/// A typed constant-buffer field value
#[derive(Debug, Clone, Copy)]
pub enum ConstValue {
    Float4(Vec4),
    Float4x4(Mat4),
}

/// Render-pass begin parameters: target set, clear flags, rectangles
#[derive(Clone)]
pub struct RenderPassDesc {
    /// Color targets bound for the pass, in order
    pub render_targets: Vec<Arc<dyn Texture>>,
    /// Optional depth-stencil target
    pub depth_stencil: Option<Arc<dyn Texture>>,
    /// Clear all color targets on begin
    pub clear_render_targets: bool,
    /// Clear the depth-stencil target on begin
    pub clear_depth_stencil: bool,
    /// Viewport rectangle
    pub viewport: Viewport,
    /// Scissor rectangle
    pub area: Rect2D,
}

/// One draw inside a render pass
#[derive(Clone)]
pub struct DrawCommand {
    /// Raster shader to draw with
    pub shader: Arc<dyn Shader>,
    /// Vertex buffer; None for full-screen draws generated in the shader
    pub vertex_buffer: Option<Arc<dyn GpuBuffer>>,
    /// Index buffer; None for non-indexed draws
    pub index_buffer: Option<Arc<dyn GpuBuffer>>,
    /// Shader arguments, one per binding space
    pub arguments: Vec<Arc<dyn ShaderArgument>>,
}

/// One full-screen compute dispatch
#[derive(Clone)]
pub struct DispatchCommand {
    /// Compute shader to dispatch
    pub shader: Arc<dyn Shader>,
    /// Shader arguments, one per binding space
    pub arguments: Vec<Arc<dyn ShaderArgument>>,
    /// Thread-group counts (x, y, z)
    pub group_count: (u32, u32, u32),
}

/// One ray-trace dispatch sized to a viewport
#[derive(Clone)]
pub struct RayTraceCommand {
    /// Ray-trace shader to dispatch
    pub shader: Arc<dyn Shader>,
    /// Shader table resolving per-instance hit groups
    pub shader_table: Arc<dyn ShaderTable>,
    /// Global shader arguments
    pub arguments: Vec<Arc<dyn ShaderArgument>>,
    /// Ray grid width in pixels
    pub width: u32,
    /// Ray grid height in pixels
    pub height: u32,
}

// ===== COMMAND LIST TRAIT =====

/// Command list for recording one frame's passes
///
/// Implemented by backend-specific command lists. `present` submits the
/// recorded work and queues the swapchain flip; no other method observes
/// GPU completion.
pub trait CommandList: Send + Sync {
    /// Declare that a resource's usage role changes before its next use
    fn transition(&mut self, texture: &Arc<dyn Texture>, state: ResourceState) -> Result<()>;

    /// Order writes to a writable resource before subsequent reads/writes
    /// of the same resource within the same state
    fn uav_barrier(&mut self, texture: &Arc<dyn Texture>) -> Result<()>;

    /// Write one field of one element of a constant buffer
    fn update_const_buffer(
        &mut self,
        buffer: &Arc<dyn ConstBuffer>,
        element: u64,
        field: u64,
        value: ConstValue,
    ) -> Result<()>;

    /// Rewrite one hit-group entry of a shader table
    fn update_shader_table(&mut self, update: &ShaderTableUpdate) -> Result<()>;

    /// Begin a render pass (target set, clear flags, rectangles)
    fn begin_render_pass(&mut self, desc: &RenderPassDesc) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Draw with a bound raster shader inside the current render pass
    fn draw(&mut self, cmd: &DrawCommand) -> Result<()>;

    /// Dispatch a compute shader
    fn dispatch(&mut self, cmd: &DispatchCommand) -> Result<()>;

    /// Dispatch a ray-trace invocation
    fn trace_rays(&mut self, cmd: &RayTraceCommand) -> Result<()>;

    /// Clear a texture to a constant color over the given area
    fn clear_texture(&mut self, texture: &Arc<dyn Texture>, color: Vec4, area: Rect2D) -> Result<()>;

    /// Submit all recorded work and present the swapchain
    ///
    /// # Arguments
    ///
    /// * `swapchain` - Swapchain whose current back-buffer is presented
    /// * `vsync` - Whether to wait for vertical sync
    fn present(&mut self, swapchain: &Arc<dyn Swapchain>, vsync: bool) -> Result<()>;
}
