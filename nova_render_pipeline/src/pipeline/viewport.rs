/// Per-viewport state: output surface, G-buffer targets, temporal history.
///
/// All GPU sub-resources are allocated at registration time, sized to the
/// viewport's fixed dimensions. The orchestrator mutates the transform
/// cache and frame counter each frame; everything else is immutable after
/// creation.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3, Vec4};
use slotmap::new_key_type;

use crate::error::Result;
use crate::graphics_device::{
    ConstBuffer, ConstBufferLayout, GraphicsDevice, ResourceFormat, ResourceState, ResourceRef,
    ShaderArgument, ShaderArgumentValue, ShaderDataType, SurfaceId, Swapchain, Texture,
    TextureDesc,
};

new_key_type! {
    /// Stable handle for a registered viewport.
    ///
    /// Remains valid until the viewport is unregistered; other viewports
    /// coming and going never invalidate it.
    pub struct ViewportHandle;
}

/// Registration parameters for a viewport
#[derive(Debug, Clone)]
pub struct ViewportConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Output surface to present into
    pub surface: SurfaceId,
}

// ===== FRAME COUNTER =====

/// Advance an 8-bit frame counter, skipping the reserved sentinel.
///
/// 0 means "no history yet" and is only ever the pre-first-frame value;
/// wrapping from 255 lands on 2 so the parity alternation of consecutive
/// live frames is unbroken (255 is odd, 2 is even).
pub(crate) fn next_frame_id(frame_id: u8) -> u8 {
    let next = frame_id.wrapping_add(1);
    if next == 0 {
        2
    } else {
        next
    }
}

// ===== JITTER =====

/// Van der Corput radical inverse of `index` in the given base
fn halton(base: u32, index: u32) -> f32 {
    let inv_base = 1.0 / base as f32;
    let mut result = 0.0;
    let mut fraction = inv_base;
    let mut i = index;
    while i != 0 {
        result += (i % base) as f32 * fraction;
        i /= base;
        fraction *= inv_base;
    }
    result
}

/// Sub-pixel jitter offset for a frame index, in normalized device
/// coordinates. The two axes use independent radix-2 / radix-3 sequences;
/// each component stays within one pixel's extent.
pub fn jitter_offset(frame_id: u8, width: u32, height: u32) -> Vec2 {
    let rnd_x = halton(2, frame_id as u32);
    let rnd_y = halton(3, frame_id as u32);
    Vec2::new(
        (rnd_x * 2.0 - 1.0) / width as f32,
        (rnd_y * 2.0 - 1.0) / height as f32,
    )
}

// ===== VIEWPORT STATE =====

/// GPU resources and temporal state of one registered viewport
pub struct ViewportState {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) swapchain: Arc<dyn Swapchain>,

    pub(crate) depth_stencil: Arc<dyn Texture>,
    pub(crate) gbuffer_normal: Arc<dyn Texture>,
    pub(crate) gbuffer_albedo: Arc<dyn Texture>,
    pub(crate) gbuffer_emissive: Arc<dyn Texture>,
    pub(crate) raytrace_output: Arc<dyn Texture>,
    pub(crate) shading_output: Arc<dyn Texture>,
    pub(crate) area_light_unshadowed: Arc<dyn Texture>,
    pub(crate) taa_history: [Arc<dyn Texture>; 2],
    pub(crate) taa_cb: Arc<dyn ConstBuffer>,

    // Fixed binding objects, created once at registration
    pub(crate) base_shading_arg: Arc<dyn ShaderArgument>,
    pub(crate) direct_lighting_arg: Arc<dyn ShaderArgument>,
    pub(crate) area_lighting_arg: Arc<dyn ShaderArgument>,
    pub(crate) taa_arguments: [Arc<dyn ShaderArgument>; 2],
    pub(crate) blit_present_arg: Arc<dyn ShaderArgument>,
    pub(crate) blit_area_debug_arg: Arc<dyn ShaderArgument>,

    // Camera transform cache
    pub(crate) cam_pos: Vec4,
    pub(crate) view_proj: Mat4,
    pub(crate) view_proj_inv: Mat4,

    /// 0 = no frame rendered yet ("no history" sentinel)
    pub(crate) frame_id: u8,
    /// Whether the view transform changed since the last frame
    pub(crate) view_dirty: bool,
}

impl ViewportState {
    /// Allocate every fixed-size sub-resource and binding object for one
    /// viewport. Any backend failure aborts the whole registration; the
    /// partially created resources are released on drop and never become
    /// reachable.
    pub(crate) fn create(
        device: &mut dyn GraphicsDevice,
        per_render_cb: &Arc<dyn ConstBuffer>,
        config: &ViewportConfig,
    ) -> Result<Self> {
        let (width, height) = (config.width, config.height);

        let swapchain = device.create_swapchain(config.surface, width, height, 2)?;

        let depth_stencil = device.create_texture_2d(
            TextureDesc::depth_stencil(width, height),
            ResourceState::DepthWrite,
            "Depth Stencil",
        )?;
        let gbuffer_normal = device.create_texture_2d(
            TextureDesc::render_target(width, height, ResourceFormat::R32G32B32A32_FLOAT),
            ResourceState::RenderTarget,
            "Normal Buffer",
        )?;
        let gbuffer_albedo = device.create_texture_2d(
            TextureDesc::render_target(width, height, ResourceFormat::B8G8R8A8_UNORM),
            ResourceState::RenderTarget,
            "Albedo Buffer",
        )?;
        let gbuffer_emissive = device.create_texture_2d(
            TextureDesc::render_target(width, height, ResourceFormat::R32G32B32A32_FLOAT),
            ResourceState::RenderTarget,
            "Emissive Buffer",
        )?;
        let raytrace_output = device.create_texture_2d(
            TextureDesc::unordered_access(width, height, ResourceFormat::R32G32B32A32_FLOAT),
            ResourceState::UnorderedAccess,
            "Raytracing Output Buffer",
        )?;
        let shading_output = device.create_texture_2d(
            TextureDesc::unordered_access(width, height, ResourceFormat::R32G32B32A32_FLOAT),
            ResourceState::UnorderedAccess,
            "Deferred Shading Output",
        )?;
        let area_light_unshadowed = device.create_texture_2d(
            TextureDesc::unordered_access(width, height, ResourceFormat::R32G32B32A32_FLOAT),
            ResourceState::UnorderedAccess,
            "Area Light Unshadowed",
        )?;
        let taa_history = [
            device.create_texture_2d(
                TextureDesc::unordered_access(width, height, ResourceFormat::R32G32B32A32_FLOAT),
                ResourceState::UnorderedAccess,
                "TAA Buffer[0]",
            )?,
            device.create_texture_2d(
                TextureDesc::unordered_access(width, height, ResourceFormat::R32G32B32A32_FLOAT),
                ResourceState::UnorderedAccess,
                "TAA Buffer[1]",
            )?,
        ];
        let taa_cb = device.create_const_buffer(
            ConstBufferLayout::new(vec![ShaderDataType::Float4]),
            1,
            "TAA CB",
        )?;

        // Base shading: writes the freshly initialized accumulation buffer
        let base_shading_arg = device.create_shader_argument(&ShaderArgumentValue {
            unordered_accesses: vec![Arc::clone(&shading_output)],
            ..Default::default()
        })?;

        // Lighting inputs: depth + G-buffers readable, one accumulation
        // target writable, per-render constants at element 0
        let lighting_inputs = |target: &Arc<dyn Texture>| ShaderArgumentValue {
            const_buffers: vec![Arc::clone(per_render_cb)],
            const_buffer_offsets: vec![0],
            shader_resources: vec![
                ResourceRef::Texture(Arc::clone(&depth_stencil)),
                ResourceRef::Texture(Arc::clone(&gbuffer_normal)),
                ResourceRef::Texture(Arc::clone(&gbuffer_albedo)),
                ResourceRef::Texture(Arc::clone(&gbuffer_emissive)),
            ],
            unordered_accesses: vec![Arc::clone(target)],
        };
        let direct_lighting_arg = device.create_shader_argument(&lighting_inputs(&shading_output))?;
        let area_lighting_arg =
            device.create_shader_argument(&lighting_inputs(&area_light_unshadowed))?;

        // TAA ping-pong: two precomputed arguments, selected by frame parity
        let make_taa_argument = |device: &mut dyn GraphicsDevice, input: usize, output: usize| {
            device.create_shader_argument(&ShaderArgumentValue {
                const_buffers: vec![Arc::clone(&taa_cb)],
                const_buffer_offsets: vec![0],
                shader_resources: vec![
                    ResourceRef::Texture(Arc::clone(&taa_history[input])),
                    ResourceRef::Texture(Arc::clone(&shading_output)),
                ],
                unordered_accesses: vec![
                    Arc::clone(&taa_history[output]),
                    Arc::clone(&shading_output),
                ],
            })
        };
        let taa_arguments = [
            make_taa_argument(&mut *device, 0, 1)?,
            make_taa_argument(&mut *device, 1, 0)?,
        ];

        let make_blit_arg = |device: &mut dyn GraphicsDevice, source: &Arc<dyn Texture>| {
            device.create_shader_argument(&ShaderArgumentValue {
                shader_resources: vec![ResourceRef::Texture(Arc::clone(source))],
                ..Default::default()
            })
        };
        let blit_present_arg = make_blit_arg(&mut *device, &shading_output)?;
        let blit_area_debug_arg = make_blit_arg(&mut *device, &area_light_unshadowed)?;

        Ok(Self {
            width,
            height,
            swapchain,
            depth_stencil,
            gbuffer_normal,
            gbuffer_albedo,
            gbuffer_emissive,
            raytrace_output,
            shading_output,
            area_light_unshadowed,
            taa_history,
            taa_cb,
            base_shading_arg,
            direct_lighting_arg,
            area_lighting_arg,
            taa_arguments,
            blit_present_arg,
            blit_area_debug_arg,
            cam_pos: Vec4::new(0.0, 1.0, 8.0, 1.0),
            view_proj: Mat4::IDENTITY,
            view_proj_inv: Mat4::IDENTITY,
            frame_id: 0,
            view_dirty: true,
        })
    }

    /// Cache a new camera transform.
    ///
    /// With `accumulate` off, the view counts as changed every frame; with
    /// it on, only a transform that actually differs (nonzero difference
    /// norm) restarts accumulation.
    pub(crate) fn apply_camera(&mut self, view_proj: Mat4, cam_pos: Vec4, accumulate: bool) {
        self.cam_pos = cam_pos;
        let diff = view_proj - self.view_proj;
        let norm2: f32 = diff.to_cols_array().iter().map(|v| v * v).sum();
        if !accumulate || norm2 > 0.0 {
            self.view_dirty = true;
            self.view_proj = view_proj;
            self.view_proj_inv = view_proj.inverse();
        }
    }

    /// View-projection with the sub-pixel jitter translation applied.
    ///
    /// The cached (un-jittered) matrix stays available for consumers that
    /// need a stable projection, such as the ray-trace pass.
    pub(crate) fn jittered_view_proj(&self) -> Mat4 {
        let offset = jitter_offset(self.frame_id, self.width, self.height);
        Mat4::from_translation(Vec3::new(offset.x, offset.y, 0.0)) * self.view_proj
    }

    /// History buffer read by this frame's TAA dispatch
    pub(crate) fn taa_input(&self) -> &Arc<dyn Texture> {
        &self.taa_history[(self.frame_id % 2) as usize]
    }

    /// History buffer written by this frame's TAA dispatch
    pub(crate) fn taa_output(&self) -> &Arc<dyn Texture> {
        &self.taa_history[(self.frame_id.wrapping_add(1) % 2) as usize]
    }

    /// Precomputed TAA argument matching this frame's ping-pong selection
    pub(crate) fn taa_argument(&self) -> &Arc<dyn ShaderArgument> {
        &self.taa_arguments[(self.frame_id % 2) as usize]
    }

    /// Advance the frame counter and reset the dirty mark. Called once at
    /// the end of every rendered frame.
    pub(crate) fn advance_frame(&mut self) {
        self.frame_id = next_frame_id(self.frame_id);
        self.view_dirty = false;
    }
}

#[cfg(test)]
#[path = "viewport_tests.rs"]
mod tests;
