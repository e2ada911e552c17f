/// HybridPipeline — the multi-pass frame orchestrator.
///
/// Owns the registries of viewports and scenes, the seven pass shaders,
/// and the per-render constant buffer. `render()` records one frame's
/// pass sequence into a single command list: G-buffer rasterization,
/// optional ray-traced multi-bounce GI, per-light deferred lighting,
/// temporal anti-aliasing, and the present composite.

use std::sync::{Arc, Mutex};

use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::camera::Camera;
use crate::error::Result;
use crate::graphics_device::{
    ConstBuffer, ConstBufferLayout, ConstValue, DispatchCommand, DrawCommand, GraphicsDevice,
    RayTraceCommand, Rect2D, RenderPassDesc, ResourceRef, ResourceState, Shader, ShaderArgument,
    ShaderArgumentValue, ShaderDataType, ShaderTableUpdate, Viewport,
};
use crate::pipeline::descriptors;
use crate::pipeline::lights::FrameLights;
use crate::pipeline::scene::{ModelId, SceneHandle, SceneSnapshot, SceneState};
use crate::pipeline::viewport::{ViewportConfig, ViewportHandle, ViewportState};
use crate::{render_err, render_info};

const SOURCE: &str = "nova::HybridPipeline";

/// Thread-group edge length of the full-screen compute passes
const COMPUTE_TILE: u32 = 8;

/// Edge length of debug overlay blits
const DEBUG_BLIT_WIDTH: u32 = 256;

/// When the sub-pixel jitter is applied to the rasterized projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterMode {
    /// Never jitter
    Disabled,
    /// Jitter only on frames whose view transform changed
    OnViewChange,
    /// Jitter every frame
    EveryFrame,
}

/// Pipeline-level feature switches
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Run the ray-traced multi-bounce GI pass each frame
    pub multibounce_gi: bool,
    /// Accumulate history with a small blend weight while the view is
    /// static (progressive refinement) instead of plain anti-aliasing
    pub accumulate_history: bool,
    /// Sub-pixel jitter policy
    pub jitter: JitterMode,
    /// Blit intermediate buffers into screen-corner overlay rectangles
    pub debug_blits: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            multibounce_gi: false,
            accumulate_history: false,
            jitter: JitterMode::OnViewChange,
            debug_blits: false,
        }
    }
}

/// The hybrid rasterization + ray-tracing frame orchestrator.
///
/// One logical thread drives all registration, update, and render calls.
/// The backend may execute submitted GPU work asynchronously; the
/// orchestrator only orders it through resource-state transitions.
pub struct HybridPipeline {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    config: PipelineConfig,

    gpass_shader: Arc<dyn Shader>,
    base_shading_shader: Arc<dyn Shader>,
    punctual_lighting_shader: Arc<dyn Shader>,
    area_lighting_shader: Arc<dyn Shader>,
    multibounce_shader: Arc<dyn Shader>,
    taa_shader: Arc<dyn Shader>,
    blit_shader: Arc<dyn Shader>,

    /// One-element buffer of frame-wide constants (screen size, matrices,
    /// camera position, frame id)
    per_render_cb: Arc<dyn ConstBuffer>,

    viewports: SlotMap<ViewportHandle, ViewportState>,
    scenes: SlotMap<SceneHandle, SceneState>,

    /// Ray-trace argument per (viewport, scene) pair, created on first use
    raytracing_args: FxHashMap<(ViewportHandle, SceneHandle), Arc<dyn ShaderArgument>>,
}

impl HybridPipeline {
    /// Create the pipeline: compiles the pass shaders from their binding
    /// descriptors and allocates the per-render constant buffer.
    pub fn new(device: Arc<Mutex<dyn GraphicsDevice>>, config: PipelineConfig) -> Result<Self> {
        let (
            gpass_shader,
            base_shading_shader,
            punctual_lighting_shader,
            area_lighting_shader,
            multibounce_shader,
            taa_shader,
            blit_shader,
            per_render_cb,
        ) = {
            let mut d = device.lock().unwrap();
            (
                d.create_shader("gpass", &descriptors::geometry_pass_desc())?,
                d.create_shader("base_shading", &descriptors::base_shading_desc())?,
                d.create_shader("punctual_lighting", &descriptors::direct_lighting_desc())?,
                d.create_shader("area_lighting", &descriptors::direct_lighting_desc())?,
                d.create_shader("multibounce_gi", &descriptors::multibounce_gi_desc())?,
                d.create_shader("taa", &descriptors::taa_desc())?,
                d.create_shader("blit", &descriptors::blit_desc())?,
                d.create_const_buffer(
                    ConstBufferLayout::new(vec![
                        ShaderDataType::Float4,   // screen size
                        ShaderDataType::Float4x4, // world -> clip
                        ShaderDataType::Float4x4, // clip -> world
                        ShaderDataType::Float4,   // camera position
                        ShaderDataType::Float4,   // frame id
                    ]),
                    1,
                    "Per-Render CB",
                )?,
            )
        };

        render_info!(SOURCE, "pipeline created (multibounce_gi: {})", config.multibounce_gi);

        Ok(Self {
            device,
            config,
            gpass_shader,
            base_shading_shader,
            punctual_lighting_shader,
            area_lighting_shader,
            multibounce_shader,
            taa_shader,
            blit_shader,
            per_render_cb,
            viewports: SlotMap::with_key(),
            scenes: SlotMap::with_key(),
            raytracing_args: FxHashMap::default(),
        })
    }

    // ===== REGISTRATION =====

    /// Register an output viewport, allocating all of its fixed-size GPU
    /// sub-resources and fixed binding objects.
    pub fn register_viewport(&mut self, config: ViewportConfig) -> Result<ViewportHandle> {
        let state = {
            let mut device = self.device.lock().unwrap();
            ViewportState::create(&mut *device, &self.per_render_cb, &config)?
        };
        let handle = self.viewports.insert(state);
        render_info!(SOURCE, "registered viewport {}x{}", config.width, config.height);
        Ok(handle)
    }

    /// Release a viewport and every cached binding object referencing it
    pub fn unregister_viewport(&mut self, handle: ViewportHandle) -> Result<()> {
        if self.viewports.remove(handle).is_none() {
            return Err(render_err!(InvalidHandle, SOURCE,
                "unregister_viewport: unknown handle {:?}", handle));
        }
        self.raytracing_args.retain(|(v, _), _| *v != handle);
        Ok(())
    }

    /// Register a scene, bulk-converting the snapshot into GPU resources.
    ///
    /// Fails with `Configuration` if any model references a geometry or
    /// material id absent from the snapshot; nothing is registered then.
    pub fn register_scene(&mut self, snapshot: &SceneSnapshot) -> Result<SceneHandle> {
        let state = {
            let mut device = self.device.lock().unwrap();
            SceneState::create(&mut *device, &self.multibounce_shader, snapshot)?
        };
        let handle = self.scenes.insert(state);
        render_info!(SOURCE, "registered scene: {} geometries, {} materials, {} models",
            snapshot.geometries.len(), snapshot.materials.len(), snapshot.models.len());
        Ok(handle)
    }

    /// Release a scene and every cached binding object referencing it
    pub fn unregister_scene(&mut self, handle: SceneHandle) -> Result<()> {
        if self.scenes.remove(handle).is_none() {
            return Err(render_err!(InvalidHandle, SOURCE,
                "unregister_scene: unknown handle {:?}", handle));
        }
        self.raytracing_args.retain(|(_, s), _| *s != handle);
        Ok(())
    }

    /// Shared read access to a scene's state (material lookups in callers
    /// and tests)
    pub fn scene(&self, handle: SceneHandle) -> Result<&SceneState> {
        self.scenes.get(handle).ok_or_else(|| {
            render_err!(InvalidHandle, SOURCE, "scene: unknown handle {:?}", handle)
        })
    }

    // ===== PER-FRAME MUTATION =====

    /// Recompute a viewport's cached view-projection from the camera.
    ///
    /// The depth-range-appropriate projection variant is selected through
    /// the device query. With accumulation on, an unchanged transform
    /// leaves the dirty flag clear so history keeps refining.
    pub fn transform_viewport(&mut self, handle: ViewportHandle, camera: &Camera) -> Result<()> {
        let depth_range_01 = self.device.lock().unwrap().is_depth_range_01();
        let viewport = self.viewports.get_mut(handle).ok_or_else(|| {
            render_err!(InvalidHandle, SOURCE, "transform_viewport: unknown handle {:?}", handle)
        })?;
        let view_proj = if depth_range_01 {
            camera.view_proj_half_z()
        } else {
            camera.view_proj()
        };
        viewport.apply_camera(view_proj, camera.position_h(), self.config.accumulate_history);
        Ok(())
    }

    /// Overwrite the cached world transform of one model. Buffers and
    /// bindings are untouched; constants re-upload during `render()`.
    pub fn update_model(
        &mut self,
        scene_handle: SceneHandle,
        model_id: ModelId,
        transform: Mat4,
    ) -> Result<()> {
        let scene = self.scenes.get_mut(scene_handle).ok_or_else(|| {
            render_err!(InvalidHandle, SOURCE, "update_model: unknown scene {:?}", scene_handle)
        })?;
        let model = scene.models.get_mut(&model_id).ok_or_else(|| {
            render_err!(InvalidHandle, SOURCE, "update_model: unknown model {}", model_id.0)
        })?;
        model.transform = transform;
        Ok(())
    }

    // ===== FRAME ORCHESTRATION =====

    /// Record and submit one frame for a (viewport, scene) pair.
    ///
    /// Pass order is fixed; each pass's inputs are transitioned to the
    /// required resource state before use. Runs to completion or fails
    /// fatally — a partially recorded frame is never presented.
    pub fn render(
        &mut self,
        viewport_h: ViewportHandle,
        scene_h: SceneHandle,
        lights: &FrameLights,
    ) -> Result<()> {
        lights.validate()?;

        let viewport = self.viewports.get_mut(viewport_h).ok_or_else(|| {
            render_err!(InvalidHandle, SOURCE, "render: unknown viewport {:?}", viewport_h)
        })?;
        let scene = self.scenes.get_mut(scene_h).ok_or_else(|| {
            render_err!(InvalidHandle, SOURCE, "render: unknown scene {:?}", scene_h)
        })?;

        let mut device = self.device.lock().unwrap();
        let mut cmd = device.create_command_list()?;

        let jitter_active = match self.config.jitter {
            JitterMode::Disabled => false,
            JitterMode::OnViewChange => viewport.view_dirty,
            JitterMode::EveryFrame => true,
        };
        // Jitter perturbs only the rasterized projection; the per-render
        // buffer keeps the stable matrix for ray generation.
        let raster_view_proj = if jitter_active {
            viewport.jittered_view_proj()
        } else {
            viewport.view_proj
        };
        let taa_blend_weight: f32 = if self.config.accumulate_history {
            0.01
        } else if viewport.view_dirty {
            1.0
        } else {
            0.5
        };

        let full_viewport = Viewport::full(viewport.width, viewport.height);
        let full_area = Rect2D::full(viewport.width, viewport.height);
        let compute_groups = (
            viewport.width.div_ceil(COMPUTE_TILE),
            viewport.height.div_ceil(COMPUTE_TILE),
            1,
        );

        // Frame-wide constants
        let screen = Vec4::new(viewport.width as f32, viewport.height as f32, 0.0, 0.0);
        cmd.update_const_buffer(&self.per_render_cb, 0, 0, ConstValue::Float4(screen))?;
        cmd.update_const_buffer(&self.per_render_cb, 0, 1, ConstValue::Float4x4(viewport.view_proj))?;
        cmd.update_const_buffer(&self.per_render_cb, 0, 2, ConstValue::Float4x4(viewport.view_proj_inv))?;
        cmd.update_const_buffer(&self.per_render_cb, 0, 3, ConstValue::Float4(viewport.cam_pos))?;
        let frame_info = Vec4::new(viewport.frame_id as f32, -1.0, -1.0, -1.0);
        cmd.update_const_buffer(&self.per_render_cb, 0, 4, ConstValue::Float4(frame_info))?;

        // Material constants, re-uploaded in full every frame
        for material in scene.materials.values() {
            cmd.update_const_buffer(&scene.materials_cb, material.cb_index, 0,
                ConstValue::Float4(material.albedo))?;
            cmd.update_const_buffer(&scene.materials_cb, material.cb_index, 1,
                ConstValue::Float4(material.params))?;
        }

        // --- G-buffer pass

        for model in scene.models.values() {
            let wvp = raster_view_proj * model.transform;
            cmd.update_const_buffer(&scene.objects_cb, model.cb_index, 0, ConstValue::Float4x4(wvp))?;
            cmd.update_const_buffer(&scene.objects_cb, model.cb_index, 1,
                ConstValue::Float4x4(model.transform))?;
        }

        cmd.transition(&viewport.gbuffer_normal, ResourceState::RenderTarget)?;
        cmd.transition(&viewport.gbuffer_albedo, ResourceState::RenderTarget)?;
        cmd.transition(&viewport.gbuffer_emissive, ResourceState::RenderTarget)?;
        cmd.transition(&viewport.depth_stencil, ResourceState::DepthWrite)?;
        cmd.begin_render_pass(&RenderPassDesc {
            render_targets: vec![
                Arc::clone(&viewport.gbuffer_normal),
                Arc::clone(&viewport.gbuffer_albedo),
                Arc::clone(&viewport.gbuffer_emissive),
            ],
            depth_stencil: Some(Arc::clone(&viewport.depth_stencil)),
            clear_render_targets: true,
            clear_depth_stencil: true,
            viewport: full_viewport,
            area: full_area,
        })?;
        for model in scene.models.values() {
            cmd.draw(&DrawCommand {
                shader: Arc::clone(&self.gpass_shader),
                vertex_buffer: Some(Arc::clone(&model.geometry.vertex_buffer)),
                index_buffer: Some(Arc::clone(&model.geometry.index_buffer)),
                arguments: vec![
                    Arc::clone(&model.raster_argument),
                    Arc::clone(&model.material_argument),
                ],
            })?;
        }
        cmd.end_render_pass()?;

        // --- Multi-bounce GI pass (optional)

        if self.config.multibounce_gi {
            for model in scene.models.values() {
                cmd.update_shader_table(&ShaderTableUpdate {
                    shader: Arc::clone(&self.multibounce_shader),
                    shader_table: Arc::clone(&scene.shader_table),
                    index: model.tlas_instance_id,
                    arguments: vec![Arc::clone(&model.hitgroup_argument)],
                })?;
            }

            cmd.transition(&viewport.gbuffer_normal, ResourceState::ComputeShaderResource)?;
            cmd.transition(&viewport.gbuffer_albedo, ResourceState::ComputeShaderResource)?;
            cmd.transition(&viewport.gbuffer_emissive, ResourceState::ComputeShaderResource)?;
            cmd.transition(&viewport.depth_stencil, ResourceState::ComputeShaderResource)?;
            cmd.transition(&viewport.raytrace_output, ResourceState::UnorderedAccess)?;

            let raytrace_arg = Self::fetch_raytracing_argument(
                &mut *device,
                &mut self.raytracing_args,
                &self.per_render_cb,
                (viewport_h, scene_h),
                viewport,
                scene,
            )?;
            cmd.trace_rays(&RayTraceCommand {
                shader: Arc::clone(&self.multibounce_shader),
                shader_table: Arc::clone(&scene.shader_table),
                arguments: vec![raytrace_arg],
                width: viewport.width,
                height: viewport.height,
            })?;
        }

        // --- Deferred direct lighting

        // Base term initializes the accumulation buffer before any light
        cmd.transition(&viewport.shading_output, ResourceState::UnorderedAccess)?;
        cmd.dispatch(&DispatchCommand {
            shader: Arc::clone(&self.base_shading_shader),
            arguments: vec![Arc::clone(&viewport.base_shading_arg)],
            group_count: compute_groups,
        })?;
        cmd.uav_barrier(&viewport.shading_output)?;

        // Punctual lights accumulate into the shading buffer
        cmd.transition(&viewport.gbuffer_normal, ResourceState::ComputeShaderResource)?;
        cmd.transition(&viewport.gbuffer_albedo, ResourceState::ComputeShaderResource)?;
        cmd.transition(&viewport.gbuffer_emissive, ResourceState::ComputeShaderResource)?;
        cmd.transition(&viewport.depth_stencil, ResourceState::ComputeShaderResource)?;
        cmd.transition(&viewport.shading_output, ResourceState::UnorderedAccess)?;
        cmd.uav_barrier(&viewport.shading_output)?;
        for (slot, light) in lights.punctual.iter().enumerate() {
            cmd.update_const_buffer(&scene.punctual_lights_cb, slot as u64, 0,
                ConstValue::Float4(light.pos_dir))?;
            cmd.update_const_buffer(&scene.punctual_lights_cb, slot as u64, 1,
                ConstValue::Float4(light.color))?;

            let light_arg = scene.fetch_punctual_light_argument(&mut *device, slot)?;
            cmd.dispatch(&DispatchCommand {
                shader: Arc::clone(&self.punctual_lighting_shader),
                arguments: vec![light_arg, Arc::clone(&viewport.direct_lighting_arg)],
                group_count: compute_groups,
            })?;
        }

        // Area lights target the unshadowed-irradiance buffer, cleared first
        cmd.transition(&viewport.area_light_unshadowed, ResourceState::UnorderedAccess)?;
        cmd.clear_texture(&viewport.area_light_unshadowed, Vec4::ZERO, full_area)?;
        cmd.uav_barrier(&viewport.area_light_unshadowed)?;
        for (slot, light) in lights.area.iter().enumerate() {
            cmd.update_const_buffer(&scene.area_lights_cb, slot as u64, 0,
                ConstValue::Float4(light.shape))?;
            cmd.update_const_buffer(&scene.area_lights_cb, slot as u64, 1,
                ConstValue::Float4(light.color))?;

            let light_arg = scene.fetch_area_light_argument(&mut *device, slot)?;
            cmd.dispatch(&DispatchCommand {
                shader: Arc::clone(&self.area_lighting_shader),
                arguments: vec![light_arg, Arc::clone(&viewport.area_lighting_arg)],
                group_count: compute_groups,
            })?;
        }

        // --- Temporal anti-aliasing

        let taa_params = Vec4::new(viewport.frame_id as f32, taa_blend_weight, -1.0, -1.0);
        cmd.update_const_buffer(&viewport.taa_cb, 0, 0, ConstValue::Float4(taa_params))?;
        cmd.transition(viewport.taa_input(), ResourceState::ComputeShaderResource)?;
        cmd.transition(viewport.taa_output(), ResourceState::UnorderedAccess)?;
        cmd.transition(&viewport.shading_output, ResourceState::UnorderedAccess)?;
        cmd.dispatch(&DispatchCommand {
            shader: Arc::clone(&self.taa_shader),
            arguments: vec![Arc::clone(viewport.taa_argument())],
            group_count: compute_groups,
        })?;

        // --- Present composite

        let backbuffer = device.fetch_swapchain_buffer(&viewport.swapchain)?;
        cmd.transition(&backbuffer, ResourceState::RenderTarget)?;
        cmd.transition(&viewport.shading_output, ResourceState::PixelShaderResource)?;
        cmd.begin_render_pass(&RenderPassDesc {
            render_targets: vec![Arc::clone(&backbuffer)],
            depth_stencil: None,
            clear_render_targets: true,
            clear_depth_stencil: false,
            viewport: full_viewport,
            area: full_area,
        })?;
        cmd.draw(&DrawCommand {
            shader: Arc::clone(&self.blit_shader),
            vertex_buffer: None,
            index_buffer: None,
            arguments: vec![Arc::clone(&viewport.blit_present_arg)],
        })?;
        cmd.end_render_pass()?;

        // --- Debug overlays (optional, non-destructive)

        if self.config.debug_blits {
            let blit_width = DEBUG_BLIT_WIDTH;
            let blit_height = blit_width * viewport.height / viewport.width;
            let mut overlay_index = 0;

            let overlays = [(
                Arc::clone(&viewport.area_light_unshadowed),
                Arc::clone(&viewport.blit_area_debug_arg),
            )];
            for (texture, argument) in overlays {
                cmd.transition(&texture, ResourceState::PixelShaderResource)?;
                cmd.begin_render_pass(&RenderPassDesc {
                    render_targets: vec![Arc::clone(&backbuffer)],
                    depth_stencil: None,
                    clear_render_targets: false,
                    clear_depth_stencil: false,
                    viewport: full_viewport.shrink_to_upper_left(
                        blit_width, blit_height, 0, blit_height * overlay_index),
                    area: full_area.shrink_to_upper_left(
                        blit_width, blit_height, 0, blit_height * overlay_index),
                })?;
                cmd.draw(&DrawCommand {
                    shader: Arc::clone(&self.blit_shader),
                    vertex_buffer: None,
                    index_buffer: None,
                    arguments: vec![argument],
                })?;
                cmd.end_render_pass()?;
                overlay_index += 1;
            }
        }

        // --- Frame advance and present

        viewport.advance_frame();
        cmd.transition(&backbuffer, ResourceState::Present)?;
        cmd.present(&viewport.swapchain, false)?;

        Ok(())
    }

    /// Binding object of the GI dispatch for one (viewport, scene) pair:
    /// per-render constants, TLAS, depth + G-buffers, accumulation output.
    /// Created on first use, reused every following frame.
    fn fetch_raytracing_argument(
        device: &mut dyn GraphicsDevice,
        cache: &mut FxHashMap<(ViewportHandle, SceneHandle), Arc<dyn ShaderArgument>>,
        per_render_cb: &Arc<dyn ConstBuffer>,
        key: (ViewportHandle, SceneHandle),
        viewport: &ViewportState,
        scene: &SceneState,
    ) -> Result<Arc<dyn ShaderArgument>> {
        if let Some(argument) = cache.get(&key) {
            return Ok(Arc::clone(argument));
        }

        let argument = device.create_shader_argument(&ShaderArgumentValue {
            const_buffers: vec![Arc::clone(per_render_cb)],
            const_buffer_offsets: vec![0],
            shader_resources: vec![
                ResourceRef::AccelerationStructure(Arc::clone(&scene.tlas)),
                ResourceRef::Texture(Arc::clone(&viewport.depth_stencil)),
                ResourceRef::Texture(Arc::clone(&viewport.gbuffer_normal)),
                ResourceRef::Texture(Arc::clone(&viewport.gbuffer_albedo)),
                ResourceRef::Texture(Arc::clone(&viewport.gbuffer_emissive)),
            ],
            unordered_accesses: vec![Arc::clone(&viewport.raytrace_output)],
        })?;
        cache.insert(key, Arc::clone(&argument));
        Ok(argument)
    }
}

#[cfg(test)]
#[path = "hybrid_tests.rs"]
mod tests;
