//! Tests for the frame orchestrator.
//!
//! Every test drives the full pipeline against the mock device and
//! inspects the recorded command log: which passes ran, how often, and in
//! what order.

use std::sync::{Arc, Mutex};

use glam::Vec3;

use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{GeometryData, IndexType, SurfaceId};
use crate::pipeline::lights::{AreaLight, PunctualLight};
use crate::pipeline::scene::{
    GeometryId, GeometryRecord, MaterialId, MaterialRecord, ModelRecord,
};

// ============================================================================
// Helpers
// ============================================================================

type SharedLog = Arc<Mutex<Vec<String>>>;

/// Pipeline over a fresh mock device, plus the device's shared logs
fn new_pipeline(config: PipelineConfig) -> (HybridPipeline, SharedLog, SharedLog) {
    let device = MockGraphicsDevice::new();
    let command_log = Arc::clone(&device.command_log);
    let created_args = Arc::clone(&device.created_shader_arguments);
    let device: Arc<Mutex<dyn GraphicsDevice>> = Arc::new(Mutex::new(device));
    let pipeline = HybridPipeline::new(device, config).unwrap();
    (pipeline, command_log, created_args)
}

fn count_commands(log: &SharedLog, prefix: &str) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .count()
}

fn command_position(log: &SharedLog, prefix: &str) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .position(|entry| entry.starts_with(prefix))
        .unwrap_or_else(|| panic!("no command starting with {}", prefix))
}

fn triangle_geometry() -> GeometryData {
    let positions: [f32; 9] = [
        -0.5, -0.5, 0.0, //
        0.5, -0.5, 0.0, //
        0.0, 0.5, 0.0,
    ];
    let indices: [u16; 3] = [0, 1, 2];
    GeometryData {
        vertex_data: bytemuck::cast_slice(&positions).to_vec(),
        vertex_stride: 12,
        vertex_count: 3,
        index_data: bytemuck::cast_slice(&indices).to_vec(),
        index_type: IndexType::U16,
        index_count: 3,
    }
}

/// One triangle with a red material
fn red_triangle_snapshot() -> SceneSnapshot {
    SceneSnapshot {
        geometries: vec![GeometryRecord {
            id: GeometryId(1),
            data: triangle_geometry(),
        }],
        materials: vec![MaterialRecord {
            id: MaterialId(1),
            albedo: Some(Vec4::new(1.0, 0.0, 0.0, 1.0)),
            smoothness: None,
            metalness: None,
            emissive: None,
        }],
        models: vec![ModelRecord {
            id: ModelId(1),
            geometry: GeometryId(1),
            material: MaterialId(1),
            transform: Mat4::IDENTITY,
        }],
    }
}

fn test_camera() -> Camera {
    let position = Vec3::new(0.0, 1.0, 8.0);
    Camera::new(
        position,
        Mat4::look_at_rh(position, Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0),
        Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
    )
}

fn viewport_config() -> ViewportConfig {
    ViewportConfig {
        width: 256,
        height: 256,
        surface: SurfaceId(1),
    }
}

fn one_punctual_light() -> FrameLights {
    FrameLights {
        punctual: vec![PunctualLight::directional(
            Vec3::new(1.0, 2.0, 1.0),
            Vec4::new(1.3, 1.3, 1.3, 1.0),
        )],
        area: Vec::new(),
    }
}

// ============================================================================
// End-to-end frame
// ============================================================================

#[test]
fn test_single_model_frame_emits_each_pass_once() {
    let (mut pipeline, log, _args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();
    pipeline.transform_viewport(viewport, &test_camera()).unwrap();

    pipeline.render(viewport, scene, &one_punctual_light()).unwrap();

    assert_eq!(count_commands(&log, "draw:gpass"), 1);
    assert_eq!(count_commands(&log, "dispatch:base_shading"), 1);
    assert_eq!(count_commands(&log, "trace_rays"), 0, "GI is off by default");
    assert_eq!(count_commands(&log, "dispatch:punctual_lighting"), 1);
    assert_eq!(count_commands(&log, "dispatch:area_lighting"), 0);
    assert_eq!(count_commands(&log, "dispatch:taa"), 1);
    assert_eq!(count_commands(&log, "draw:blit"), 1);
    assert_eq!(count_commands(&log, "present:vsync=false"), 1);

    // frame counter left its "no history" sentinel
    assert_eq!(pipeline.viewports[viewport].frame_id, 1);
}

#[test]
fn test_passes_run_in_fixed_order() {
    let (mut pipeline, log, _args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    pipeline.render(viewport, scene, &one_punctual_light()).unwrap();

    let gpass = command_position(&log, "draw:gpass");
    let base = command_position(&log, "dispatch:base_shading");
    let lighting = command_position(&log, "dispatch:punctual_lighting");
    let taa = command_position(&log, "dispatch:taa");
    let blit = command_position(&log, "draw:blit");
    let present = command_position(&log, "present");
    assert!(gpass < base && base < lighting && lighting < taa && taa < blit && blit < present);
}

#[test]
fn test_each_light_gets_its_own_dispatch() {
    let (mut pipeline, log, _args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    let lights = FrameLights {
        punctual: vec![
            PunctualLight::directional(Vec3::new(1.0, 2.0, 1.0), Vec4::splat(1.3)),
            PunctualLight::point(Vec3::new(0.0, 2.0, 0.0), Vec4::ONE),
        ],
        area: vec![AreaLight::sphere(Vec3::new(0.0, 5.0, 0.0), 0.5, Vec4::splat(10.0))],
    };
    pipeline.render(viewport, scene, &lights).unwrap();

    assert_eq!(count_commands(&log, "dispatch:punctual_lighting"), 2);
    assert_eq!(count_commands(&log, "dispatch:area_lighting"), 1);
}

#[test]
fn test_area_light_buffer_is_cleared_before_its_dispatch() {
    let (mut pipeline, log, _args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    let lights = FrameLights {
        punctual: Vec::new(),
        area: vec![AreaLight::sphere(Vec3::new(0.0, 5.0, 0.0), 0.5, Vec4::splat(10.0))],
    };
    pipeline.render(viewport, scene, &lights).unwrap();

    let clear = command_position(&log, "clear_texture:Area Light Unshadowed");
    let dispatch = command_position(&log, "dispatch:area_lighting");
    assert!(clear < dispatch);
}

#[test]
fn test_frame_counter_wraparound_skips_sentinel() {
    let (mut pipeline, _log, _args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    pipeline.viewports.get_mut(viewport).unwrap().frame_id = 255;
    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();
    assert_eq!(pipeline.viewports[viewport].frame_id, 2);
}

// ============================================================================
// Multi-bounce GI
// ============================================================================

#[test]
fn test_gi_pass_traces_rays_and_updates_shader_table() {
    let config = PipelineConfig {
        multibounce_gi: true,
        ..Default::default()
    };
    let (mut pipeline, log, _args) = new_pipeline(config);
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();

    assert_eq!(count_commands(&log, "trace_rays:multibounce_gi:256x256"), 1);
    assert_eq!(count_commands(&log, "update_shader_table"), 1);

    // G-buffer readable and output writable before tracing
    let trace = command_position(&log, "trace_rays");
    let readable = command_position(&log, "transition:Normal Buffer:ComputeShaderResource");
    let writable = command_position(&log, "transition:Raytracing Output Buffer:UnorderedAccess");
    assert!(readable < trace && writable < trace);
}

#[test]
fn test_raytracing_argument_is_cached_per_pair() {
    let config = PipelineConfig {
        multibounce_gi: true,
        ..Default::default()
    };
    let (mut pipeline, _log, args) = new_pipeline(config);
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();
    let after_first = args.lock().unwrap().len();
    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();
    assert_eq!(args.lock().unwrap().len(), after_first);
    assert_eq!(pipeline.raytracing_args.len(), 1);
}

// ============================================================================
// Binding-object caching
// ============================================================================

#[test]
fn test_steady_state_frames_create_no_binding_objects() {
    let (mut pipeline, _log, args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    let lights = FrameLights {
        punctual: vec![PunctualLight::point(Vec3::ZERO, Vec4::ONE)],
        area: vec![AreaLight::sphere(Vec3::ZERO, 1.0, Vec4::ONE)],
    };
    pipeline.render(viewport, scene, &lights).unwrap();
    let after_first = args.lock().unwrap().len();

    for _ in 0..3 {
        pipeline.render(viewport, scene, &lights).unwrap();
    }
    assert_eq!(args.lock().unwrap().len(), after_first);
}

#[test]
fn test_unregistering_purges_raytracing_cache() {
    let config = PipelineConfig {
        multibounce_gi: true,
        ..Default::default()
    };
    let (mut pipeline, _log, _args) = new_pipeline(config);
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();
    assert_eq!(pipeline.raytracing_args.len(), 1);

    pipeline.unregister_scene(scene).unwrap();
    assert!(pipeline.raytracing_args.is_empty());
    assert!(pipeline.scenes.is_empty());
}

// ============================================================================
// Registration failure modes
// ============================================================================

#[test]
fn test_scene_with_dangling_reference_registers_nothing() {
    let (mut pipeline, _log, _args) = new_pipeline(PipelineConfig::default());
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();

    let mut snapshot = red_triangle_snapshot();
    snapshot.models[0].geometry = GeometryId(99);
    let result = pipeline.register_scene(&snapshot);
    assert!(matches!(result, Err(Error::Configuration(_))));
    assert!(pipeline.scenes.is_empty());

    // a made-up handle is rejected as invalid, not resolved to leftovers
    let result = pipeline.render(viewport, SceneHandle::default(), &FrameLights::default());
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
}

#[test]
fn test_viewport_allocation_failure_leaves_no_state() {
    let device = MockGraphicsDevice::failing_textures();
    let device: Arc<Mutex<dyn GraphicsDevice>> = Arc::new(Mutex::new(device));
    let mut pipeline = HybridPipeline::new(device, PipelineConfig::default()).unwrap();

    let result = pipeline.register_viewport(viewport_config());
    assert!(matches!(result, Err(Error::BackendAllocation(_))));
    assert!(pipeline.viewports.is_empty());
}

#[test]
fn test_unknown_handles_are_invalid() {
    let (mut pipeline, _log, _args) = new_pipeline(PipelineConfig::default());

    let result = pipeline.render(
        ViewportHandle::default(),
        SceneHandle::default(),
        &FrameLights::default(),
    );
    assert!(matches!(result, Err(Error::InvalidHandle(_))));

    let result = pipeline.transform_viewport(ViewportHandle::default(), &test_camera());
    assert!(matches!(result, Err(Error::InvalidHandle(_))));

    let result = pipeline.update_model(SceneHandle::default(), ModelId(1), Mat4::IDENTITY);
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
}

// ============================================================================
// Per-frame mutation
// ============================================================================

#[test]
fn test_update_model_overwrites_cached_transform() {
    let (mut pipeline, _log, _args) = new_pipeline(PipelineConfig::default());
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    let moved = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
    pipeline.update_model(scene, ModelId(1), moved).unwrap();
    assert_eq!(pipeline.scenes[scene].models[&ModelId(1)].transform, moved);

    let result = pipeline.update_model(scene, ModelId(42), moved);
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
}

#[test]
fn test_accumulation_keeps_static_view_clean() {
    let config = PipelineConfig {
        accumulate_history: true,
        ..Default::default()
    };
    let (mut pipeline, _log, _args) = new_pipeline(config);
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    let camera = test_camera();
    pipeline.transform_viewport(viewport, &camera).unwrap();
    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();

    // identical transform: history keeps accumulating
    pipeline.transform_viewport(viewport, &camera).unwrap();
    assert!(!pipeline.viewports[viewport].view_dirty);

    // a moved camera restarts accumulation
    let moved = Camera::new(
        Vec3::new(2.0, 1.0, 8.0),
        Mat4::look_at_rh(Vec3::new(2.0, 1.0, 8.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0),
        Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
    );
    pipeline.transform_viewport(viewport, &moved).unwrap();
    assert!(pipeline.viewports[viewport].view_dirty);
}

// ============================================================================
// Debug overlays
// ============================================================================

#[test]
fn test_debug_blits_draw_a_second_composite() {
    let config = PipelineConfig {
        debug_blits: true,
        ..Default::default()
    };
    let (mut pipeline, log, _args) = new_pipeline(config);
    let viewport = pipeline.register_viewport(viewport_config()).unwrap();
    let scene = pipeline.register_scene(&red_triangle_snapshot()).unwrap();

    pipeline.render(viewport, scene, &FrameLights::default()).unwrap();
    assert_eq!(count_commands(&log, "draw:blit"), 2);
}
