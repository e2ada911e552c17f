/// Binding-layout declarations for every pass of the hybrid pipeline.
///
/// Consumed once by `HybridPipeline::new` to create the backend shader
/// objects. Space order here must match the argument order recorded by
/// the orchestrator's draw/dispatch commands.

use crate::graphics_device::{
    ComputeShaderDesc, RasterShaderDesc, RayTraceShaderDesc, ResourceFormat, ShaderDesc,
    ShaderParameterSpace, ShaderSignature,
};

/// Geometry pass: rasterizes every model into the three G-buffer targets.
///
/// Space 0 = per-object constants, space 1 = per-material constants.
pub fn geometry_pass_desc() -> ShaderDesc {
    ShaderDesc::Raster(RasterShaderDesc {
        signature: ShaderSignature::new(vec![
            ShaderParameterSpace { const_buffers: 1, ..Default::default() },
            ShaderParameterSpace { const_buffers: 1, ..Default::default() },
        ]),
        render_target_formats: vec![
            ResourceFormat::R32G32B32A32_FLOAT, // normal
            ResourceFormat::B8G8R8A8_UNORM,     // albedo
            ResourceFormat::R32G32B32A32_FLOAT, // emissive
        ],
        depth_stencil_enabled: true,
    })
}

/// Multi-bounce GI pass: one ray per pixel over the G-buffer.
///
/// Global space 0 = per-render constants, TLAS + depth + three G-buffers,
/// accumulation output. Hit-group space 1 = geometry index/vertex buffers
/// and the material constants of the hit instance.
pub fn multibounce_gi_desc() -> ShaderDesc {
    ShaderDesc::RayTrace(RayTraceShaderDesc {
        global_signature: ShaderSignature::new(vec![ShaderParameterSpace {
            const_buffers: 1,
            shader_resources: 5,
            unordered_accesses: 1,
            ..Default::default()
        }]),
        hitgroup_signature: ShaderSignature::new(vec![
            ShaderParameterSpace::default(),
            ShaderParameterSpace {
                const_buffers: 1,
                shader_resources: 2,
                ..Default::default()
            },
        ]),
        raygen_name: "raygen".to_string(),
        miss_name: "miss".to_string(),
        closest_hit_name: "closest_hit".to_string(),
        hitgroup_name: "hit_group0".to_string(),
    })
}

/// Base shading pass: initializes the shading accumulation buffer.
///
/// Space 1 = the shading output; space 0 is unused but kept so the output
/// binding lives in the same space as in the lighting passes.
pub fn base_shading_desc() -> ShaderDesc {
    ShaderDesc::Compute(ComputeShaderDesc {
        signature: ShaderSignature::new(vec![
            ShaderParameterSpace::default(),
            ShaderParameterSpace { unordered_accesses: 1, ..Default::default() },
        ]),
    })
}

/// Per-light deferred lighting pass, shared layout for punctual and area
/// lights.
///
/// Space 0 = one light's constants; space 1 = depth + three G-buffers,
/// the accumulation target, and the per-render constants.
pub fn direct_lighting_desc() -> ShaderDesc {
    ShaderDesc::Compute(ComputeShaderDesc {
        signature: ShaderSignature::new(vec![
            ShaderParameterSpace { const_buffers: 1, ..Default::default() },
            ShaderParameterSpace {
                const_buffers: 1,
                shader_resources: 4,
                unordered_accesses: 1,
                ..Default::default()
            },
        ]),
    })
}

/// TAA pass: blends the current shading result with the history buffer.
///
/// Space 0 = TAA constants, history input + shading as readable, history
/// output + shading as writable.
pub fn taa_desc() -> ShaderDesc {
    ShaderDesc::Compute(ComputeShaderDesc {
        signature: ShaderSignature::new(vec![ShaderParameterSpace {
            const_buffers: 1,
            shader_resources: 2,
            unordered_accesses: 2,
            ..Default::default()
        }]),
    })
}

/// Full-screen blit: samples one texture into the bound render target.
pub fn blit_desc() -> ShaderDesc {
    ShaderDesc::Raster(RasterShaderDesc {
        signature: ShaderSignature::new(vec![ShaderParameterSpace {
            shader_resources: 1,
            static_samplers: 1,
            ..Default::default()
        }]),
        render_target_formats: vec![ResourceFormat::B8G8R8A8_UNORM],
        depth_stencil_enabled: false,
    })
}
