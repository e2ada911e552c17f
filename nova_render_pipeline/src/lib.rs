/*!
# Nova Render Pipeline

A multi-pass, hybrid (rasterization + ray-traced) frame orchestrator for
real-time rendering.

Given a registered viewport (output surface, camera) and a registered scene
(geometry, materials, lights), the pipeline builds and submits one ordered
sequence of GPU passes per frame:

1. opaque geometry rasterization into a G-buffer (normal, albedo, emissive)
2. optional ray-traced multi-bounce global illumination
3. per-light deferred direct lighting (punctual and area lights)
4. temporal anti-aliasing with history accumulation
5. composite blit to the swapchain and present

The graphics backend is consumed through the trait layer in
[`graphics_device`]; backend implementations (Vulkan, Direct3D 12) live in
plugin crates. The pipeline owns all per-viewport and per-scene GPU state
behind opaque handles, keeps GPU resources in the states each pass expects,
and caches every binding object so steady-state frames create no backend
objects at all.

## Architecture

- **HybridPipeline**: registries, pass shaders, and the `render()` entry point
- **ViewportState**: output targets, G-buffer, temporal history, jitter
- **SceneState**: GPU mirror of a scene snapshot, light buffers, ray-trace data
- **GraphicsDevice**: factory trait implemented by backends
- **CommandList**: per-frame command recording trait
*/

// Internal modules
pub mod error;
pub mod log;
pub mod camera;
pub mod graphics_device;
pub mod pipeline;

// Main nova namespace module
pub mod nova {
    // Error types
    pub use crate::error::{Error, Result};

    // Caller-facing pipeline surface
    pub use crate::pipeline::{
        AreaLight, FrameLights, GeometryId, GeometryRecord, HybridPipeline, JitterMode,
        MaterialId, MaterialRecord, ModelId, ModelRecord, PipelineConfig, PunctualLight,
        SceneHandle, SceneSnapshot, ViewportConfig, ViewportHandle, MAX_LIGHT_SLOTS,
    };

    // Camera input value
    pub use crate::camera::Camera;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Backend contract sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }
}

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export math library at crate root
pub use glam;
