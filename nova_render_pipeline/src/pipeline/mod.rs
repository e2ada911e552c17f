/// Pipeline module - handle registries, per-viewport/per-scene state, and
/// the frame orchestrator

// Module declarations
pub mod viewport;
pub mod scene;
pub mod lights;
pub mod descriptors;
pub mod hybrid;

// Re-export the caller-facing surface
pub use viewport::{ViewportConfig, ViewportHandle};
pub use scene::{
    GeometryId, GeometryRecord, MaterialId, MaterialRecord, ModelId, ModelRecord, SceneHandle,
    SceneSnapshot,
};
pub use lights::{AreaLight, FrameLights, PunctualLight, MAX_LIGHT_SLOTS};
pub use hybrid::{HybridPipeline, JitterMode, PipelineConfig};
