/// Per-scene state: the GPU-resident mirror of one scene snapshot.
///
/// Registration bulk-converts the snapshot (geometries, materials, models)
/// into GPU resources in one pass; afterwards only world transforms and
/// per-frame constants change. Constant-buffer slot indices are dense,
/// assigned in snapshot order, and stable for the scene's lifetime.

use std::sync::Arc;

use glam::{Mat4, Vec4};
use rustc_hash::FxHashMap;
use slotmap::new_key_type;

use crate::error::Result;
use crate::pipeline::lights::MAX_LIGHT_SLOTS;
use crate::graphics_device::{
    AccelInstanceDesc, AccelerationStructure, ConstBuffer, ConstBufferLayout, GeometryBuffers,
    GeometryData, GraphicsDevice, ResourceRef, Shader, ShaderArgument, ShaderArgumentValue,
    ShaderDataType, ShaderTable,
};
use crate::render_bail;

new_key_type! {
    /// Stable handle for a registered scene.
    pub struct SceneHandle;
}

// ===== SNAPSHOT INPUT =====

/// Caller-assigned geometry identity within one scene snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u64);

/// Caller-assigned material identity within one scene snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u64);

/// Caller-assigned model identity within one scene snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub u64);

/// One geometry of a scene snapshot
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    pub id: GeometryId,
    pub data: GeometryData,
}

/// One material of a scene snapshot.
///
/// Unset properties fall back to the pipeline defaults: magenta albedo,
/// zero smoothness/metalness/emissive.
#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub id: MaterialId,
    pub albedo: Option<Vec4>,
    pub smoothness: Option<f32>,
    pub metalness: Option<f32>,
    pub emissive: Option<f32>,
}

/// One model of a scene snapshot. Geometry and material must refer to
/// entries of the same snapshot.
#[derive(Debug, Clone)]
pub struct ModelRecord {
    pub id: ModelId,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Mat4,
}

/// Read-only scene snapshot consumed by `register_scene`
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    pub geometries: Vec<GeometryRecord>,
    pub materials: Vec<MaterialRecord>,
    pub models: Vec<ModelRecord>,
}

/// Albedo used when a material leaves it unset
pub const DEFAULT_ALBEDO: Vec4 = Vec4::new(1.0, 0.0, 1.0, 1.0);

// ===== GPU-SIDE RECORDS =====

/// GPU-side record of one material
pub struct MaterialState {
    /// Binding object selecting this material's constant-buffer element
    pub(crate) argument: Arc<dyn ShaderArgument>,
    /// Dense slot in the materials constant buffer
    pub(crate) cb_index: u64,
    /// Parameter set 0: albedo
    pub(crate) albedo: Vec4,
    /// Parameter set 1: (smoothness, metalness, emissive, unused)
    pub(crate) params: Vec4,
}

impl MaterialState {
    pub fn albedo(&self) -> Vec4 {
        self.albedo
    }

    pub fn smoothness(&self) -> f32 {
        self.params.x
    }

    pub fn metalness(&self) -> f32 {
        self.params.y
    }

    pub fn emissive(&self) -> f32 {
        self.params.z
    }
}

/// GPU-side record of one model
pub struct ModelState {
    pub(crate) geometry: GeometryBuffers,
    /// Material argument drawn with this model in the geometry pass
    pub(crate) material_argument: Arc<dyn ShaderArgument>,
    /// Binding object selecting this model's objects-buffer element
    pub(crate) raster_argument: Arc<dyn ShaderArgument>,
    /// Hit-group binding recorded into the shader table
    pub(crate) hitgroup_argument: Arc<dyn ShaderArgument>,
    /// Dense slot in the objects constant buffer
    pub(crate) cb_index: u64,
    /// Acceleration-structure instance id; always equals `cb_index`
    pub(crate) tlas_instance_id: u64,
    /// Current world transform
    pub(crate) transform: Mat4,
}

/// GPU resources of one registered scene
pub struct SceneState {
    pub(crate) geometries: FxHashMap<GeometryId, GeometryBuffers>,
    pub(crate) materials: FxHashMap<MaterialId, MaterialState>,
    pub(crate) models: FxHashMap<ModelId, ModelState>,

    /// Per-model constants: world-view-projection + world, one element per model
    pub(crate) objects_cb: Arc<dyn ConstBuffer>,
    /// Per-material constants: albedo + parameter set, one element per material
    pub(crate) materials_cb: Arc<dyn ConstBuffer>,

    pub(crate) tlas: Arc<dyn AccelerationStructure>,
    pub(crate) shader_table: Arc<dyn ShaderTable>,

    /// Fixed-capacity light constants, one element per slot
    pub(crate) punctual_lights_cb: Arc<dyn ConstBuffer>,
    pub(crate) area_lights_cb: Arc<dyn ConstBuffer>,

    // Per-slot binding caches, lazily grown to the highest slot seen.
    // Growth never moves the Arcs already handed out.
    punctual_light_args: Vec<Option<Arc<dyn ShaderArgument>>>,
    area_light_args: Vec<Option<Arc<dyn ShaderArgument>>>,
}

impl SceneState {
    /// Bulk-convert a snapshot into GPU resources.
    ///
    /// Build order: geometries, materials (constant buffer + one argument
    /// each), models (constant buffer + raster and hit-group arguments),
    /// acceleration structure + shader table, light buffers. A model whose
    /// geometry or material id is absent from the snapshot aborts the whole
    /// conversion with `Configuration`; the caller registers nothing.
    pub(crate) fn create(
        device: &mut dyn GraphicsDevice,
        raytrace_shader: &Arc<dyn Shader>,
        snapshot: &SceneSnapshot,
    ) -> Result<Self> {
        let model_count = snapshot.models.len() as u64;
        let material_count = snapshot.materials.len() as u64;

        // Geometries
        let mut geometries = FxHashMap::default();
        for record in &snapshot.geometries {
            let buffers =
                device.create_geometry_buffers(&record.data, &format!("Geometry {}", record.id.0))?;
            geometries.insert(record.id, buffers);
        }

        // Materials
        let materials_cb = device.create_const_buffer(
            ConstBufferLayout::new(vec![ShaderDataType::Float4, ShaderDataType::Float4]),
            material_count,
            "Scene Materials CB",
        )?;
        let mut materials = FxHashMap::default();
        for (index, record) in snapshot.materials.iter().enumerate() {
            let argument = device.create_shader_argument(&ShaderArgumentValue {
                const_buffers: vec![Arc::clone(&materials_cb)],
                const_buffer_offsets: vec![index as u64],
                ..Default::default()
            })?;
            materials.insert(
                record.id,
                MaterialState {
                    argument,
                    cb_index: index as u64,
                    albedo: record.albedo.unwrap_or(DEFAULT_ALBEDO),
                    params: Vec4::new(
                        record.smoothness.unwrap_or(0.0),
                        record.metalness.unwrap_or(0.0),
                        record.emissive.unwrap_or(0.0),
                        0.0,
                    ),
                },
            );
        }

        // Models
        let objects_cb = device.create_const_buffer(
            ConstBufferLayout::new(vec![ShaderDataType::Float4x4, ShaderDataType::Float4x4]),
            model_count,
            "Scene Objects CB",
        )?;
        let mut models = FxHashMap::default();
        for (index, record) in snapshot.models.iter().enumerate() {
            let Some(material) = materials.get(&record.material) else {
                render_bail!(Configuration, "nova::SceneState",
                    "model {} references material {} absent from the snapshot",
                    record.id.0, record.material.0);
            };
            let Some(geometry) = geometries.get(&record.geometry) else {
                render_bail!(Configuration, "nova::SceneState",
                    "model {} references geometry {} absent from the snapshot",
                    record.id.0, record.geometry.0);
            };

            let raster_argument = device.create_shader_argument(&ShaderArgumentValue {
                const_buffers: vec![Arc::clone(&objects_cb)],
                const_buffer_offsets: vec![index as u64],
                ..Default::default()
            })?;
            let hitgroup_argument = device.create_shader_argument(&ShaderArgumentValue {
                const_buffers: vec![Arc::clone(&materials_cb)],
                const_buffer_offsets: vec![material.cb_index],
                shader_resources: vec![
                    ResourceRef::Buffer(Arc::clone(&geometry.index_buffer)),
                    ResourceRef::Buffer(Arc::clone(&geometry.vertex_buffer)),
                ],
                ..Default::default()
            })?;

            models.insert(
                record.id,
                ModelState {
                    geometry: geometry.clone(),
                    material_argument: Arc::clone(&material.argument),
                    raster_argument,
                    hitgroup_argument,
                    cb_index: index as u64,
                    tlas_instance_id: index as u64,
                    transform: record.transform,
                },
            );
        }

        // Acceleration structure and shader table
        let instances: Vec<AccelInstanceDesc> = models
            .values()
            .map(|model| AccelInstanceDesc {
                instance_id: model.tlas_instance_id,
                blas_buffer: Arc::clone(&model.geometry.blas_buffer),
                transform: model.transform,
            })
            .collect();
        let tlas = device.create_acceleration_structure(&instances)?;
        let shader_table = device.create_shader_table(model_count, raytrace_shader)?;

        // Analytic light buffers
        let light_layout = ConstBufferLayout::new(vec![ShaderDataType::Float4, ShaderDataType::Float4]);
        let punctual_lights_cb = device.create_const_buffer(
            light_layout.clone(),
            MAX_LIGHT_SLOTS as u64,
            "Punctual Lights Buffer",
        )?;
        let area_lights_cb =
            device.create_const_buffer(light_layout, MAX_LIGHT_SLOTS as u64, "Area Lights Buffer")?;

        Ok(Self {
            geometries,
            materials,
            models,
            objects_cb,
            materials_cb,
            tlas,
            shader_table,
            punctual_lights_cb,
            area_lights_cb,
            punctual_light_args: Vec::new(),
            area_light_args: Vec::new(),
        })
    }

    /// Material record by id
    pub fn material(&self, id: MaterialId) -> Option<&MaterialState> {
        self.materials.get(&id)
    }

    /// GPU buffers of a registered geometry
    pub fn geometry(&self, id: GeometryId) -> Option<&GeometryBuffers> {
        self.geometries.get(&id)
    }

    /// Number of registered models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Binding object for one punctual-light slot, created on first use
    pub(crate) fn fetch_punctual_light_argument(
        &mut self,
        device: &mut dyn GraphicsDevice,
        slot: usize,
    ) -> Result<Arc<dyn ShaderArgument>> {
        fetch_light_argument(device, &self.punctual_lights_cb, &mut self.punctual_light_args, slot)
    }

    /// Binding object for one area-light slot, created on first use
    pub(crate) fn fetch_area_light_argument(
        &mut self,
        device: &mut dyn GraphicsDevice,
        slot: usize,
    ) -> Result<Arc<dyn ShaderArgument>> {
        fetch_light_argument(device, &self.area_lights_cb, &mut self.area_light_args, slot)
    }
}

/// Look up (or create and cache) the binding object selecting one light
/// slot of a light constant buffer. The cache grows to fit the highest
/// slot seen; previously returned arguments stay valid across growth.
fn fetch_light_argument(
    device: &mut dyn GraphicsDevice,
    lights_cb: &Arc<dyn ConstBuffer>,
    cache: &mut Vec<Option<Arc<dyn ShaderArgument>>>,
    slot: usize,
) -> Result<Arc<dyn ShaderArgument>> {
    if slot >= MAX_LIGHT_SLOTS {
        render_bail!(StateAssumption, "nova::SceneState",
            "light slot {} out of range (capacity {})", slot, MAX_LIGHT_SLOTS);
    }
    if slot >= cache.len() {
        cache.resize(slot + 1, None);
    }
    if let Some(argument) = &cache[slot] {
        return Ok(Arc::clone(argument));
    }
    let argument = device.create_shader_argument(&ShaderArgumentValue {
        const_buffers: vec![Arc::clone(lights_cb)],
        const_buffer_offsets: vec![slot as u64],
        ..Default::default()
    })?;
    cache[slot] = Some(Arc::clone(&argument));
    Ok(argument)
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
