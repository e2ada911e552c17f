/// Light records passed into `render()` each frame.
///
/// Lights are an explicit per-call parameter rather than pipeline state:
/// the slot index of a light is its position in the list, and the same
/// slot gets the same cached binding object on every frame.

use glam::{Vec3, Vec4};

use crate::error::Result;
use crate::render_bail;

/// Capacity of each per-scene light constant buffer
pub const MAX_LIGHT_SLOTS: usize = 128;

/// A punctual (point or directional) light
#[derive(Debug, Clone, Copy)]
pub struct PunctualLight {
    /// Position (w = 1) or direction toward the light (w = 0)
    pub pos_dir: Vec4,
    /// Linear RGB intensity (w unused)
    pub color: Vec4,
}

impl PunctualLight {
    /// Directional light shining along `-direction`
    pub fn directional(direction: Vec3, color: Vec4) -> Self {
        Self {
            pos_dir: direction.normalize().extend(0.0),
            color,
        }
    }

    /// Point light at a world position
    pub fn point(position: Vec3, color: Vec4) -> Self {
        Self {
            pos_dir: position.extend(1.0),
            color,
        }
    }
}

/// A spherical area light
#[derive(Debug, Clone, Copy)]
pub struct AreaLight {
    /// Sphere shape: center xyz, radius w
    pub shape: Vec4,
    /// Linear RGB intensity (w unused)
    pub color: Vec4,
}

impl AreaLight {
    /// Spherical emitter at a world position
    pub fn sphere(center: Vec3, radius: f32, color: Vec4) -> Self {
        Self {
            shape: center.extend(radius),
            color,
        }
    }
}

/// All lights contributing to one frame
#[derive(Debug, Clone, Default)]
pub struct FrameLights {
    /// Punctual lights; index in this list is the constant-buffer slot
    pub punctual: Vec<PunctualLight>,
    /// Area lights; index in this list is the constant-buffer slot
    pub area: Vec<AreaLight>,
}

impl FrameLights {
    /// Check both lists fit the fixed constant-buffer capacity
    pub(crate) fn validate(&self) -> Result<()> {
        if self.punctual.len() > MAX_LIGHT_SLOTS {
            render_bail!(StateAssumption, "nova::FrameLights",
                "{} punctual lights exceed the {} buffer slots",
                self.punctual.len(), MAX_LIGHT_SLOTS);
        }
        if self.area.len() > MAX_LIGHT_SLOTS {
            render_bail!(StateAssumption, "nova::FrameLights",
                "{} area lights exceed the {} buffer slots",
                self.area.len(), MAX_LIGHT_SLOTS);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "lights_tests.rs"]
mod tests;
