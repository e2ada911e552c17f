/// Camera — passive input value for `transform_viewport`.
///
/// The camera computes nothing beyond composing its matrices. The caller
/// (viewer/application glue) computes and sets the view matrix and both
/// projection variants; the pipeline picks the variant matching the
/// device's depth-range convention.

use glam::{Mat4, Vec3, Vec4};

/// Camera state supplied by the caller each time the view changes.
///
/// Two projection variants are carried because backends differ in
/// clip-space depth range: `projection` maps depth to [-1,1],
/// `projection_half_z` maps it to [0,1].
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    projection_matrix_half_z: Mat4,
}

impl Camera {
    /// Create a camera from caller-computed matrices
    pub fn new(position: Vec3, view: Mat4, projection: Mat4, projection_half_z: Mat4) -> Self {
        Self {
            position,
            view_matrix: view,
            projection_matrix: projection,
            projection_matrix_half_z: projection_half_z,
        }
    }

    /// World-space camera position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Position as a homogeneous point (w = 1), the form constant buffers use
    pub fn position_h(&self) -> Vec4 {
        self.position.extend(1.0)
    }

    /// View matrix (inverse of the camera's world transform)
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// View-projection with full-range clip depth
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// View-projection with [0,1] clip depth
    pub fn view_proj_half_z(&self) -> Mat4 {
        self.projection_matrix_half_z * self.view_matrix
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
