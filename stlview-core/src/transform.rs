/// Model transformations and rotation state
use nalgebra::{Matrix4, Vector3};

use crate::geometry::Bounds;

/// Largest extent of a model after fitting
const FIT_SIZE: f32 = 2.0;

/// Rotation about the X and Y axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}

/// Transform builder for model matrices
pub struct Transform;

impl Transform {
    /// Rotation about X, then about Y
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));

        rx * ry
    }

    /// Center the bounds on the origin and scale the largest extent to a
    /// fixed size, so any model is framed by the fixed camera.
    pub fn fit_matrix(bounds: &Bounds) -> Matrix4<f32> {
        let center = bounds.center();
        let largest = bounds.extent().max();
        let scale = if largest > f32::EPSILON {
            FIT_SIZE / largest
        } else {
            1.0
        };

        Matrix4::new_scaling(scale) * Matrix4::new_translation(&-center.coords)
    }
}
