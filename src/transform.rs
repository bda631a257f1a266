use glam::{Mat4, Vec3};

use crate::error::SceneError;

/// Nested model transforms as used by the scene file.
///
/// Every operation right-multiplies the current top, so the transform
/// written last in the file is the first one applied to the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStack {
    stack: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        TransformStack {
            stack: vec![Mat4::IDENTITY],
        }
    }
}

impl TransformStack {
    pub fn new() -> TransformStack {
        TransformStack::default()
    }

    pub fn top(&self) -> Mat4 {
        self.stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self) {
        let top = self.top();
        self.stack.push(top);
    }

    pub fn pop(&mut self) -> Result<Mat4, SceneError> {
        if self.stack.len() <= 1 {
            return Err(SceneError::TransformStackUnderflow);
        }
        Ok(self.stack.pop().unwrap_or(Mat4::IDENTITY))
    }

    fn apply(&mut self, transform: Mat4) {
        if let Some(top) = self.stack.last_mut() {
            *top *= transform;
        }
    }

    pub fn translate(&mut self, displacement: Vec3) {
        self.apply(Mat4::from_translation(displacement));
    }

    pub fn rotate(&mut self, axis: Vec3, degrees: f32) -> Result<(), SceneError> {
        let axis = axis.try_normalize().ok_or(SceneError::ZeroRotationAxis)?;
        self.apply(Mat4::from_axis_angle(axis, degrees.to_radians()));
        Ok(())
    }

    pub fn scale(&mut self, scale: Vec3) {
        self.apply(Mat4::from_scale(scale));
    }
}
