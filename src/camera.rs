use glam::Vec3A;

use crate::buffers::Camera;
use crate::error::{LayoutError, SceneError};

/// Camera as written in a scene file, before the image size is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAt {
    pub eye: Vec3A,
    pub center: Vec3A,
    pub up: Vec3A,
    /// Vertical field of view in degrees.
    pub vertical_fov: f32,
}

impl LookAt {
    pub fn to_camera(&self, viewport_width: i32, viewport_height: i32) -> Result<Camera, SceneError> {
        Camera::look_at(
            self.eye,
            self.center,
            self.up,
            self.vertical_fov,
            [viewport_width, viewport_height],
        )
    }
}

impl Camera {
    /// Builds the pinhole record with the image plane one unit in front of `eye`.
    ///
    /// `pixel_right` and `pixel_down` each span exactly one pixel on that plane
    /// and `image_plane_top_left` is the outer corner of the top-left pixel.
    pub fn look_at(
        eye: Vec3A,
        center: Vec3A,
        up: Vec3A,
        vertical_fov: f32,
        image_size: [i32; 2],
    ) -> Result<Camera, SceneError> {
        let [viewport_width, viewport_height] = image_size;
        if viewport_width <= 0 || viewport_height <= 0 {
            return Err(LayoutError::InvalidImageSize {
                width: viewport_width,
                height: viewport_height,
            }
            .into());
        }
        if !(vertical_fov > 0.0 && vertical_fov < 180.0) {
            return Err(SceneError::InvalidFieldOfView(vertical_fov));
        }

        // camera basis: w points backwards, u to the right, v up
        let w = (eye - center)
            .try_normalize()
            .ok_or(SceneError::DegenerateView)?;
        let u = up.cross(w).try_normalize().ok_or(SceneError::DegenerateUp)?;
        let v = w.cross(u);

        let half_height = (vertical_fov.to_radians() / 2.0).tan();
        let half_width = half_height * viewport_width as f32 / viewport_height as f32;

        let pixel_right = u * (2.0 * half_width / viewport_width as f32);
        let pixel_down = -v * (2.0 * half_height / viewport_height as f32);
        let image_plane_top_left = eye - w - u * half_width + v * half_height;

        Ok(Camera::new(eye, image_plane_top_left, pixel_right, pixel_down))
    }

    /// Unit vector through the center of the image plane.
    pub fn view_direction(&self) -> Vec3A {
        let [width, height] = self.plane_extent();
        let center = Vec3A::from(self.image_plane_top_left)
            + Vec3A::from(self.pixel_right) * (width / 2.0)
            + Vec3A::from(self.pixel_down) * (height / 2.0);
        (center - Vec3A::from(self.origin)).normalize_or_zero()
    }

    // image plane sits at unit distance, so its size in pixels follows from the corner offset
    fn plane_extent(&self) -> [f32; 2] {
        let corner = Vec3A::from(self.image_plane_top_left) - Vec3A::from(self.origin);
        let right = Vec3A::from(self.pixel_right);
        let down = Vec3A::from(self.pixel_down);
        [
            -2.0 * corner.dot(right) / right.length_squared(),
            -2.0 * corner.dot(down) / down.length_squared(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::vec3a;

    fn camera() -> Camera {
        Camera::look_at(
            vec3a(0.0, 0.0, 5.0),
            Vec3A::ZERO,
            Vec3A::Y,
            90.0,
            [200, 100],
        )
        .unwrap()
    }

    #[test]
    fn pixel_steps_are_orthogonal_to_view() {
        let camera = camera();
        let view = camera.view_direction();

        assert!(view.abs_diff_eq(Vec3A::NEG_Z, 1e-5));
        assert_relative_eq!(Vec3A::from(camera.pixel_right).dot(view), 0.0, epsilon = 1e-6);
        assert_relative_eq!(Vec3A::from(camera.pixel_down).dot(view), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn pixel_steps_span_one_pixel() {
        let camera = camera();

        // fov 90 gives a plane 2 units tall at unit distance, 4 units wide at 2:1
        assert_relative_eq!(Vec3A::from(camera.pixel_down).length(), 2.0 / 100.0, epsilon = 1e-6);
        assert_relative_eq!(Vec3A::from(camera.pixel_right).length(), 4.0 / 200.0, epsilon = 1e-6);
        assert!(Vec3A::from(camera.pixel_right).abs_diff_eq(Vec3A::X * 0.02, 1e-6));
        assert!(Vec3A::from(camera.pixel_down).abs_diff_eq(Vec3A::NEG_Y * 0.02, 1e-6));
    }

    #[test]
    fn top_left_corner_is_up_and_left() {
        let camera = camera();
        assert!(Vec3A::from(camera.image_plane_top_left).abs_diff_eq(vec3a(-2.0, 1.0, 4.0), 1e-5));
    }

    #[test]
    fn rejects_degenerate_descriptions() {
        assert_eq!(
            Camera::look_at(Vec3A::ONE, Vec3A::ONE, Vec3A::Y, 45.0, [10, 10]),
            Err(SceneError::DegenerateView)
        );
        assert_eq!(
            Camera::look_at(Vec3A::Y, Vec3A::ZERO, Vec3A::Y, 45.0, [10, 10]),
            Err(SceneError::DegenerateUp)
        );
        assert_eq!(
            Camera::look_at(Vec3A::Z, Vec3A::ZERO, Vec3A::Y, 180.0, [10, 10]),
            Err(SceneError::InvalidFieldOfView(180.0))
        );
        assert!(Camera::look_at(Vec3A::Z, Vec3A::ZERO, Vec3A::Y, 45.0, [0, 10]).is_err());
    }

    #[test]
    fn look_at_waits_for_image_size() {
        let look_at = LookAt {
            eye: Vec3A::Z,
            center: Vec3A::ZERO,
            up: Vec3A::Y,
            vertical_fov: 60.0,
        };

        let square = look_at.to_camera(100, 100).unwrap();
        let wide = look_at.to_camera(300, 100).unwrap();
        assert_relative_eq!(
            Vec3A::from(square.pixel_down).length(),
            Vec3A::from(wide.pixel_down).length(),
            epsilon = 1e-7
        );
    }
}
