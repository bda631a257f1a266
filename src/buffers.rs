use glam::{Mat4, Vec3A};

use crate::error::LayoutError;

/// Largest element-wise deviation from identity allowed for `inverse * forward`.
pub const INVERSE_TOLERANCE: f32 = 1e-5;

/// 32-bit boolean as stored by the shaders, 0 or 1.
#[repr(transparent)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Flag(i32);

impl Flag {
    pub const OFF: Flag = Flag(0);
    pub const ON: Flag = Flag(1);

    pub fn is_on(self) -> bool {
        self.0 == 1
    }

    pub fn raw(self) -> i32 {
        self.0
    }

    fn validate(self, field: &'static str) -> Result<(), LayoutError> {
        match self.0 {
            0 | 1 => Ok(()),
            value => Err(LayoutError::InvalidFlag { field, value }),
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::ON
        } else {
            Flag::OFF
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Camera {
    pub origin: [f32; 3],              // vec3, 12 bytes
    _padding: [u8; 4],                 // padding to ensure 16-byte stride
    pub image_plane_top_left: [f32; 3], // vec3, 12 bytes
    _padding2: [u8; 4],                // padding to ensure 16-byte stride
    pub pixel_right: [f32; 3],         // vec3, 12 bytes
    _padding3: [u8; 4],                // padding to ensure 16-byte stride
    pub pixel_down: [f32; 3],          // vec3, 12 bytes
    _padding4: [u8; 4],                // padding to ensure 16-byte stride
}

impl Camera {
    pub fn new(
        origin: Vec3A,
        image_plane_top_left: Vec3A,
        pixel_right: Vec3A,
        pixel_down: Vec3A,
    ) -> Camera {
        Camera {
            origin: origin.into(),
            _padding: [0; 4],
            image_plane_top_left: image_plane_top_left.into(),
            _padding2: [0; 4],
            pixel_right: pixel_right.into(),
            _padding3: [0; 4],
            pixel_down: pixel_down.into(),
            _padding4: [0; 4],
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Material {
    pub diffuse: [f32; 3],  // vec3, 12 bytes
    _padding: [u8; 4],      // padding to ensure 16-byte stride
    pub specular: [f32; 3], // vec3, 12 bytes
    _padding2: [u8; 4],     // padding to ensure 16-byte stride
    pub emission: [f32; 3], // vec3, 12 bytes
    _padding3: [u8; 4],     // padding to ensure 16-byte stride
    pub ambient: [f32; 3],  // vec3, 12 bytes
    _padding4: [u8; 4],     // padding to ensure 16-byte stride
    pub shininess: f32,     // f32, 4 bytes
    pub roughness: f32,     // f32, 4 bytes
    _padding5: [u8; 8],     // padding to ensure 16-byte alignment
}

impl Material {
    pub fn new(
        diffuse: Vec3A,
        specular: Vec3A,
        emission: Vec3A,
        ambient: Vec3A,
        shininess: f32,
        roughness: f32,
    ) -> Material {
        Material {
            diffuse: diffuse.into(),
            _padding: [0; 4],
            specular: specular.into(),
            _padding2: [0; 4],
            emission: emission.into(),
            _padding3: [0; 4],
            ambient: ambient.into(),
            _padding4: [0; 4],
            shininess,
            roughness,
            _padding5: [0; 8],
        }
    }
}

/// Light arriving from `direction`, i.e. the vector points towards the light.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLight {
    pub direction: [f32; 3],  // vec3, 12 bytes
    _padding: [u8; 4],        // padding to ensure 16-byte stride
    pub brightness: [f32; 3], // vec3, 12 bytes
    _padding2: [u8; 4],       // padding to ensure 16-byte stride
}

impl DirectionalLight {
    pub fn new(direction: Vec3A, brightness: Vec3A) -> DirectionalLight {
        DirectionalLight {
            direction: direction.into(),
            _padding: [0; 4],
            brightness: brightness.into(),
            _padding2: [0; 4],
        }
    }

    /// Black light used to keep the light buffer non-empty.
    pub fn placeholder() -> DirectionalLight {
        DirectionalLight::new(Vec3A::X, Vec3A::ZERO)
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLight {
    pub position: [f32; 3],   // vec3, 12 bytes
    _padding: [u8; 4],        // padding to ensure 16-byte stride
    pub brightness: [f32; 3], // vec3, 12 bytes
    _padding2: [u8; 4],       // padding to ensure 16-byte stride
}

impl PointLight {
    pub fn new(position: Vec3A, brightness: Vec3A) -> PointLight {
        PointLight {
            position: position.into(),
            _padding: [0; 4],
            brightness: brightness.into(),
            _padding2: [0; 4],
        }
    }

    pub fn placeholder() -> PointLight {
        PointLight::new(Vec3A::ZERO, Vec3A::ZERO)
    }
}

/// Parallelogram area light spanned by `ab` and `ac` from corner `a`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Quadlight {
    pub a: [f32; 3],         // vec3, 12 bytes
    _padding: [u8; 4],       // padding to ensure 16-byte stride
    pub ab: [f32; 3],        // vec3, 12 bytes
    _padding2: [u8; 4],      // padding to ensure 16-byte stride
    pub ac: [f32; 3],        // vec3, 12 bytes
    _padding3: [u8; 4],      // padding to ensure 16-byte stride
    pub intensity: [f32; 3], // vec3, 12 bytes
    _padding4: [u8; 4],      // padding to ensure 16-byte stride
}

impl Quadlight {
    pub fn new(a: Vec3A, ab: Vec3A, ac: Vec3A, intensity: Vec3A) -> Result<Quadlight, LayoutError> {
        let light = Quadlight::new_unchecked(a, ab, ac, intensity);
        light.validate()?;
        Ok(light)
    }

    fn new_unchecked(a: Vec3A, ab: Vec3A, ac: Vec3A, intensity: Vec3A) -> Quadlight {
        Quadlight {
            a: a.into(),
            _padding: [0; 4],
            ab: ab.into(),
            _padding2: [0; 4],
            ac: ac.into(),
            _padding3: [0; 4],
            intensity: intensity.into(),
            _padding4: [0; 4],
        }
    }

    /// Zero-sized black quad. Only ever stored behind a light count of 0.
    pub fn placeholder() -> Quadlight {
        Quadlight::new_unchecked(Vec3A::ZERO, Vec3A::ZERO, Vec3A::ZERO, Vec3A::ZERO)
    }

    fn edge_cross(&self) -> Vec3A {
        Vec3A::from(self.ab).cross(Vec3A::from(self.ac))
    }

    pub fn area(&self) -> f32 {
        self.edge_cross().length()
    }

    /// Unit normal following the right-hand rule on `ab` then `ac`.
    pub fn normal(&self) -> Vec3A {
        self.edge_cross().normalize_or_zero()
    }

    pub fn is_degenerate(&self) -> bool {
        let area = self.area();
        !(area.is_finite() && area > 0.0)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.is_degenerate() {
            return Err(LayoutError::DegenerateQuadLight);
        }
        Ok(())
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneData {
    pub camera: Camera,            // 64 bytes
    pub image_size: [i32; 2],      // ivec2, 8 bytes
    pub quad_light_count: i32,     // i32, 4 bytes
    pub direct_light_count: i32,   // i32, 4 bytes
    pub point_light_count: i32,    // i32, 4 bytes
    pub light_samples: i32,        // i32, 4 bytes
    pub nee_on: Flag,              // i32, 4 bytes
    pub rr_on: Flag,               // i32, 4 bytes
    pub max_depth: i32,            // i32, 4 bytes
    pub spp: i32,                  // i32, 4 bytes
    pub _padding: [u8; 8],         // padding to ensure 16-byte alignment
}

impl SceneData {
    pub fn width(&self) -> i32 {
        self.image_size[0]
    }

    pub fn height(&self) -> i32 {
        self.image_size[1]
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        let [width, height] = self.image_size;
        if width <= 0 || height <= 0 {
            return Err(LayoutError::InvalidImageSize { width, height });
        }

        let counts = [
            ("quad_light_count", self.quad_light_count),
            ("direct_light_count", self.direct_light_count),
            ("point_light_count", self.point_light_count),
            ("light_samples", self.light_samples),
            ("max_depth", self.max_depth),
            ("spp", self.spp),
        ];
        for (field, value) in counts {
            if value < 0 {
                return Err(LayoutError::NegativeCount { field, value });
            }
        }

        self.nee_on.validate("nee_on")?;
        self.rr_on.validate("rr_on")?;
        Ok(())
    }
}

/// One quantized framebuffer pixel.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RGBData {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RGBData {
    pub const BLACK: RGBData = RGBData {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    /// Quantizes a linear color, clamping every channel into [0, 255].
    pub fn from_color(color: Vec3A) -> RGBData {
        RGBData {
            r: quantize(color.x),
            g: quantize(color.y),
            b: quantize(color.z),
            a: 255,
        }
    }
}

// NaN survives clamp and then casts to 0
fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0) as u8
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Sphere {
    pub transformation: [[f32; 4]; 4],         // mat4x4, column-major, 64 bytes
    pub inverse_transformation: [[f32; 4]; 4], // mat4x4, column-major, 64 bytes
    pub material: Material,                    // 80 bytes
}

impl Sphere {
    /// `transformation` maps the canonical unit sphere into world space.
    pub fn new(transformation: Mat4, material: Material) -> Result<Sphere, LayoutError> {
        let determinant = transformation.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(LayoutError::SingularTransform);
        }

        let sphere = Sphere {
            transformation: transformation.to_cols_array_2d(),
            // inverted in f64, small radii otherwise lose most of the f32 mantissa
            inverse_transformation: transformation
                .as_dmat4()
                .inverse()
                .as_mat4()
                .to_cols_array_2d(),
            material,
        };
        sphere.validate(INVERSE_TOLERANCE)?;
        Ok(sphere)
    }

    pub fn forward(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transformation)
    }

    pub fn inverse(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.inverse_transformation)
    }

    /// Checks `inverse * forward == I` entry-wise.
    ///
    /// `tolerance` is relative: it is scaled by the largest entries of both
    /// matrices, so a tiny sphere far from the origin passes as readily as
    /// a unit sphere at the origin.
    pub fn validate(&self, tolerance: f32) -> Result<(), LayoutError> {
        let (forward, inverse) = (self.forward(), self.inverse());
        let error = max_abs(inverse * forward - Mat4::IDENTITY);
        let tolerance = tolerance * (max_abs(forward) * max_abs(inverse)).max(1.0);

        if error.is_nan() || !tolerance.is_finite() || error > tolerance {
            return Err(LayoutError::InverseMismatch { error, tolerance });
        }
        Ok(())
    }

    /// World-space bounds of the transformed unit sphere.
    pub fn bounding_box(&self) -> BoundingBox {
        let forward = self.forward();
        let corners = (0..8).map(|corner| {
            let local = Vec3A::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            forward.transform_point3a(local)
        });

        BoundingBox::from_points(corners)
    }
}

fn max_abs(matrix: Mat4) -> f32 {
    matrix
        .to_cols_array()
        .iter()
        .fold(0.0_f32, |max, value| max.max(value.abs()))
}

/// Axis-aligned box with packed (unpadded) float3 corners.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoundingBox {
    pub min: [f32; 3], // packed vec3, 12 bytes
    pub max: [f32; 3], // packed vec3, 12 bytes
}

impl BoundingBox {
    pub fn from_points(points: impl IntoIterator<Item = Vec3A>) -> BoundingBox {
        let (min, max) = points.into_iter().fold(
            (Vec3A::splat(f32::MAX), Vec3A::splat(f32::MIN)),
            |(min, max), point| (min.min(point), max.max(point)),
        );

        BoundingBox {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn contains(&self, point: Vec3A) -> bool {
        point.cmpge(Vec3A::from(self.min)).all() && point.cmple(Vec3A::from(self.max)).all()
    }
}

/// Triangle vertex slot, stored with a float3 stride of 16 bytes.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3], // vec3, 12 bytes
    _padding: [u8; 4],      // padding to ensure 16-byte stride
}

impl From<Vec3A> for Vertex {
    fn from(position: Vec3A) -> Self {
        Vertex {
            position: position.into(),
            _padding: [0; 4],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::vec3a;
    use std::mem::{offset_of, size_of};

    fn scene_data() -> SceneData {
        SceneData {
            camera: Camera::new(Vec3A::ZERO, vec3a(-1.0, 1.0, -1.0), Vec3A::X, Vec3A::NEG_Y),
            image_size: [640, 480],
            quad_light_count: 1,
            direct_light_count: 2,
            point_light_count: 3,
            light_samples: 4,
            nee_on: Flag::ON,
            rr_on: Flag::OFF,
            max_depth: 5,
            spp: 16,
            _padding: [0; 8],
        }
    }

    #[test]
    fn record_sizes_match_shader_layout() {
        assert_eq!(size_of::<Camera>(), 64);
        assert_eq!(size_of::<Material>(), 80);
        assert_eq!(size_of::<DirectionalLight>(), 32);
        assert_eq!(size_of::<PointLight>(), 32);
        assert_eq!(size_of::<Quadlight>(), 64);
        assert_eq!(size_of::<SceneData>(), 112);
        assert_eq!(size_of::<RGBData>(), 4);
        assert_eq!(size_of::<Sphere>(), 208);
        assert_eq!(size_of::<BoundingBox>(), 24);
        assert_eq!(size_of::<Vertex>(), 16);
    }

    #[test]
    fn field_offsets_match_shader_layout() {
        assert_eq!(offset_of!(Camera, pixel_down), 48);
        assert_eq!(offset_of!(Material, ambient), 48);
        assert_eq!(offset_of!(Material, shininess), 64);
        assert_eq!(offset_of!(Material, roughness), 68);
        assert_eq!(offset_of!(Quadlight, intensity), 48);
        assert_eq!(offset_of!(SceneData, image_size), 64);
        assert_eq!(offset_of!(SceneData, quad_light_count), 72);
        assert_eq!(offset_of!(SceneData, light_samples), 84);
        assert_eq!(offset_of!(SceneData, nee_on), 88);
        assert_eq!(offset_of!(SceneData, rr_on), 92);
        assert_eq!(offset_of!(SceneData, max_depth), 96);
        assert_eq!(offset_of!(SceneData, spp), 100);
        assert_eq!(offset_of!(Sphere, inverse_transformation), 64);
        assert_eq!(offset_of!(Sphere, material), 128);
    }

    #[test]
    fn scene_data_survives_byte_round_trip() {
        let data = scene_data();
        let bytes = bytemuck::bytes_of(&data).to_vec();
        let read: SceneData = bytemuck::pod_read_unaligned(&bytes);

        assert_eq!(read, data);
        assert_eq!(&bytes[88..92], &1_i32.to_ne_bytes());
    }

    fn assert_byte_round_trip<T: bytemuck::Pod + PartialEq + std::fmt::Debug>(record: T) {
        let bytes = bytemuck::bytes_of(&record).to_vec();
        assert_eq!(bytes.len(), size_of::<T>());
        assert_eq!(bytemuck::pod_read_unaligned::<T>(&bytes), record);
    }

    #[test]
    fn every_record_survives_byte_round_trip() {
        let material = Material::new(
            vec3a(0.1, 0.2, 0.3),
            vec3a(0.4, 0.5, 0.6),
            vec3a(0.7, 0.8, 0.9),
            vec3a(0.05, 0.05, 0.05),
            32.0,
            0.25,
        );
        assert_byte_round_trip(material);
        assert_byte_round_trip(scene_data().camera);
        assert_byte_round_trip(DirectionalLight::new(vec3a(0.0, 1.0, 1.0), Vec3A::splat(0.5)));
        assert_byte_round_trip(PointLight::new(vec3a(1.0, 2.0, 3.0), vec3a(4.0, 5.0, 6.0)));
        assert_byte_round_trip(
            Quadlight::new(vec3a(-1.0, 2.0, 0.0), Vec3A::X, Vec3A::Z, Vec3A::splat(3.0)).unwrap(),
        );
        assert_byte_round_trip(RGBData::from_color(vec3a(0.25, 0.5, 1.0)));
        assert_byte_round_trip(BoundingBox::from_points([
            vec3a(-1.0, 0.0, 2.0),
            vec3a(3.0, 4.0, 5.0),
        ]));
        assert_byte_round_trip(Vertex::from(vec3a(7.0, -8.0, 9.0)));
        assert_byte_round_trip(
            Sphere::new(Mat4::from_translation(glam::vec3(0.0, 0.0, -1.0)), material).unwrap(),
        );
    }

    #[test]
    fn material_bytes_land_at_field_offsets() {
        let material = Material::new(Vec3A::X, Vec3A::Y, Vec3A::Z, Vec3A::ONE, 8.0, 0.5);
        let bytes = bytemuck::bytes_of(&material);

        assert_eq!(&bytes[0..4], &1.0_f32.to_ne_bytes());
        assert_eq!(&bytes[12..16], &[0; 4]);
        assert_eq!(&bytes[20..24], &1.0_f32.to_ne_bytes());
        assert_eq!(&bytes[64..68], &8.0_f32.to_ne_bytes());
        assert_eq!(&bytes[68..72], &0.5_f32.to_ne_bytes());
        assert_eq!(&bytes[72..80], &[0; 8]);
    }

    #[test]
    fn scene_data_rejects_negative_counts_and_bad_flags() {
        assert!(scene_data().validate().is_ok());

        let mut negative = scene_data();
        negative.spp = -1;
        assert_eq!(
            negative.validate(),
            Err(LayoutError::NegativeCount {
                field: "spp",
                value: -1
            })
        );

        let mut bytes = bytemuck::bytes_of(&scene_data()).to_vec();
        bytes[92..96].copy_from_slice(&2_i32.to_ne_bytes());
        let corrupted: SceneData = bytemuck::pod_read_unaligned(&bytes);
        assert_eq!(
            corrupted.validate(),
            Err(LayoutError::InvalidFlag {
                field: "rr_on",
                value: 2
            })
        );

        let mut empty = scene_data();
        empty.image_size = [0, 480];
        assert!(matches!(
            empty.validate(),
            Err(LayoutError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn flag_keeps_integer_encoding() {
        assert_eq!(Flag::from(true).raw(), 1);
        assert_eq!(Flag::from(false).raw(), 0);
        assert!(Flag::ON.is_on());
    }

    #[test]
    fn sphere_inverse_is_exact_inverse() {
        let transform = Mat4::from_translation(glam::vec3(1.0, -2.0, 3.0))
            * Mat4::from_axis_angle(glam::Vec3::Y, 0.7)
            * Mat4::from_scale(glam::vec3(2.0, 0.5, 1.5));
        let sphere = Sphere::new(transform, Material::default()).unwrap();

        assert!(sphere.validate(INVERSE_TOLERANCE).is_ok());
        assert!((sphere.inverse() * sphere.forward()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn sphere_rejects_singular_and_mismatched_transforms() {
        let flat = Mat4::from_scale(glam::vec3(1.0, 0.0, 1.0));
        assert_eq!(
            Sphere::new(flat, Material::default()),
            Err(LayoutError::SingularTransform)
        );

        let mut sphere = Sphere::new(Mat4::IDENTITY, Material::default()).unwrap();
        sphere.inverse_transformation = Mat4::from_scale(glam::Vec3::splat(2.0)).to_cols_array_2d();
        assert!(matches!(
            sphere.validate(INVERSE_TOLERANCE),
            Err(LayoutError::InverseMismatch { .. })
        ));
    }

    #[test]
    fn small_spheres_far_from_origin_keep_a_valid_inverse() {
        for (center, radius) in [(100.0, 0.1), (10.0, 0.01), (1000.0, 0.5), (0.0, 1e-3)] {
            let transform = Mat4::from_translation(glam::vec3(center, 0.0, 0.0))
                * Mat4::from_scale(glam::Vec3::splat(radius));
            let sphere = Sphere::new(transform, Material::default()).unwrap();

            assert!(sphere.validate(INVERSE_TOLERANCE).is_ok());
            let local = sphere
                .inverse()
                .transform_point3a(vec3a(center + radius, 0.0, 0.0));
            assert!(local.abs_diff_eq(Vec3A::X, 1e-3));
        }
    }

    #[test]
    fn sphere_bounding_box_covers_transformed_sphere() {
        let transform = Mat4::from_translation(glam::vec3(0.0, 1.0, 0.0))
            * Mat4::from_scale(glam::Vec3::splat(2.0));
        let bounds = Sphere::new(transform, Material::default())
            .unwrap()
            .bounding_box();

        assert_eq!(bounds.min, [-2.0, -1.0, -2.0]);
        assert_eq!(bounds.max, [2.0, 3.0, 2.0]);
        assert!(bounds.contains(vec3a(0.0, 2.9, 0.0)));
        assert!(!bounds.contains(vec3a(0.0, 3.1, 0.0)));
    }

    #[test]
    fn quadlight_detects_degenerate_edges() {
        let quad = Quadlight::new(Vec3A::ZERO, Vec3A::X, Vec3A::Z * 2.0, Vec3A::ONE).unwrap();
        assert_relative_eq!(quad.area(), 2.0);
        assert_eq!(quad.normal(), Vec3A::NEG_Y);

        assert_eq!(
            Quadlight::new(Vec3A::ZERO, Vec3A::X, Vec3A::X * 3.0, Vec3A::ONE),
            Err(LayoutError::DegenerateQuadLight)
        );
        assert!(Quadlight::placeholder().is_degenerate());
    }

    #[test]
    fn rgb_quantization_clamps_without_wrapping() {
        assert_eq!(
            RGBData::from_color(vec3a(2.0, -1.0, 0.5)),
            RGBData {
                r: 255,
                g: 0,
                b: 127,
                a: 255
            }
        );
        assert_eq!(RGBData::from_color(Vec3A::splat(f32::NAN)).r, 0);
        assert_eq!(RGBData::from_color(Vec3A::splat(f32::INFINITY)).g, 255);
    }
}
