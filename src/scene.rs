use std::fmt;

use glam::Vec3A;

use crate::buffers::{
    BoundingBox, Camera, DirectionalLight, Material, PointLight, Quadlight, SceneData, Sphere,
};
use crate::error::{LayoutError, SceneError};

/// Host-side scene: render settings, geometry and lights.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    // render settings
    pub max_depth: i32,
    pub image_size: [i32; 2],
    pub output_name: String,
    pub spp: i32,
    pub light_samples: i32,
    pub nee_on: bool,
    pub rr_on: bool,

    pub camera: Option<Camera>,

    // geometry
    pub tri_verts: Vec<Vec3A>,
    pub tri_materials: Vec<Material>,
    pub spheres: Vec<Sphere>,
    pub sphere_bounding_boxes: Vec<BoundingBox>,

    // lights, only reachable through `add_*` so the placeholder flags stay in step
    directional_lights: Vec<DirectionalLight>,
    directional_light_padded: bool,
    point_lights: Vec<PointLight>,
    point_light_padded: bool,
    quad_lights: Vec<Quadlight>,
    quad_light_padded: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Scene {
            max_depth: 5,
            image_size: [400, 400],
            output_name: "output.png".to_string(),
            spp: 1,
            light_samples: 1,
            nee_on: false,
            rr_on: false,
            camera: None,
            tri_verts: vec![],
            tri_materials: vec![],
            spheres: vec![],
            sphere_bounding_boxes: vec![],
            directional_lights: vec![],
            directional_light_padded: false,
            point_lights: vec![],
            point_light_padded: false,
            quad_lights: vec![],
            quad_light_padded: false,
        }
    }
}

impl Scene {
    pub fn new() -> Scene {
        Scene::default()
    }

    pub fn pixel_count(&self) -> usize {
        self.image_size[0].max(0) as usize * self.image_size[1].max(0) as usize
    }

    pub fn triangle_count(&self) -> usize {
        self.tri_materials.len()
    }

    pub fn add_triangle(&mut self, vertices: [Vec3A; 3], material: Material) {
        self.tri_verts.extend_from_slice(&vertices);
        self.tri_materials.push(material);
    }

    pub fn add_sphere(&mut self, sphere: Sphere) {
        self.sphere_bounding_boxes.push(sphere.bounding_box());
        self.spheres.push(sphere);
    }

    pub fn add_directional_light(&mut self, light: DirectionalLight) {
        if self.directional_light_padded {
            self.directional_lights.clear();
            self.directional_light_padded = false;
        }
        self.directional_lights.push(light);
    }

    pub fn add_point_light(&mut self, light: PointLight) {
        if self.point_light_padded {
            self.point_lights.clear();
            self.point_light_padded = false;
        }
        self.point_lights.push(light);
    }

    pub fn add_quad_light(&mut self, light: Quadlight) -> Result<(), LayoutError> {
        light.validate()?;
        if self.quad_light_padded {
            self.quad_lights.clear();
            self.quad_light_padded = false;
        }
        self.quad_lights.push(light);
        Ok(())
    }

    /// Directional light records as bound, placeholder included.
    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub fn quad_lights(&self) -> &[Quadlight] {
        &self.quad_lights
    }

    pub fn directional_lights_count(&self) -> usize {
        padded_count(self.directional_lights.len(), self.directional_light_padded)
    }

    pub fn point_lights_count(&self) -> usize {
        padded_count(self.point_lights.len(), self.point_light_padded)
    }

    pub fn quad_lights_count(&self) -> usize {
        padded_count(self.quad_lights.len(), self.quad_light_padded)
    }

    pub fn shadow_rays_per_pixel(&self) -> usize {
        self.directional_lights_count()
            + self.point_lights_count()
            + self.quad_lights_count() * self.light_samples.max(0) as usize
    }

    pub fn is_complete(&self) -> bool {
        self.camera.is_some()
    }

    /// Adds an invisible light to every empty light list so that no GPU
    /// buffer is bound with zero length. Counts keep excluding them.
    pub fn make_light_placeholders(&mut self) {
        if self.directional_lights.is_empty() {
            self.directional_lights.push(DirectionalLight::placeholder());
            self.directional_light_padded = true;
        }

        if self.point_lights.is_empty() {
            self.point_lights.push(PointLight::placeholder());
            self.point_light_padded = true;
        }

        if self.quad_lights.is_empty() {
            self.quad_lights.push(Quadlight::placeholder());
            self.quad_light_padded = true;
        }
    }

    pub fn scene_data(&self) -> Result<SceneData, SceneError> {
        let camera = self.camera.ok_or(SceneError::MissingCamera)?;

        let data = SceneData {
            camera,
            image_size: self.image_size,
            quad_light_count: count("quad_light_count", self.quad_lights_count())?,
            direct_light_count: count("direct_light_count", self.directional_lights_count())?,
            point_light_count: count("point_light_count", self.point_lights_count())?,
            light_samples: self.light_samples,
            nee_on: self.nee_on.into(),
            rr_on: self.rr_on.into(),
            max_depth: self.max_depth,
            spp: self.spp,
            _padding: [0; 8],
        };

        data.validate()?;
        Ok(data)
    }
}

fn padded_count(len: usize, padded: bool) -> usize {
    if padded {
        len.saturating_sub(1)
    } else {
        len
    }
}

fn count(field: &'static str, value: usize) -> Result<i32, SceneError> {
    i32::try_from(value).map_err(|_| SceneError::CountOverflow { field, value })
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "maxDepth: \t{}", self.max_depth)?;
        writeln!(f, "imageSize: \t{}x{}", self.image_size[0], self.image_size[1])?;
        writeln!(f, "outputName: \t{}", self.output_name)?;
        writeln!(f, "spp: \t\t{}", self.spp)?;
        writeln!(f, "lightsamples: \t{}", self.light_samples)?;
        writeln!(f, "nee: \t\t{}", if self.nee_on { "on" } else { "off" })?;
        writeln!(f, "rr: \t\t{}", if self.rr_on { "on" } else { "off" })?;
        writeln!(f, "triangles: \t{}", self.triangle_count())?;
        writeln!(f, "spheres: \t{}", self.spheres.len())?;
        write!(
            f,
            "lights: \t{} directional, {} point, {} quad",
            self.directional_lights_count(),
            self.point_lights_count(),
            self.quad_lights_count()
        )
    }
}
