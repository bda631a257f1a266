//! Reader for the line-oriented `.test` scene description format.
//!
//! One command per line, arguments separated by whitespace, `#` starts a
//! comment line. Geometry and lights pick up the transform and material
//! state that is current when they are declared.

use std::fs;
use std::path::Path;

use glam::{Mat4, Vec3, Vec3A};
use log::{debug, warn};

use crate::buffers::{DirectionalLight, Material, PointLight, Quadlight, Sphere};
use crate::camera::LookAt;
use crate::error::{LoadError, SceneError};
use crate::scene::Scene;
use crate::transform::TransformStack;

/// Commands from the format that this host does not act on.
const IGNORED_COMMANDS: &[&str] = &[
    "integrator",
    "lightstratify",
    "importancesampling",
    "brdf",
    "gamma",
    "attenuation",
];

/// `maxverts` is only a capacity hint; larger values are not preallocated.
const MAX_RESERVED_VERTICES: usize = 1 << 20;

pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("loading scene from {}", path.display());
    SceneLoader::new().parse(&text)
}

pub fn parse_scene(text: &str) -> Result<Scene, LoadError> {
    SceneLoader::new().parse(text)
}

#[derive(Debug, Clone, Copy)]
struct MaterialState {
    diffuse: Vec3A,
    specular: Vec3A,
    emission: Vec3A,
    ambient: Vec3A,
    shininess: f32,
    roughness: f32,
}

impl Default for MaterialState {
    fn default() -> Self {
        MaterialState {
            diffuse: Vec3A::ZERO,
            specular: Vec3A::ZERO,
            emission: Vec3A::ZERO,
            ambient: Vec3A::ZERO,
            shininess: 1.0,
            roughness: 1.0,
        }
    }
}

impl MaterialState {
    fn material(&self) -> Material {
        Material::new(
            self.diffuse,
            self.specular,
            self.emission,
            self.ambient,
            self.shininess,
            self.roughness,
        )
    }
}

#[derive(Debug, Default)]
pub struct SceneLoader {
    transforms: TransformStack,
    material: MaterialState,
    vertices: Vec<Vec3A>,
    look_at: Option<(usize, LookAt)>,
}

struct Line<'a> {
    number: usize,
    command: &'a str,
    args: Vec<&'a str>,
}

impl Line<'_> {
    fn expect(&self, count: usize) -> Result<(), LoadError> {
        if self.args.len() < count {
            return Err(LoadError::ArgumentCount {
                line: self.number,
                command: self.command.to_string(),
                expected: count,
                actual: self.args.len(),
            });
        }
        if self.args.len() > count {
            warn!(
                "line {}: ignoring {} extra argument(s) to `{}`",
                self.number,
                self.args.len() - count,
                self.command
            );
        }
        Ok(())
    }

    fn invalid(&self, value: &str) -> LoadError {
        LoadError::InvalidArgument {
            line: self.number,
            command: self.command.to_string(),
            value: value.to_string(),
        }
    }

    fn float(&self, index: usize) -> Result<f32, LoadError> {
        let arg = self.args[index];
        arg.parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.invalid(arg))
    }

    fn int(&self, index: usize) -> Result<i32, LoadError> {
        let arg = self.args[index];
        arg.parse::<i32>().map_err(|_| self.invalid(arg))
    }

    fn count(&self, index: usize) -> Result<i32, LoadError> {
        let value = self.int(index)?;
        if value < 0 {
            return Err(self.invalid(self.args[index]));
        }
        Ok(value)
    }

    fn positive(&self, index: usize) -> Result<i32, LoadError> {
        let value = self.int(index)?;
        if value <= 0 {
            return Err(self.invalid(self.args[index]));
        }
        Ok(value)
    }

    fn index(&self, index: usize) -> Result<usize, LoadError> {
        let arg = self.args[index];
        arg.parse::<usize>().map_err(|_| self.invalid(arg))
    }

    fn vec3(&self, start: usize) -> Result<Vec3A, LoadError> {
        Ok(Vec3A::new(
            self.float(start)?,
            self.float(start + 1)?,
            self.float(start + 2)?,
        ))
    }

    fn toggle(&self, index: usize) -> Result<bool, LoadError> {
        match self.args[index] {
            "on" | "true" | "1" => Ok(true),
            "off" | "false" | "0" => Ok(false),
            other => Err(self.invalid(other)),
        }
    }

    fn scene_error(&self, source: impl Into<SceneError>) -> LoadError {
        LoadError::Scene {
            line: self.number,
            source: source.into(),
        }
    }
}

impl SceneLoader {
    pub fn new() -> SceneLoader {
        SceneLoader::default()
    }

    pub fn parse(mut self, text: &str) -> Result<Scene, LoadError> {
        let mut scene = Scene::new();

        for (index, raw_line) in text.lines().enumerate() {
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let Some(command) = tokens.next() else {
                continue;
            };
            let line = Line {
                number: index + 1,
                command,
                args: tokens.collect(),
            };

            self.load_command(&line, &mut scene)?;
        }

        if let Some((line_number, look_at)) = self.look_at {
            let camera = look_at
                .to_camera(scene.image_size[0], scene.image_size[1])
                .map_err(|source| LoadError::Scene {
                    line: line_number,
                    source,
                })?;
            scene.camera = Some(camera);
        } else {
            warn!("scene has no camera");
        }

        debug!(
            "loaded {} triangles, {} spheres",
            scene.triangle_count(),
            scene.spheres.len()
        );
        Ok(scene)
    }

    fn load_command(&mut self, line: &Line, scene: &mut Scene) -> Result<(), LoadError> {
        match line.command {
            // render settings
            "size" => {
                line.expect(2)?;
                scene.image_size = [line.positive(0)?, line.positive(1)?];
            }
            "maxdepth" | "maxDepth" => {
                line.expect(1)?;
                scene.max_depth = line.count(0)?;
            }
            "output" => {
                line.expect(1)?;
                scene.output_name = line.args[0].to_string();
            }
            "spp" => {
                line.expect(1)?;
                scene.spp = line.count(0)?;
            }
            "lightsamples" => {
                line.expect(1)?;
                scene.light_samples = line.count(0)?;
            }
            "nexteventestimation" => {
                line.expect(1)?;
                scene.nee_on = line.toggle(0)?;
            }
            "russianroulette" => {
                line.expect(1)?;
                scene.rr_on = line.toggle(0)?;
            }

            // camera and geometry
            "camera" => {
                line.expect(10)?;
                let look_at = LookAt {
                    eye: line.vec3(0)?,
                    center: line.vec3(3)?,
                    up: line.vec3(6)?,
                    vertical_fov: line.float(9)?,
                };
                self.look_at = Some((line.number, look_at));
            }
            "sphere" => {
                line.expect(4)?;
                let center: Vec3 = line.vec3(0)?.into();
                let radius = line.float(3)?;

                let transform = self.transforms.top()
                    * Mat4::from_translation(center)
                    * Mat4::from_scale(Vec3::splat(radius));
                let sphere = Sphere::new(transform, self.material.material())
                    .map_err(|err| line.scene_error(err))?;
                scene.add_sphere(sphere);
            }
            "maxverts" => {
                line.expect(1)?;
                let hint = line.index(0)?;
                if hint > MAX_RESERVED_VERTICES {
                    debug!(
                        "line {}: preallocating {MAX_RESERVED_VERTICES} of {hint} vertices",
                        line.number
                    );
                }
                let wanted = hint.min(MAX_RESERVED_VERTICES);
                self.vertices
                    .reserve(wanted.saturating_sub(self.vertices.len()));
            }
            "vertex" => {
                line.expect(3)?;
                self.vertices.push(line.vec3(0)?);
            }
            "tri" => {
                line.expect(3)?;
                let top = self.transforms.top();
                let mut corners = [Vec3A::ZERO; 3];
                for (slot, corner) in corners.iter_mut().enumerate() {
                    let index = line.index(slot)?;
                    let vertex =
                        self.vertices
                            .get(index)
                            .ok_or(LoadError::VertexOutOfBounds {
                                line: line.number,
                                index,
                                count: self.vertices.len(),
                            })?;
                    *corner = top.transform_point3a(*vertex);
                }
                scene.add_triangle(corners, self.material.material());
            }

            // transforms
            "translate" => {
                line.expect(3)?;
                self.transforms.translate(line.vec3(0)?.into());
            }
            "rotate" => {
                line.expect(4)?;
                let axis: Vec3 = line.vec3(0)?.into();
                self.transforms
                    .rotate(axis, line.float(3)?)
                    .map_err(|err| line.scene_error(err))?;
            }
            "scale" => {
                line.expect(3)?;
                self.transforms.scale(line.vec3(0)?.into());
            }
            "pushTransform" => {
                self.transforms.push();
            }
            "popTransform" => {
                self.transforms.pop().map_err(|err| line.scene_error(err))?;
            }

            // materials
            "diffuse" => {
                line.expect(3)?;
                self.material.diffuse = line.vec3(0)?;
            }
            "specular" => {
                line.expect(3)?;
                self.material.specular = line.vec3(0)?;
            }
            "emission" => {
                line.expect(3)?;
                self.material.emission = line.vec3(0)?;
            }
            "ambient" => {
                line.expect(3)?;
                self.material.ambient = line.vec3(0)?;
            }
            "shininess" => {
                line.expect(1)?;
                self.material.shininess = line.float(0)?;
            }
            "roughness" => {
                line.expect(1)?;
                self.material.roughness = line.float(0)?;
            }

            // lights
            "directional" => {
                line.expect(6)?;
                let direction = self.transforms.top().transform_vector3a(line.vec3(0)?);
                scene.add_directional_light(DirectionalLight::new(direction, line.vec3(3)?));
            }
            "point" => {
                line.expect(6)?;
                let position = self.transforms.top().transform_point3a(line.vec3(0)?);
                scene.add_point_light(PointLight::new(position, line.vec3(3)?));
            }
            "quadLight" => {
                line.expect(12)?;
                let top = self.transforms.top();
                let light = Quadlight::new(
                    top.transform_point3a(line.vec3(0)?),
                    top.transform_vector3a(line.vec3(3)?),
                    top.transform_vector3a(line.vec3(6)?),
                    line.vec3(9)?,
                )
                .map_err(|err| line.scene_error(err))?;
                scene
                    .add_quad_light(light)
                    .map_err(|err| line.scene_error(err))?;
            }

            command if IGNORED_COMMANDS.contains(&command) => {
                warn!("line {}: `{}` is not supported, skipping", line.number, command);
            }
            command => {
                warn!("line {}: unknown command `{}`", line.number, command);
            }
        }

        Ok(())
    }
}
