use std::fs;

use approx::assert_relative_eq;
use glam::{Mat4, Vec3A};
use raytracer_scene::buffers::INVERSE_TOLERANCE;
use raytracer_scene::error::{Error, LoadError};
use raytracer_scene::{Engine, Quadlight, SceneData, Sphere};

const CORNELL: &str = "
size 80 60
maxdepth 4
spp 16
lightsamples 3
nexteventestimation on
russianroulette on
output box.png

camera 0 1 3.5  0 1 0  0 1 0  40

# floor
diffuse 0.7 0.7 0.7
vertex -1 0 -1
vertex 1 0 -1
vertex 1 0 1
vertex -1 0 1
tri 0 1 2
tri 0 2 3

pushTransform
translate 0.3 0.4 0
rotate 0 1 0 30
scale 1 2 1
specular 0.9 0.9 0.9
shininess 60
roughness 0.2
sphere 0 0 0 0.2
popTransform

quadLight -0.25 1.98 -0.25  0.5 0 0  0 0 0.5  12 12 12
directional 0 1 1  0.2 0.2 0.2
";

fn write_scene(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cornell.test");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn scene_data_bytes_read_back_identically() {
    let (_dir, path) = write_scene(CORNELL);
    let (scene, buffers) = Engine::new().load_and_prepare(&path).unwrap();

    let read: SceneData = bytemuck::pod_read_unaligned(buffers.scene_data_bytes());
    assert_eq!(read, buffers.scene_data);
    assert!(read.validate().is_ok());

    assert_eq!(read.image_size, [80, 60]);
    assert_eq!(read.max_depth, 4);
    assert_eq!(read.spp, 16);
    assert_eq!(read.light_samples, 3);
    assert!(read.nee_on.is_on());
    assert!(read.rr_on.is_on());
    assert_eq!(read.quad_light_count, 1);
    assert_eq!(read.direct_light_count, 1);
    assert_eq!(read.point_light_count, 0);
    assert_eq!(scene.output_name, "box.png");
    assert_eq!(scene.shadow_rays_per_pixel(), 1 + 3);
}

#[test]
fn sphere_records_survive_the_buffer() {
    let (_dir, path) = write_scene(CORNELL);
    let (_, buffers) = Engine::new().load_and_prepare(&path).unwrap();

    let spheres: Vec<Sphere> = bytemuck::pod_collect_to_vec(buffers.sphere_bytes());
    assert_eq!(spheres, buffers.spheres);

    let sphere = spheres[0];
    assert!(sphere.validate(INVERSE_TOLERANCE).is_ok());
    assert!((sphere.inverse() * sphere.forward()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    assert_eq!(sphere.material.shininess, 60.0);
    assert_eq!(sphere.material.roughness, 0.2);

    let center = sphere.forward().transform_point3a(Vec3A::ZERO);
    assert!(center.abs_diff_eq(Vec3A::new(0.3, 0.4, 0.0), 1e-6));

    // non-uniform scale stretches the sphere along y
    let bounds = buffers.sphere_bounding_boxes[0];
    assert_relative_eq!(bounds.max[1] - bounds.min[1], 0.8, epsilon = 1e-5);
}

#[test]
fn quad_lights_in_buffer_are_non_degenerate() {
    let (_dir, path) = write_scene(CORNELL);
    let (_, buffers) = Engine::new().load_and_prepare(&path).unwrap();

    let count = buffers.scene_data.quad_light_count as usize;
    let lights: Vec<Quadlight> = bytemuck::pod_collect_to_vec(buffers.quad_light_bytes());
    for light in &lights[..count] {
        assert!(!light.is_degenerate());
    }
}

#[test]
fn camera_steps_are_orthogonal_to_view() {
    let (_dir, path) = write_scene(CORNELL);
    let (_, buffers) = Engine::new().load_and_prepare(&path).unwrap();

    let camera = buffers.scene_data.camera;
    let view = camera.view_direction();
    assert_relative_eq!(Vec3A::from(camera.pixel_right).dot(view), 0.0, epsilon = 1e-6);
    assert_relative_eq!(Vec3A::from(camera.pixel_down).dot(view), 0.0, epsilon = 1e-6);
    assert!(view.abs_diff_eq(Vec3A::NEG_Z, 1e-5));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.test");

    match Engine::new().load_and_prepare(&path) {
        Err(Error::Load(LoadError::Io { path: reported, .. })) => assert_eq!(reported, path),
        other => panic!("expected an io error, got {other:?}"),
    }
}
