use std::path::Path;

use log::{debug, info};

use crate::buffers::{
    BoundingBox, DirectionalLight, Material, PointLight, Quadlight, SceneData, Sphere, Vertex,
    INVERSE_TOLERANCE,
};
use crate::error::Result;
use crate::scene::Scene;
use crate::scene_loader::load_scene;

/// Every record array the rendering backend binds, in host memory.
///
/// Light arrays always hold at least one entry; the counts in
/// [`SceneData`] tell the kernels how many are real.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBuffers {
    pub scene_data: SceneData,
    pub vertices: Vec<Vertex>,
    pub triangle_materials: Vec<Material>,
    pub spheres: Vec<Sphere>,
    pub sphere_bounding_boxes: Vec<BoundingBox>,
    pub directional_lights: Vec<DirectionalLight>,
    pub point_lights: Vec<PointLight>,
    pub quad_lights: Vec<Quadlight>,
}

impl SceneBuffers {
    pub fn scene_data_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.scene_data)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn triangle_material_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangle_materials)
    }

    pub fn sphere_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spheres)
    }

    pub fn sphere_bounding_box_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.sphere_bounding_boxes)
    }

    pub fn directional_light_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directional_lights)
    }

    pub fn point_light_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.point_lights)
    }

    pub fn quad_light_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.quad_lights)
    }

    /// Labelled byte views, in binding order.
    pub fn named_bytes(&self) -> [(&'static str, &[u8]); 8] {
        [
            ("Scene Data", self.scene_data_bytes()),
            ("Vertex Buffer", self.vertex_bytes()),
            ("Triangle Material Buffer", self.triangle_material_bytes()),
            ("Sphere Buffer", self.sphere_bytes()),
            ("Sphere Bounding Box Buffer", self.sphere_bounding_box_bytes()),
            ("Directional Light Buffer", self.directional_light_bytes()),
            ("Point Light Buffer", self.point_light_bytes()),
            ("Quad Light Buffer", self.quad_light_bytes()),
        ]
    }

    pub fn total_bytes(&self) -> usize {
        self.named_bytes().iter().map(|(_, bytes)| bytes.len()).sum()
    }
}

#[derive(Debug, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Engine {
        Engine
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<Scene> {
        let scene = load_scene(path)?;
        info!("loaded scene\n{scene}");
        Ok(scene)
    }

    /// Validates the scene and lays out every buffer for upload.
    pub fn prepare(&self, scene: &mut Scene) -> Result<SceneBuffers> {
        scene.make_light_placeholders();
        let scene_data = scene.scene_data()?;

        for sphere in &scene.spheres {
            sphere.validate(INVERSE_TOLERANCE)?;
        }
        for light in &scene.quad_lights()[..scene.quad_lights_count()] {
            light.validate()?;
        }

        let buffers = SceneBuffers {
            scene_data,
            vertices: scene.tri_verts.iter().copied().map(Vertex::from).collect(),
            triangle_materials: scene.tri_materials.clone(),
            spheres: scene.spheres.clone(),
            sphere_bounding_boxes: scene.sphere_bounding_boxes.clone(),
            directional_lights: scene.directional_lights().to_vec(),
            point_lights: scene.point_lights().to_vec(),
            quad_lights: scene.quad_lights().to_vec(),
        };

        for (label, bytes) in buffers.named_bytes() {
            debug!("{label}: {} bytes", bytes.len());
        }
        info!(
            "prepared {} bytes of scene buffers, {} shadow rays per pixel",
            buffers.total_bytes(),
            scene.shadow_rays_per_pixel()
        );

        Ok(buffers)
    }

    /// Loads a scene file and lays out its buffers. No rays are traced here.
    pub fn load_and_prepare(&self, path: impl AsRef<Path>) -> Result<(Scene, SceneBuffers)> {
        let mut scene = self.load(path)?;
        let buffers = self.prepare(&mut scene)?;
        Ok((scene, buffers))
    }
}

#[cfg(feature = "gpu")]
pub use gpu::GpuSceneBuffers;

#[cfg(feature = "gpu")]
mod gpu {
    use wgpu::{util::DeviceExt, BindGroup, BindGroupLayout, Buffer};

    use super::SceneBuffers;

    macro_rules! bind_group_entry {
        ($binding:expr, $resource:expr) => {
            wgpu::BindGroupEntry {
                binding: $binding,
                resource: $resource.as_entire_binding(),
            }
        };
    }

    fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    /// Scene data as a uniform at binding 0, every record array read-only storage after it.
    fn layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        entries.extend((1..8).map(storage_entry));
        entries
    }

    /// The scene buffers uploaded to a wgpu device, bound in `named_bytes` order.
    pub struct GpuSceneBuffers {
        pub scene_data_buffer: Buffer,
        pub vertex_buffer: Buffer,
        pub triangle_material_buffer: Buffer,
        pub sphere_buffer: Buffer,
        pub sphere_bounding_box_buffer: Buffer,
        pub directional_light_buffer: Buffer,
        pub point_light_buffer: Buffer,
        pub quad_light_buffer: Buffer,
    }

    impl GpuSceneBuffers {
        pub fn new(
            device: &wgpu::Device,
            buffers: &SceneBuffers,
        ) -> (GpuSceneBuffers, BindGroupLayout, BindGroup) {
            let empty_slot = [0u8; 16];
            let create = |label: &str, contents: &[u8], usage: wgpu::BufferUsages| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    // zero-length bindings are invalid, keep one empty slot
                    contents: if contents.is_empty() { &empty_slot[..] } else { contents },
                    usage: usage | wgpu::BufferUsages::COPY_DST,
                })
            };

            let storage = wgpu::BufferUsages::STORAGE;
            let [scene_data, vertices, materials, spheres, boxes, directional, point, quad] =
                buffers.named_bytes();

            let gpu_buffers = GpuSceneBuffers {
                scene_data_buffer: create(scene_data.0, scene_data.1, wgpu::BufferUsages::UNIFORM),
                vertex_buffer: create(vertices.0, vertices.1, storage),
                triangle_material_buffer: create(materials.0, materials.1, storage),
                sphere_buffer: create(spheres.0, spheres.1, storage),
                sphere_bounding_box_buffer: create(boxes.0, boxes.1, storage),
                directional_light_buffer: create(directional.0, directional.1, storage),
                point_light_buffer: create(point.0, point.1, storage),
                quad_light_buffer: create(quad.0, quad.1, storage),
            };

            let (bind_group_layout, bind_group) = gpu_buffers.create_bindgroup(device);
            (gpu_buffers, bind_group_layout, bind_group)
        }

        fn create_bindgroup(&self, device: &wgpu::Device) -> (BindGroupLayout, BindGroup) {
            let entries = layout_entries();
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &entries,
                    label: Some("Scene Bind Group Layout"),
                });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &bind_group_layout,
                entries: &[
                    bind_group_entry!(0, self.scene_data_buffer),
                    bind_group_entry!(1, self.vertex_buffer),
                    bind_group_entry!(2, self.triangle_material_buffer),
                    bind_group_entry!(3, self.sphere_buffer),
                    bind_group_entry!(4, self.sphere_bounding_box_buffer),
                    bind_group_entry!(5, self.directional_light_buffer),
                    bind_group_entry!(6, self.point_light_buffer),
                    bind_group_entry!(7, self.quad_light_buffer),
                ],
                label: Some("Scene Bind Group"),
            });

            (bind_group_layout, bind_group)
        }
    }

}
