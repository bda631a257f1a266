//! Host side of a GPU ray tracer: the fixed-layout records shared with the
//! kernels, and the scene setup that fills them.

pub mod buffers;
pub mod camera;
pub mod engine;
pub mod error;
pub mod film;
pub mod ray;
pub mod scene;
pub mod scene_loader;
pub mod transform;

pub use buffers::{
    BoundingBox, Camera, DirectionalLight, Flag, Material, PointLight, Quadlight, RGBData,
    SceneData, Sphere, Vertex,
};
pub use engine::{Engine, SceneBuffers};
pub use error::{Error, Result};
pub use film::Film;
pub use scene::Scene;
