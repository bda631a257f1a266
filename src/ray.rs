//! Ray and intersection capabilities shared with the intersection backend.
//!
//! The backend decides the concrete memory layout; host code only relies on
//! the [`Ray`] and [`Intersection`] traits. The record types below mirror the
//! packed layouts a hardware intersector consumes.

use glam::{Vec2, Vec3A};

pub trait Ray {
    fn origin(&self) -> Vec3A;

    fn direction(&self) -> Vec3A;

    fn min_distance(&self) -> f32 {
        0.0
    }

    fn max_distance(&self) -> f32 {
        f32::INFINITY
    }

    /// Point at parameter `t` along the ray.
    fn at(&self, t: f32) -> Vec3A {
        self.origin() + self.direction() * t
    }

    fn contains_distance(&self, t: f32) -> bool {
        t >= self.min_distance() && t <= self.max_distance()
    }
}

pub trait Intersection {
    /// Distance along the ray, negative when nothing was hit.
    fn distance(&self) -> f32;

    fn primitive_index(&self) -> u32;

    /// Barycentric coordinates for triangles, parametric for other primitives.
    fn coordinates(&self) -> Vec2;

    fn is_hit(&self) -> bool {
        self.distance() >= 0.0
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OriginDirectionRay {
    pub origin: [f32; 3],    // packed vec3, 12 bytes
    pub direction: [f32; 3], // packed vec3, 12 bytes
}

impl OriginDirectionRay {
    pub fn new(origin: Vec3A, direction: Vec3A) -> OriginDirectionRay {
        OriginDirectionRay {
            origin: origin.into(),
            direction: direction.into(),
        }
    }
}

impl Ray for OriginDirectionRay {
    fn origin(&self) -> Vec3A {
        self.origin.into()
    }

    fn direction(&self) -> Vec3A {
        self.direction.into()
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OriginMinDistanceDirectionMaxDistanceRay {
    pub origin: [f32; 3],    // packed vec3, 12 bytes
    pub min_distance: f32,   // f32, 4 bytes
    pub direction: [f32; 3], // packed vec3, 12 bytes
    pub max_distance: f32,   // f32, 4 bytes
}

impl OriginMinDistanceDirectionMaxDistanceRay {
    pub fn new(
        origin: Vec3A,
        direction: Vec3A,
        min_distance: f32,
        max_distance: f32,
    ) -> OriginMinDistanceDirectionMaxDistanceRay {
        OriginMinDistanceDirectionMaxDistanceRay {
            origin: origin.into(),
            min_distance,
            direction: direction.into(),
            max_distance,
        }
    }
}

impl Ray for OriginMinDistanceDirectionMaxDistanceRay {
    fn origin(&self) -> Vec3A {
        self.origin.into()
    }

    fn direction(&self) -> Vec3A {
        self.direction.into()
    }

    fn min_distance(&self) -> f32 {
        self.min_distance
    }

    fn max_distance(&self) -> f32 {
        self.max_distance
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DistancePrimitiveIndexCoordinates {
    pub distance: f32,        // f32, 4 bytes
    pub primitive_index: u32, // u32, 4 bytes
    pub coordinates: [f32; 2], // vec2, 8 bytes
}

impl DistancePrimitiveIndexCoordinates {
    pub const MISS: DistancePrimitiveIndexCoordinates = DistancePrimitiveIndexCoordinates {
        distance: -1.0,
        primitive_index: u32::MAX,
        coordinates: [0.0; 2],
    };

    pub fn hit(distance: f32, primitive_index: u32, coordinates: Vec2) -> Self {
        DistancePrimitiveIndexCoordinates {
            distance,
            primitive_index,
            coordinates: coordinates.into(),
        }
    }
}

impl Intersection for DistancePrimitiveIndexCoordinates {
    fn distance(&self) -> f32 {
        self.distance
    }

    fn primitive_index(&self) -> u32 {
        self.primitive_index
    }

    fn coordinates(&self) -> Vec2 {
        self.coordinates.into()
    }
}

/// Closest hit among `candidates`, or `None` when every candidate missed.
pub fn closest_hit<I: Intersection + Copy>(candidates: &[I]) -> Option<I> {
    candidates
        .iter()
        .filter(|hit| hit.is_hit())
        .min_by(|a, b| a.distance().total_cmp(&b.distance()))
        .copied()
}
