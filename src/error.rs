use std::path::PathBuf;

use thiserror::Error;

/// Violations of the invariants of the GPU-shared records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeCount { field: &'static str, value: i32 },

    #[error("{field} must be 0 or 1, got {value}")]
    InvalidFlag { field: &'static str, value: i32 },

    #[error("image size must be positive, got {width}x{height}")]
    InvalidImageSize { width: i32, height: i32 },

    #[error("sphere transformation is not invertible")]
    SingularTransform,

    #[error("sphere inverse transformation is off by {error} (tolerance {tolerance})")]
    InverseMismatch { error: f32, tolerance: f32 },

    #[error("quad light edges are parallel or zero")]
    DegenerateQuadLight,
}

/// Errors while assembling a scene on the host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("scene has no camera")]
    MissingCamera,

    #[error("camera eye and look-at point coincide")]
    DegenerateView,

    #[error("camera up vector is parallel to the view direction")]
    DegenerateUp,

    #[error("field of view must be in (0, 180) degrees, got {0}")]
    InvalidFieldOfView(f32),

    #[error("cannot pop the root transform")]
    TransformStackUnderflow,

    #[error("rotation axis has zero length")]
    ZeroRotationAxis,

    #[error("{field} does not fit in a 32-bit count: {value}")]
    CountOverflow { field: &'static str, value: usize },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors while reading a scene description file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: `{command}` expects {expected} arguments, got {actual}")]
    ArgumentCount {
        line: usize,
        command: String,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: invalid argument `{value}` for `{command}`")]
    InvalidArgument {
        line: usize,
        command: String,
        value: String,
    },

    #[error("line {line}: vertex index {index} out of bounds (count: {count})")]
    VertexOutOfBounds {
        line: usize,
        index: usize,
        count: usize,
    },

    #[error("line {line}: {source}")]
    Scene {
        line: usize,
        #[source]
        source: SceneError,
    },
}

/// Errors from the output framebuffer.
#[derive(Error, Debug)]
pub enum FilmError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} film")]
    PixelOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("image data has {actual} pixels, film needs {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("film of {width}x{height} is too large to encode")]
    TooLarge { width: usize, height: usize },

    #[error("could not save image: {0}")]
    Image(#[from] image::ImageError),
}

/// Crate-wide error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Film(#[from] FilmError),
}

pub type Result<T> = std::result::Result<T, Error>;
