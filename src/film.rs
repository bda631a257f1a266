use std::path::{Path, PathBuf};

use glam::Vec3A;
use image::{ImageBuffer, Rgba, RgbaImage};
use log::info;
use rayon::prelude::*;

use crate::buffers::RGBData;
use crate::error::FilmError;

/// Final quantized framebuffer, stored row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    width: usize,
    height: usize,
    output_file_name: PathBuf,
    color_buffer: Vec<RGBData>,
}

impl Film {
    pub fn new(width: usize, height: usize, output_file_name: impl Into<PathBuf>) -> Film {
        Film {
            width,
            height,
            output_file_name: output_file_name.into(),
            color_buffer: vec![RGBData::BLACK; width * height],
        }
    }

    /// Film sized from the `[width, height]` stored in the scene data.
    pub fn from_size(size: [i32; 2], output_file_name: impl Into<PathBuf>) -> Film {
        Film::new(
            size[0].max(0) as usize,
            size[1].max(0) as usize,
            output_file_name,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn output_file_name(&self) -> &Path {
        &self.output_file_name
    }

    pub fn pixels(&self) -> &[RGBData] {
        &self.color_buffer
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, FilmError> {
        if x >= self.width || y >= self.height {
            return Err(FilmError::PixelOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x + y * self.width)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Result<RGBData, FilmError> {
        Ok(self.color_buffer[self.index(x, y)?])
    }

    pub fn commit_color(&mut self, x: usize, y: usize, color: Vec3A) -> Result<(), FilmError> {
        let index = self.index(x, y)?;
        self.color_buffer[index] = RGBData::from_color(color);
        Ok(())
    }

    /// Quantizes a whole frame of linear colors, one per pixel.
    pub fn commit_radiance(&mut self, colors: &[Vec3A]) -> Result<(), FilmError> {
        if colors.len() != self.color_buffer.len() {
            return Err(FilmError::SizeMismatch {
                expected: self.color_buffer.len(),
                actual: colors.len(),
            });
        }

        self.color_buffer
            .par_iter_mut()
            .zip(colors.par_iter())
            .for_each(|(pixel, color)| *pixel = RGBData::from_color(*color));
        Ok(())
    }

    /// Replaces the framebuffer with pixels read back from the backend.
    pub fn set_image_data(&mut self, data: Vec<RGBData>) -> Result<(), FilmError> {
        if data.len() != self.color_buffer.len() {
            return Err(FilmError::SizeMismatch {
                expected: self.color_buffer.len(),
                actual: data.len(),
            });
        }
        self.color_buffer = data;
        Ok(())
    }

    pub fn to_image(&self) -> Result<RgbaImage, FilmError> {
        let too_large = || FilmError::TooLarge {
            width: self.width,
            height: self.height,
        };
        let width = u32::try_from(self.width).map_err(|_| too_large())?;
        let height = u32::try_from(self.height).map_err(|_| too_large())?;

        let raw: Vec<u8> = bytemuck::cast_slice(&self.color_buffer).to_vec();
        ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, raw).ok_or_else(too_large)
    }

    pub fn save(&self) -> Result<(), FilmError> {
        self.save_to(&self.output_file_name)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), FilmError> {
        let path = path.as_ref();
        self.to_image()?.save(path)?;
        info!(
            "saved {}x{} image to {}",
            self.width,
            self.height,
            path.display()
        );
        Ok(())
    }
}
