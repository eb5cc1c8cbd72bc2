// top-level library module

pub mod basic_ops;
pub mod error;
pub mod features;
pub mod inspect;

use image::{ImageBuffer, Rgba};
use std::path::Path;

pub use error::ProcessingError;

pub struct Image {
    pub image: ImageBuffer<Rgba<u8>, Vec<u8>>,
    pub dimensions: (u32, u32),
}

impl Image {
    pub fn from_file(filepath: impl AsRef<Path>) -> Result<Self, ProcessingError> {
        let filepath = filepath.as_ref();
        let image_bytes = std::fs::read(filepath).map_err(ProcessingError::io(filepath))?;

        let image = image::load_from_memory(&image_bytes)
            .map_err(|source| ProcessingError::Decode {
                path: filepath.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let dimensions = image.dimensions();

        Ok(Self { image, dimensions })
    }

    pub fn from_buffer(image: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Self {
        let dimensions = image.dimensions();
        Self { image, dimensions }
    }
}
