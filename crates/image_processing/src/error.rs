// Errors from loading images, running the extractor and writing results.

use gabor_bank::GaborError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("unable to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to decode image '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unable to write image '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "image '{}' is {}x{}x{}, expected {}x{}x{} like the first image of the batch",
        path.display(),
        actual.0,
        actual.1,
        actual.2,
        expected.0,
        expected.1,
        expected.2
    )]
    InconsistentDimensions {
        path: PathBuf,
        actual: (usize, usize, usize),
        expected: (usize, usize, usize),
    },

    #[error("no input images given")]
    NoImages,

    #[error(transparent)]
    Gabor(#[from] GaborError),

    #[error("unable to stack images: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("unable to serialize features: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unable to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ProcessingError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
