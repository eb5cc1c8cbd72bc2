#[cfg(test)]
mod tests;

// Texture features from banks of oriented Gabor filters.
//
// A `GaborFeatureExtractor` builds a `FilterBank` of kernels at several
// scales and orientations, takes the maximum response over orientations at
// each scale, stacks the scales and block-pools them into a feature row.

pub mod bank;
pub mod config;
pub mod convolution;
pub mod error;
pub mod extractor;
pub mod fourier;
pub mod kernel;
pub mod pooling;

pub use bank::{FilterBank, ScaleGroup};
pub use config::{DEFAULT_POOLING_KERNEL_SIZE, ExtractorConfig};
pub use convolution::{BorderMode, ConvolutionMethod, OutputDepth};
pub use error::{GaborError, GaborResult};
pub use extractor::GaborFeatureExtractor;
pub use kernel::{GaborKernel, GaborParams};
pub use pooling::{EdgePolicy, PoolingType};

use ndarray::{ArrayView2, ArrayView3, Axis};

/// View a single-channel `(H, W)` image as `(H, W, 1)`.
pub fn single_channel(image: ArrayView2<f32>) -> ArrayView3<f32> {
    image.insert_axis(Axis(2))
}
