// Synthesis of a single oriented Gabor kernel.

use crate::error::{GaborError, GaborResult};
use ndarray::Array2;
use std::f64::consts::PI;

/// A kernel whose sum is below this fraction of its absolute mass cannot be normalized.
const DEGENERATE_SUM_RATIO: f64 = 1e-6;

/// Shape parameters of the Gabor function shared by every kernel in a bank.
///
/// The defaults are the values the feature extractor was tuned with:
/// `sigma = 4`, `lambda = 10`, `gamma = 0.5`, `psi = 0`, and kernels
/// normalized so their weights sum to `1 / 1.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaborParams {
    /// Standard deviation of the Gaussian envelope along the wave direction.
    pub sigma: f64,
    /// Wavelength of the sinusoidal carrier, in pixels.
    pub lambda: f64,
    /// Spatial aspect ratio; the envelope deviation across the wave is `sigma / gamma`.
    pub gamma: f64,
    /// Phase offset of the carrier.
    pub psi: f64,
    /// Kernels are divided by `normalization * sum`.
    pub normalization: f64,
}

impl Default for GaborParams {
    fn default() -> Self {
        Self {
            sigma: 4.0,
            lambda: 10.0,
            gamma: 0.5,
            psi: 0.0,
            normalization: 1.5,
        }
    }
}

impl GaborParams {
    pub fn validate(&self) -> GaborResult<()> {
        if self.sigma.is_nan() || self.sigma <= 0.0 {
            return Err(GaborError::config(format!(
                "gabor sigma must be positive, got {}",
                self.sigma
            )));
        }
        if self.lambda.is_nan() || self.lambda <= 0.0 {
            return Err(GaborError::config(format!(
                "gabor wavelength must be positive, got {}",
                self.lambda
            )));
        }
        if self.gamma == 0.0 || !self.gamma.is_finite() {
            return Err(GaborError::config(format!(
                "gabor aspect ratio must be finite and non-zero, got {}",
                self.gamma
            )));
        }
        if self.normalization == 0.0 || !self.normalization.is_finite() {
            return Err(GaborError::config(format!(
                "normalization factor must be finite and non-zero, got {}",
                self.normalization
            )));
        }
        Ok(())
    }
}

/// One normalized Gabor kernel of a filter bank.
#[derive(Debug, Clone, PartialEq)]
pub struct GaborKernel {
    size: usize,
    theta: f64,
    weights: Array2<f32>,
}

impl GaborKernel {
    /// Sample and normalize a `size x size` kernel at orientation `theta`.
    ///
    /// __Arguments:__
    ///
    /// + `size` - side length, must be odd so the kernel has a center pixel
    ///
    /// + `theta` - orientation of the carrier in radians
    ///
    /// + `params` - envelope and carrier parameters
    ///
    /// Fails with `DegenerateKernel` when the raw weights sum to (nearly) zero,
    /// e.g. an odd-phase kernel with `psi = pi / 2`.
    pub fn synthesize(size: usize, theta: f64, params: &GaborParams) -> GaborResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(GaborError::config(format!(
                "kernel size must be odd and positive, got {size}"
            )));
        }

        let raw = raw_gabor(size, theta, params);
        let sum: f64 = raw.iter().map(|&v| v as f64).sum();
        let magnitude: f64 = raw.iter().map(|&v| (v as f64).abs()).sum();

        // relative to the total weight, f32 sampling leaves residue in odd kernels
        if !sum.is_finite() || sum.abs() <= DEGENERATE_SUM_RATIO * magnitude {
            return Err(GaborError::DegenerateKernel { size, theta, sum });
        }

        let divisor = params.normalization * sum;
        let weights = raw.mapv(|v| (v as f64 / divisor) as f32);

        Ok(Self {
            size,
            theta,
            weights,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|&v| v as f64).sum()
    }
}

/// Unnormalized Gabor function sampled on the integer grid `[-r, r]^2`.
///
/// The sample at `(x, y)` is stored at row `r - y`, column `r - x`, so the
/// array is the function rotated by 180 degrees. Correlating with it is the
/// same as convolving with the function itself.
fn raw_gabor(size: usize, theta: f64, params: &GaborParams) -> Array2<f32> {
    let half = (size / 2) as isize;

    let sigma_x = params.sigma;
    let sigma_y = params.sigma / params.gamma;

    let ex = -0.5 / (sigma_x * sigma_x);
    let ey = -0.5 / (sigma_y * sigma_y);
    let carrier = 2.0 * PI / params.lambda;

    let (s, c) = theta.sin_cos();

    Array2::from_shape_fn((size, size), |(row, col)| {
        let y = (half - row as isize) as f64;
        let x = (half - col as isize) as f64;

        // rotate into the kernel frame
        let xr = x * c + y * s;
        let yr = -x * s + y * c;

        ((ex * xr * xr + ey * yr * yr).exp() * (carrier * xr + params.psi).cos()) as f32
    })
}
