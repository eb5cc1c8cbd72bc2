// Multi-scale, multi-orientation Gabor filter bank.

use crate::error::{GaborError, GaborResult};
use crate::kernel::{GaborKernel, GaborParams};
use std::f64::consts::PI;

/// Side length of the smallest kernel in a bank.
pub const MIN_KERNEL_SIZE: usize = 5;

/// Difference in side length between consecutive scales.
pub const SCALE_STEP: usize = 4;

/// Kernel sizes for a bank bounded by `max_kernel_size`.
///
/// Sizes run `5, 9, 13, ...` while `size < max_kernel_size + 4`, so a bound
/// that is not itself on the ladder rounds up to the next rung.
pub fn scale_sizes(max_kernel_size: usize) -> impl Iterator<Item = usize> {
    (MIN_KERNEL_SIZE..max_kernel_size + SCALE_STEP).step_by(SCALE_STEP)
}

/// `count` angles evenly spaced over `[0, pi)`.
pub fn orientations(count: usize) -> impl Iterator<Item = f64> {
    (0..count).map(move |i| i as f64 * PI / count as f64)
}

/// Kernels of one scale, one per orientation in increasing angle order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleGroup {
    size: usize,
    kernels: Vec<GaborKernel>,
}

impl ScaleGroup {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn kernels(&self) -> &[GaborKernel] {
        &self.kernels
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    groups: Vec<ScaleGroup>,
}

impl FilterBank {
    /// Build a bank with `num_orientations` kernels at every scale up to
    /// `max_kernel_size`.
    pub fn build(
        max_kernel_size: usize,
        num_orientations: usize,
        params: &GaborParams,
    ) -> GaborResult<Self> {
        if max_kernel_size < MIN_KERNEL_SIZE {
            return Err(GaborError::config(format!(
                "maximum kernel size must be at least {MIN_KERNEL_SIZE}, got {max_kernel_size}"
            )));
        }
        if num_orientations == 0 {
            return Err(GaborError::config("number of orientations must be positive"));
        }
        params.validate()?;

        let groups = scale_sizes(max_kernel_size)
            .map(|size| {
                let kernels = orientations(num_orientations)
                    .map(|theta| GaborKernel::synthesize(size, theta, params))
                    .collect::<GaborResult<Vec<_>>>()?;
                Ok(ScaleGroup { size, kernels })
            })
            .collect::<GaborResult<Vec<_>>>()?;

        let bank = Self { groups };
        log::debug!(
            "built gabor bank: scales {:?}, {} orientations, {} kernels",
            bank.scale_sizes(),
            num_orientations,
            bank.len()
        );

        Ok(bank)
    }

    /// Regroup a flat kernel list, scale by scale, into runs of
    /// `num_orientations` kernels.
    pub fn from_flat(kernels: Vec<GaborKernel>, num_orientations: usize) -> GaborResult<Self> {
        if num_orientations == 0 {
            return Err(GaborError::config("number of orientations must be positive"));
        }
        if kernels.is_empty() {
            return Err(GaborError::config("cannot group an empty kernel list"));
        }
        if kernels.len() % num_orientations != 0 {
            return Err(GaborError::config(format!(
                "{} kernels do not split into groups of {num_orientations} orientations",
                kernels.len()
            )));
        }

        let mut groups = Vec::with_capacity(kernels.len() / num_orientations);
        let mut iter = kernels.into_iter().peekable();

        while iter.peek().is_some() {
            let chunk: Vec<GaborKernel> = iter.by_ref().take(num_orientations).collect();
            let size = chunk[0].size();

            if let Some(odd) = chunk.iter().find(|k| k.size() != size) {
                return Err(GaborError::shape(format!(
                    "scale group {} mixes kernel sizes {size} and {}",
                    groups.len(),
                    odd.size()
                )));
            }

            groups.push(ScaleGroup {
                size,
                kernels: chunk,
            });
        }

        Ok(Self { groups })
    }

    pub fn scales(&self) -> &[ScaleGroup] {
        &self.groups
    }

    pub fn num_scales(&self) -> usize {
        self.groups.len()
    }

    pub fn scale_sizes(&self) -> Vec<usize> {
        self.groups.iter().map(ScaleGroup::size).collect()
    }

    /// Kernels in scale-major order.
    pub fn kernels(&self) -> impl Iterator<Item = &GaborKernel> {
        self.groups.iter().flat_map(|g| g.kernels.iter())
    }

    /// Total number of kernels.
    pub fn len(&self) -> usize {
        self.groups.iter().map(ScaleGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_flat(self) -> Vec<GaborKernel> {
        self.groups.into_iter().flat_map(|g| g.kernels).collect()
    }
}
