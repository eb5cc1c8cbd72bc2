// Block pooling of response tensors into feature vectors.

use crate::error::{GaborError, GaborResult};
use ndarray::{Array1, Array2, Array4, ArrayView4, Axis};
use std::fmt;
use std::str::FromStr;

/// Statistic that summarizes each pooling block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingType {
    Mean,
    Max,
}

impl fmt::Display for PoolingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PoolingType::Mean => "mean",
            PoolingType::Max => "max",
        })
    }
}

impl FromStr for PoolingType {
    type Err = GaborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(PoolingType::Mean),
            "max" => Ok(PoolingType::Max),
            _ => Err(GaborError::config(format!(
                "pooling type must be 'mean' or 'max', got '{s}'"
            ))),
        }
    }
}

/// Treatment of trailing rows and columns that do not fill a whole block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Zero-fill partial blocks to full size; `ceil(len / k)` blocks per axis.
    #[default]
    Pad,
    /// Drop partial blocks; `floor(len / k)` blocks per axis.
    Truncate,
    /// Fail unless the block size divides both spatial dimensions.
    Reject,
}

impl EdgePolicy {
    /// Number of blocks along an axis of length `len`.
    pub fn blocks(self, len: usize, block: usize) -> GaborResult<usize> {
        match self {
            EdgePolicy::Pad => Ok(len.div_ceil(block)),
            EdgePolicy::Truncate => match len / block {
                0 => Err(GaborError::shape(format!(
                    "block size {block} exceeds axis length {len}, nothing left after truncation"
                ))),
                n => Ok(n),
            },
            EdgePolicy::Reject => {
                if len.is_multiple_of(block) {
                    Ok(len / block)
                } else {
                    Err(GaborError::shape(format!(
                        "block size {block} does not divide axis length {len}"
                    )))
                }
            }
        }
    }
}

impl fmt::Display for EdgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EdgePolicy::Pad => "pad",
            EdgePolicy::Truncate => "truncate",
            EdgePolicy::Reject => "reject",
        })
    }
}

impl FromStr for EdgePolicy {
    type Err = GaborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pad" => Ok(EdgePolicy::Pad),
            "truncate" => Ok(EdgePolicy::Truncate),
            "reject" => Ok(EdgePolicy::Reject),
            _ => Err(GaborError::config(format!("unknown edge policy '{s}'"))),
        }
    }
}

/// Shape of `block_reduce` output for a `(S, H, W, C)` tensor.
pub fn pooled_dim(
    (scales, height, width, channels): (usize, usize, usize, usize),
    block: usize,
    edge: EdgePolicy,
) -> GaborResult<(usize, usize, usize, usize)> {
    if block == 0 {
        return Err(GaborError::config("pooling kernel size must be positive"));
    }
    let rows = edge.blocks(height, block)?;
    let cols = edge.blocks(width, block)?;
    Ok((scales, rows, cols, channels))
}

/// Reduce non-overlapping `block x block` windows over the two spatial axes
/// of a `(S, H, W, C)` tensor, separately for every scale and channel.
///
/// __Arguments:__
///
/// + `tensor` - stacked responses, spatial axes 1 and 2
///
/// + `block` - side of the square pooling window
///
/// + `pooling` - mean or maximum of each window
///
/// + `edge` - what to do with windows that overhang the tensor
///
pub fn block_reduce(
    tensor: ArrayView4<f32>,
    block: usize,
    pooling: PoolingType,
    edge: EdgePolicy,
) -> GaborResult<Array4<f32>> {
    let (_, height, width, _) = tensor.dim();
    let out_dim = pooled_dim(tensor.dim(), block, edge)?;

    if edge == EdgePolicy::Pad && (height % block != 0 || width % block != 0) {
        log::warn!(
            "{height}x{width} responses not divisible by pooling size {block}, zero-filling edge blocks"
        );
    }

    let full = (block * block) as f64;

    let pooled = Array4::from_shape_fn(out_dim, |(s, by, bx, chan)| {
        let y0 = by * block;
        let x0 = bx * block;
        let y1 = (y0 + block).min(height);
        let x1 = (x0 + block).min(width);

        let count = (y1 - y0) * (x1 - x0);
        let window = (y0..y1).flat_map(|y| (x0..x1).map(move |x| (y, x)));

        match pooling {
            PoolingType::Mean => {
                // missing cells are zero, so they only enlarge the divisor
                let sum: f64 = window.map(|(y, x)| tensor[[s, y, x, chan]] as f64).sum();
                (sum / full) as f32
            }
            PoolingType::Max => {
                let max = window
                    .map(|(y, x)| tensor[[s, y, x, chan]])
                    .fold(f32::NEG_INFINITY, f32::max);
                if count < block * block { max.max(0.0) } else { max }
            }
        }
    });

    Ok(pooled)
}

/// Flatten a pooled tensor into a single `(1, M)` row, last axis fastest.
pub fn flatten(pooled: Array4<f32>) -> Array2<f32> {
    Array1::from_iter(pooled.iter().copied()).insert_axis(Axis(0))
}
