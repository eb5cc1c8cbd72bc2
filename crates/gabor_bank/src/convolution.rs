// Same-size 2D correlation of multi-channel images with a single kernel.
//
// The kernel is applied without flipping, anchored at its center, to every
// channel independently. Pixels outside the image are supplied by the
// border mode.

use crate::error::GaborError;
use crate::fourier;
use ndarray::{Array3, ArrayView2, ArrayView3};
use std::fmt;
use std::str::FromStr;

/// How samples outside the image are synthesized.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// Mirror without repeating the edge pixel: `gfedcb|abcdefgh|gfedcba`.
    #[default]
    Reflect101,
    /// Repeat the edge pixel: `aaaaaa|abcdefgh|hhhhhhh`.
    Replicate,
    /// Constant zero outside the image.
    Zero,
}

impl BorderMode {
    /// Map a possibly out-of-range coordinate onto `0..len`, or `None` when
    /// the sample is the zero constant.
    pub fn source_index(self, index: isize, len: usize) -> Option<usize> {
        let len = len as isize;
        if (0..len).contains(&index) {
            return Some(index as usize);
        }

        match self {
            BorderMode::Zero => None,
            BorderMode::Replicate => Some(index.clamp(0, len - 1) as usize),
            BorderMode::Reflect101 => {
                if len == 1 {
                    return Some(0);
                }
                // reflection is periodic with period 2 * (len - 1)
                let period = 2 * (len - 1);
                let folded = index.rem_euclid(period);
                let source = if folded < len { folded } else { period - folded };
                Some(source as usize)
            }
        }
    }
}

impl fmt::Display for BorderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BorderMode::Reflect101 => "reflect101",
            BorderMode::Replicate => "replicate",
            BorderMode::Zero => "zero",
        };
        f.write_str(name)
    }
}

impl FromStr for BorderMode {
    type Err = GaborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reflect101" | "reflect" => Ok(BorderMode::Reflect101),
            "replicate" => Ok(BorderMode::Replicate),
            "zero" | "constant" => Ok(BorderMode::Zero),
            _ => Err(GaborError::config(format!("unknown border mode '{s}'"))),
        }
    }
}

/// Numeric range of a filter response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputDepth {
    /// Round half to even and saturate to `[0, 255]`.
    #[default]
    U8,
    /// Keep the raw floating point response.
    F32,
}

impl OutputDepth {
    #[inline]
    pub fn quantize(self, value: f64) -> f32 {
        match self {
            OutputDepth::U8 => value.round_ties_even().clamp(0.0, 255.0) as f32,
            OutputDepth::F32 => value as f32,
        }
    }
}

impl fmt::Display for OutputDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputDepth::U8 => "u8",
            OutputDepth::F32 => "f32",
        })
    }
}

impl FromStr for OutputDepth {
    type Err = GaborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(OutputDepth::U8),
            "f32" => Ok(OutputDepth::F32),
            _ => Err(GaborError::config(format!("unknown output depth '{s}'"))),
        }
    }
}

/// Which correlation routine computes the filter responses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConvolutionMethod {
    /// Sliding-window sum, `O(H W k^2)`.
    #[default]
    Direct,
    /// Spectral product through the radix-2 FFT.
    Fourier,
}

impl fmt::Display for ConvolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConvolutionMethod::Direct => "direct",
            ConvolutionMethod::Fourier => "fourier",
        })
    }
}

impl FromStr for ConvolutionMethod {
    type Err = GaborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(ConvolutionMethod::Direct),
            "fourier" | "fft" => Ok(ConvolutionMethod::Fourier),
            _ => Err(GaborError::config(format!(
                "unknown convolution method '{s}'"
            ))),
        }
    }
}

/// Extend every side of `image` by the given margins using `border`.
///
/// The result has shape `(H + top + bottom, W + left + right, C)`.
pub fn pad_image(
    image: ArrayView3<f32>,
    (top, bottom): (usize, usize),
    (left, right): (usize, usize),
    border: BorderMode,
) -> Array3<f32> {
    let (height, width, channels) = image.dim();

    Array3::from_shape_fn(
        (height + top + bottom, width + left + right, channels),
        |(y, x, chan)| {
            let sy = border.source_index(y as isize - top as isize, height);
            let sx = border.source_index(x as isize - left as isize, width);
            match (sy, sx) {
                (Some(sy), Some(sx)) => image[[sy, sx, chan]],
                _ => 0.0,
            }
        },
    )
}

/// Margins needed so a kernel anchored at `(kh / 2, kw / 2)` covers every
/// output pixel: `((top, bottom), (left, right))`.
pub(crate) fn kernel_margins(kernel: &ArrayView2<f32>) -> ((usize, usize), (usize, usize)) {
    let (kh, kw) = kernel.dim();
    let (ay, ax) = (kh / 2, kw / 2);
    ((ay, kh - 1 - ay), (ax, kw - 1 - ax))
}

/// Correlate each channel of `image` with `kernel`, same-size output.
///
/// Sums are accumulated in `f64` and converted once by `depth`.
pub fn filter_2d(
    image: ArrayView3<f32>,
    kernel: ArrayView2<f32>,
    border: BorderMode,
    depth: OutputDepth,
) -> Array3<f32> {
    let (height, width, channels) = image.dim();
    let (kh, kw) = kernel.dim();

    let (rows, cols) = kernel_margins(&kernel);
    let padded = pad_image(image, rows, cols, border);

    Array3::from_shape_fn((height, width, channels), |(y, x, chan)| {
        let mut acc = 0f64;
        for ky in 0..kh {
            for kx in 0..kw {
                acc += kernel[[ky, kx]] as f64 * padded[[y + ky, x + kx, chan]] as f64;
            }
        }
        depth.quantize(acc)
    })
}

/// Correlate with the routine selected by `method`.
pub fn correlate(
    image: ArrayView3<f32>,
    kernel: ArrayView2<f32>,
    border: BorderMode,
    depth: OutputDepth,
    method: ConvolutionMethod,
) -> Array3<f32> {
    match method {
        ConvolutionMethod::Direct => filter_2d(image, kernel, border, depth),
        ConvolutionMethod::Fourier => fourier::filter_2d_fourier(image, kernel, border, depth),
    }
}
