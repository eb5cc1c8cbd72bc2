// Correlation through the 2D discrete Fourier transform.
//
// Complex sequences are stored as flat `f64` slices of interleaved
// (real, imaginary) pairs. Transform lengths must be powers of two.

use crate::convolution::{BorderMode, OutputDepth, kernel_margins, pad_image};
use crate::error::{GaborError, GaborResult};
use ndarray::{Array3, ArrayView2, ArrayView3};
use std::f64::consts::PI;

/// Radix-2 decimation-in-time FFT, in place.
///
/// __Arguments:__
///
/// + `data` - N complex values, real parts in even entries and imaginary
///   parts in odd entries; N must be a power of two
///
/// + `inverse` - compute the inverse transform; the 1/N factor is applied
///   on the inverse side
///
pub fn fft(data: &mut [f64], inverse: bool) -> GaborResult<()> {
    let n = data.len() / 2;
    if data.len() % 2 != 0 || !n.is_power_of_two() {
        return Err(GaborError::shape(format!(
            "fft length must be a power of two, got {} values",
            data.len()
        )));
    }
    fft_in_place(data, inverse);
    Ok(())
}

/// 2D FFT by row transforms, a transpose, row transforms again and a
/// transpose back.
///
/// __Arguments:__
///
/// + `data` - flattened row-major array of interleaved complex values
///
/// + `dimensions` - (width, height) counted in complex values
///
/// + `inverse` - compute the inverse transform with the 1/(W H) factor
///
pub fn fft_2d(data: &mut [f64], dimensions: (usize, usize), inverse: bool) -> GaborResult<()> {
    let (width, height) = dimensions;
    if data.len() != 2 * width * height {
        return Err(GaborError::shape(format!(
            "buffer of {} values does not hold a {width}x{height} complex array",
            data.len()
        )));
    }
    if !width.is_power_of_two() || !height.is_power_of_two() {
        return Err(GaborError::shape(format!(
            "fft dimensions must be powers of two, got {width}x{height}"
        )));
    }

    let mut working = vec![0f64; data.len()];
    fft_2d_in_place(data, &mut working, dimensions, inverse);
    Ok(())
}

fn fft_in_place(data: &mut [f64], inverse: bool) {
    let n = data.len() / 2;
    if n < 2 {
        return;
    }

    // reorder entries by bit-reversed index
    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if j > i {
            data.swap(2 * i, 2 * j);
            data.swap(2 * i + 1, 2 * j + 1);
        }
    }

    let sign = if inverse { 1f64 } else { -1f64 };

    // butterflies over spans of doubling length
    let mut span = 2;
    while span <= n {
        let half = span / 2;
        let step = sign * 2f64 * PI / span as f64;

        for start in (0..n).step_by(span) {
            for k in 0..half {
                let (wi, wr) = (step * k as f64).sin_cos();
                let a = 2 * (start + k);
                let b = 2 * (start + k + half);

                let tr = wr * data[b] - wi * data[b + 1];
                let ti = wr * data[b + 1] + wi * data[b];

                data[b] = data[a] - tr;
                data[b + 1] = data[a + 1] - ti;
                data[a] += tr;
                data[a + 1] += ti;
            }
        }
        span <<= 1;
    }

    if inverse {
        let scale = 1f64 / n as f64;
        data.iter_mut().for_each(|v| *v *= scale);
    }
}

fn fft_2d_in_place(
    data: &mut [f64],
    working: &mut [f64],
    dimensions: (usize, usize),
    inverse: bool,
) {
    let (width, height) = dimensions;

    data.chunks_exact_mut(2 * width)
        .for_each(|row| fft_in_place(row, inverse));

    transpose(data, dimensions, working);

    // columns are rows of the transposed array
    working
        .chunks_exact_mut(2 * height)
        .for_each(|row| fft_in_place(row, inverse));

    transpose(working, (height, width), data);
}

/// Transpose a (width, height) array of interleaved complex values.
fn transpose(src: &[f64], (width, height): (usize, usize), dst: &mut [f64]) {
    for i in 0..height {
        for j in 0..width {
            let from = 2 * (i * width + j);
            let to = 2 * (j * height + i);
            dst[to] = src[from];
            dst[to + 1] = src[from + 1];
        }
    }
}

/// Same-size correlation computed as a spectral product.
///
/// The bordered image is zero-extended to power-of-two dimensions, which are
/// at least as large as the bordered image, so the circular wrap never
/// reaches the cropped output window.
pub fn filter_2d_fourier(
    image: ArrayView3<f32>,
    kernel: ArrayView2<f32>,
    border: BorderMode,
    depth: OutputDepth,
) -> Array3<f32> {
    let (height, width, channels) = image.dim();
    let (kh, kw) = kernel.dim();

    let (rows, cols) = kernel_margins(&kernel);
    let padded = pad_image(image, rows, cols, border);
    let (ph, pw, _) = padded.dim();

    let fh = ph.next_power_of_two();
    let fw = pw.next_power_of_two();

    let mut working = vec![0f64; 2 * fw * fh];

    // correlation is convolution with the kernel rotated by 180 degrees
    let mut kernel_spectrum = vec![0f64; 2 * fw * fh];
    for ky in 0..kh {
        for kx in 0..kw {
            let at = (kh - 1 - ky) * fw + (kw - 1 - kx);
            kernel_spectrum[2 * at] = kernel[[ky, kx]] as f64;
        }
    }
    fft_2d_in_place(&mut kernel_spectrum, &mut working, (fw, fh), false);

    let mut out = Array3::<f32>::zeros((height, width, channels));
    let mut buffer = vec![0f64; 2 * fw * fh];

    for chan in 0..channels {
        buffer.fill(0.0);
        for y in 0..ph {
            for x in 0..pw {
                buffer[2 * (y * fw + x)] = padded[[y, x, chan]] as f64;
            }
        }

        fft_2d_in_place(&mut buffer, &mut working, (fw, fh), false);

        for (z, k) in buffer
            .chunks_exact_mut(2)
            .zip(kernel_spectrum.chunks_exact(2))
        {
            let re = z[0] * k[0] - z[1] * k[1];
            let im = z[0] * k[1] + z[1] * k[0];
            z[0] = re;
            z[1] = im;
        }

        fft_2d_in_place(&mut buffer, &mut working, (fw, fh), true);

        // the full convolution is offset by the kernel extent
        for y in 0..height {
            for x in 0..width {
                let at = (y + kh - 1) * fw + (x + kw - 1);
                out[[y, x, chan]] = depth.quantize(buffer[2 * at]);
            }
        }
    }

    out
}
