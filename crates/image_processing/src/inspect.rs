// Write filter kernels and response maps to PNG files for visual inspection.

use gabor_bank::FilterBank;
use image::imageops::FilterType;
use ndarray::{ArrayView4, Axis};
use std::path::{Path, PathBuf};

use crate::ProcessingError;
use crate::basic_ops::{clamp_to_gray, stretch_to_gray};

/// Kernels are tiny, so each weight becomes a block of this many pixels.
const KERNEL_ZOOM: u32 = 8;

fn save_png(image: &image::GrayImage, path: PathBuf) -> Result<PathBuf, ProcessingError> {
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| ProcessingError::Encode {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Save every kernel of `bank` as `kernel_<size>_<orientation>.png` in
/// `out_dir`, weights stretched to the full gray range.
pub fn save_filter_bank(
    bank: &FilterBank,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ProcessingError> {
    std::fs::create_dir_all(out_dir).map_err(ProcessingError::io(out_dir))?;

    let mut written = Vec::with_capacity(bank.len());

    for group in bank.scales() {
        for (o, kernel) in group.kernels().iter().enumerate() {
            let gray = stretch_to_gray(kernel.weights().view());
            let side = kernel.size() as u32 * KERNEL_ZOOM;
            let zoomed = image::imageops::resize(&gray, side, side, FilterType::Nearest);

            let path = out_dir.join(format!("kernel_{:02}_{:02}.png", group.size(), o));
            written.push(save_png(&zoomed, path)?);
        }
    }

    log::info!("wrote {} kernels to {}", written.len(), out_dir.display());
    Ok(written)
}

/// Save the first channel of each scale of a `(S, H, W, C)` response
/// tensor as `response_<size>.png`, values clamped to `[0, 255]`.
pub fn save_responses(
    tensor: ArrayView4<f32>,
    scale_sizes: &[usize],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ProcessingError> {
    std::fs::create_dir_all(out_dir).map_err(ProcessingError::io(out_dir))?;

    let mut written = Vec::with_capacity(scale_sizes.len());

    for (scale, size) in tensor.axis_iter(Axis(0)).zip(scale_sizes) {
        let gray = clamp_to_gray(scale.index_axis(Axis(2), 0));
        let path = out_dir.join(format!("response_{size:02}.png"));
        written.push(save_png(&gray, path)?);
    }

    log::info!("wrote {} response maps to {}", written.len(), out_dir.display());
    Ok(written)
}
