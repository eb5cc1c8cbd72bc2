// Load image files into a batch, extract Gabor features and write them out.

use gabor_bank::{FilterBank, GaborFeatureExtractor};
use ndarray::{Array3, Array4, Axis};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[cfg(feature = "timing")]
use std::time;

use crate::basic_ops::{grayscale_array, resize, rgb_array};
use crate::{Image, ProcessingError};

#[cfg(feature = "timing")]
fn report_elapsed(stage: &str, time: time::Instant) {
    let elapsed = time.elapsed().as_secs_f32();
    log::info!("{stage} ... {:>2.3}s", elapsed);
}

/// How image files are turned into extractor input.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadOptions {
    /// Keep red, green and blue as three channels instead of converting to grayscale.
    pub rgb: bool,
    /// Resize to (width, height) before conversion.
    pub resize: Option<(u32, u32)>,
}

/// One output row: the source file and its feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub path: String,
    pub features: Vec<f32>,
}

pub fn load_array(path: &Path, options: &LoadOptions) -> Result<Array3<f32>, ProcessingError> {
    let mut image = Image::from_file(path)?;

    if let Some((width, height)) = options.resize {
        image = resize(&image, width, height);
    }

    Ok(if options.rgb {
        rgb_array(&image.image)
    } else {
        grayscale_array(&image.image)
    })
}

/// Stack the images at `paths` into an `(N, H, W, C)` batch. All images must
/// share dimensions after the optional resize.
pub fn load_batch(
    paths: &[PathBuf],
    options: &LoadOptions,
) -> Result<Array4<f32>, ProcessingError> {
    if paths.is_empty() {
        return Err(ProcessingError::NoImages);
    }

    let arrays = paths
        .iter()
        .map(|path| load_array(path, options))
        .collect::<Result<Vec<_>, _>>()?;

    let expected = arrays[0].dim();
    for (path, array) in paths.iter().zip(&arrays) {
        if array.dim() != expected {
            return Err(ProcessingError::InconsistentDimensions {
                path: path.clone(),
                actual: array.dim(),
                expected,
            });
        }
    }

    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    Ok(ndarray::stack(Axis(0), &views)?)
}

/// Extract one feature record per image file.
///
/// __Arguments:__
///
/// + `paths` - image files, all of the same size after loading
///
/// + `extractor` - configured extractor
///
/// + `bank` - filter bank built by `extractor`
///
/// + `options` - grayscale or RGB input, optional resize
///
/// + `thread_pool` - Rayon thread pool the images are spread over
///
pub fn extract_files(
    paths: &[PathBuf],
    extractor: &GaborFeatureExtractor,
    bank: &FilterBank,
    options: &LoadOptions,
    thread_pool: &ThreadPool,
) -> Result<Vec<FeatureRecord>, ProcessingError> {
    #[cfg(feature = "timing")]
    let time = time::Instant::now();

    let batch = load_batch(paths, options)?;
    log::info!("loaded {} images, batch {:?}", paths.len(), batch.dim());

    #[cfg(feature = "timing")]
    report_elapsed("loading", time);
    #[cfg(feature = "timing")]
    let time = time::Instant::now();

    let features = extractor.batch_process_para(batch.view(), bank, thread_pool)?;

    #[cfg(feature = "timing")]
    report_elapsed("extraction", time);

    Ok(paths
        .iter()
        .zip(features.rows())
        .map(|(path, row)| FeatureRecord {
            path: path.display().to_string(),
            features: row.to_vec(),
        })
        .collect())
}

/// Write records as a pretty-printed JSON array.
pub fn write_records(records: &[FeatureRecord], out_path: &Path) -> Result<(), ProcessingError> {
    let file = File::create(out_path).map_err(ProcessingError::io(out_path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)?;

    log::info!("wrote {} feature vectors to {}", records.len(), out_path.display());
    Ok(())
}
