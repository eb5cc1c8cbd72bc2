// The Gabor feature extractor: filter responses per scale, stacked and pooled.

use crate::bank::{FilterBank, ScaleGroup};
use crate::config::ExtractorConfig;
use crate::convolution::correlate;
use crate::error::{GaborError, GaborResult};
use crate::pooling::{block_reduce, flatten, pooled_dim};
use ndarray::{Array2, Array3, Array4, ArrayView3, ArrayView4, Axis, Zip};
use rayon::{ThreadPool, prelude::*};

/// Computes texture features from oriented Gabor filter responses.
///
/// The extractor only holds its validated configuration; every call works on
/// the arguments it is given.
#[derive(Debug, Clone)]
pub struct GaborFeatureExtractor {
    config: ExtractorConfig,
}

impl GaborFeatureExtractor {
    pub fn new(config: ExtractorConfig) -> GaborResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Kernels for every (scale, orientation) pair of the configuration.
    pub fn build_filters(&self) -> GaborResult<FilterBank> {
        FilterBank::build(
            self.config.max_kernel_size,
            self.config.num_orientations,
            &self.config.params,
        )
    }

    /// Element-wise maximum over the responses of one scale group.
    ///
    /// The accumulator starts at zero, so with `f32` output depth negative
    /// responses are clipped as well.
    pub fn process(&self, image: ArrayView3<f32>, group: &ScaleGroup) -> Array3<f32> {
        let mut accum = Array3::<f32>::zeros(image.dim());

        for kernel in group.kernels() {
            let response = correlate(
                image,
                kernel.weights().view(),
                self.config.border,
                self.config.output_depth,
                self.config.method,
            );
            Zip::from(&mut accum)
                .and(&response)
                .for_each(|acc, &r| *acc = acc.max(r));
        }

        accum
    }

    /// Stack the aggregated response of every scale into an
    /// `(num_scales, H, W, C)` tensor.
    pub fn get_gabor(
        &self,
        image: ArrayView3<f32>,
        bank: &FilterBank,
    ) -> GaborResult<Array4<f32>> {
        let (height, width, channels) = image.dim();
        if height == 0 || width == 0 || channels == 0 {
            return Err(GaborError::shape(format!(
                "image must be non-empty, got {height}x{width}x{channels}"
            )));
        }
        if bank.num_scales() == 0 {
            return Err(GaborError::config("filter bank has no scales"));
        }

        let mut tensor = Array4::<f32>::zeros((bank.num_scales(), height, width, channels));

        for (mut slot, group) in tensor.axis_iter_mut(Axis(0)).zip(bank.scales()) {
            slot.assign(&self.process(image, group));
        }

        log::debug!("response tensor {:?}", tensor.dim());
        Ok(tensor)
    }

    /// Pool a response tensor into a `(1, M)` feature row.
    pub fn get_feature(&self, response: ArrayView4<f32>) -> GaborResult<Array2<f32>> {
        let pooled = block_reduce(
            response,
            self.config.pooling_kernel_size,
            self.config.pooling_type,
            self.config.edge_policy,
        )?;
        Ok(flatten(pooled))
    }

    /// Full pipeline for one `(H, W, C)` image.
    pub fn extract(
        &self,
        image: ArrayView3<f32>,
        bank: &FilterBank,
    ) -> GaborResult<Array2<f32>> {
        let response = self.get_gabor(image, bank)?;
        self.get_feature(response.view())
    }

    /// Length of the feature row produced for images of shape `(H, W, C)`.
    pub fn feature_len(
        &self,
        bank: &FilterBank,
        (height, width, channels): (usize, usize, usize),
    ) -> GaborResult<usize> {
        let (s, rows, cols, c) = pooled_dim(
            (bank.num_scales(), height, width, channels),
            self.config.pooling_kernel_size,
            self.config.edge_policy,
        )?;
        Ok(s * rows * cols * c)
    }

    /// Features of every image in an `(N, H, W, C)` batch as an `(N, M)` matrix.
    pub fn batch_process(
        &self,
        images: ArrayView4<f32>,
        bank: &FilterBank,
    ) -> GaborResult<Array2<f32>> {
        let mut features = self.allocate_batch(images, bank)?;

        for (mut row, image) in features
            .rows_mut()
            .into_iter()
            .zip(images.axis_iter(Axis(0)))
        {
            row.assign(&self.extract(image, bank)?.row(0));
        }

        Ok(features)
    }

    /// `batch_process` with images distributed over the threads of
    /// `thread_pool`. Rows keep the batch order.
    ///
    /// __Arguments:__
    ///
    /// + `images` - `(N, H, W, C)` batch
    ///
    /// + `bank` - filter bank shared by all workers
    ///
    /// + `thread_pool` - Rayon thread pool to execute the computation within
    ///
    pub fn batch_process_para(
        &self,
        images: ArrayView4<f32>,
        bank: &FilterBank,
        thread_pool: &ThreadPool,
    ) -> GaborResult<Array2<f32>> {
        let mut features = self.allocate_batch(images, bank)?;

        let rows = thread_pool.install(|| {
            (0..images.len_of(Axis(0)))
                .into_par_iter()
                .map(|i| self.extract(images.index_axis(Axis(0), i), bank))
                .collect::<GaborResult<Vec<_>>>()
        })?;

        for (mut row, computed) in features.rows_mut().into_iter().zip(&rows) {
            row.assign(&computed.row(0));
        }

        Ok(features)
    }

    fn allocate_batch(
        &self,
        images: ArrayView4<f32>,
        bank: &FilterBank,
    ) -> GaborResult<Array2<f32>> {
        let (count, height, width, channels) = images.dim();
        let len = self.feature_len(bank, (height, width, channels))?;

        log::info!(
            "extracting {len} features from each of {count} images ({height}x{width}x{channels}, {} kernels)",
            bank.len()
        );

        Ok(Array2::zeros((count, len)))
    }
}
