//! Times feature extraction over a synthetic batch with each correlation
//! backend, sequentially and in a thread pool.

use gabor_bank::{ConvolutionMethod, ExtractorConfig, GaborFeatureExtractor, PoolingType};
use ndarray::Array4;
use std::time::Instant;

const BATCH: usize = 16;
const SIDE: usize = 128;

fn main() -> Result<(), image_processing::ProcessingError> {
    env_logger::init();

    let images = Array4::from_shape_fn((BATCH, SIDE, SIDE, 1), |(n, y, x, _)| {
        ((n * 13 + y * y + 3 * x) % 256) as f32
    });

    let thread_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build()?;

    for method in [ConvolutionMethod::Direct, ConvolutionMethod::Fourier] {
        let config = ExtractorConfig::new(17, 8, PoolingType::Mean)
            .with_pooling_kernel_size(8)
            .with_method(method);
        let extractor = GaborFeatureExtractor::new(config)?;
        let bank = extractor.build_filters()?;

        let start = Instant::now();
        let sequential = extractor.batch_process(images.view(), &bank)?;
        log::info!("{method} sequential: {:?}", start.elapsed());

        let start = Instant::now();
        let parallel = extractor.batch_process_para(images.view(), &bank, &thread_pool)?;
        log::info!(
            "{method} on {} threads: {:?}",
            thread_pool.current_num_threads(),
            start.elapsed()
        );

        assert_eq!(sequential.dim(), parallel.dim());
    }

    Ok(())
}

// Run with logging enabled to see the timings:
//  RUST_LOG=info cargo run --release --bin perf_extract
