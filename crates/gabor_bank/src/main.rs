// Runs the Gabor feature pipeline on synthetic test patterns.

use clap::Parser;
use gabor_bank::{ExtractorConfig, GaborError, GaborFeatureExtractor, PoolingType, single_channel};
use ndarray::Array2;
use std::f64::consts::PI;

/// Which test pattern to use.
const PATTERN: usize = 1;

const SIDE: usize = 64;

#[derive(Parser)]
#[command(about, long_about = None)]
struct Args {
    #[arg(long)]
    pattern: Option<usize>,
    #[arg(long, default_value_t = 9)]
    max_kernel_size: usize,
    #[arg(long, default_value_t = 4)]
    orientations: usize,
    #[arg(long, default_value = "mean")]
    pooling: PoolingType,
    #[arg(long, default_value_t = 4)]
    pool_size: usize,
}

/// Prints the filter bank, then the pooled features of the chosen pattern
/// per scale.
fn main() -> Result<(), GaborError> {
    let args = Args::parse();

    let image = match args.pattern.unwrap_or(PATTERN) {
        1 => vertical_stripes(),
        2 => checkerboard(),
        3 => diagonal_ramp(),
        n => {
            return Err(GaborError::InvalidConfiguration {
                reason: format!("no test pattern {n}"),
            });
        }
    };

    let config = ExtractorConfig::new(args.max_kernel_size, args.orientations, args.pooling)
        .with_pooling_kernel_size(args.pool_size);
    let extractor = GaborFeatureExtractor::new(config)?;
    let bank = extractor.build_filters()?;

    println!("Filter bank: {} kernels", bank.len());
    for kernel in bank.kernels() {
        let w = kernel.weights();
        let (min, max) = w
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        println!(
            "  {:>2}x{:<2} theta {:>5.1} deg  sum {:.4}  range [{:>7.4}, {:>7.4}]",
            kernel.size(),
            kernel.size(),
            kernel.theta().to_degrees(),
            kernel.sum(),
            min,
            max
        );
    }

    let response = extractor.get_gabor(single_channel(image.view()), &bank)?;
    let features = extractor.get_feature(response.view())?;

    let per_scale = features.len() / bank.num_scales();
    println!("Feature vector: {} values", features.len());
    for (size, chunk) in bank
        .scale_sizes()
        .iter()
        .zip(features.as_slice().unwrap_or(&[]).chunks(per_scale))
    {
        let mean = chunk.iter().sum::<f32>() / chunk.len() as f32;
        let max = chunk.iter().copied().fold(0.0, f32::max);
        println!("  scale {size:>2}: mean {mean:>7.2}  max {max:>6.1}");
    }

    Ok(())
}

fn vertical_stripes() -> Array2<f32> {
    // period of 10 pixels, matching the kernel wavelength
    Array2::from_shape_fn((SIDE, SIDE), |(_, x)| {
        (127.5 + 127.5 * (2.0 * PI * x as f64 / 10.0).cos()) as f32
    })
}

fn checkerboard() -> Array2<f32> {
    Array2::from_shape_fn((SIDE, SIDE), |(y, x)| {
        if (y / 8 + x / 8) % 2 == 0 { 255.0 } else { 0.0 }
    })
}

fn diagonal_ramp() -> Array2<f32> {
    Array2::from_shape_fn((SIDE, SIDE), |(y, x)| ((x + y) * 2) as f32)
}
