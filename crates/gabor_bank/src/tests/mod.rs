// unit tests

use super::*;
use crate::bank::{orientations, scale_sizes};
use crate::convolution::{correlate, filter_2d};
use crate::fourier::{fft, fft_2d};
use crate::pooling::{block_reduce, flatten};
use ndarray::{Array2, Array3, Array4, Axis, array};
use std::f64::consts::PI;

// test helper functions

/// Deterministic pseudo-random pixel values in `[0, 255]`.
fn noise_image(height: usize, width: usize, channels: usize, seed: u64) -> Array3<f32> {
    let mut state = seed;
    Array3::from_shape_fn((height, width, channels), |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) % 256) as f32
    })
}

fn gradient_image(height: usize, width: usize) -> Array2<f32> {
    Array2::from_shape_fn((height, width), |(y, x)| ((7 * x + 3 * y) % 256) as f32)
}

fn extractor(
    max_kernel_size: usize,
    orientations: usize,
    pooling: PoolingType,
    k: usize,
) -> GaborFeatureExtractor {
    let config = ExtractorConfig::new(max_kernel_size, orientations, pooling)
        .with_pooling_kernel_size(k);
    GaborFeatureExtractor::new(config).unwrap()
}

fn max_abs_diff(a: &Array3<f32>, b: &Array3<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

// filter bank

#[test]
fn kernel_count_follows_scale_ladder() {
    for (max_kernel_size, n) in [(5, 1), (7, 3), (9, 4), (13, 2), (21, 8), (23, 6)] {
        let bank = FilterBank::build(max_kernel_size, n, &GaborParams::default()).unwrap();
        let scales = ((max_kernel_size as f64 - 5.0) / 4.0 + 1.0).ceil() as usize;

        assert_eq!(bank.len(), n * scales, "bound {max_kernel_size}, {n} orientations");
        assert_eq!(bank.num_scales(), scales);
        assert!(bank.scales().iter().all(|g| g.len() == n));
    }
}

#[test]
fn scale_sizes_round_up_past_bound() {
    assert_eq!(scale_sizes(5).collect::<Vec<_>>(), vec![5]);
    assert_eq!(scale_sizes(7).collect::<Vec<_>>(), vec![5, 9]);
    assert_eq!(scale_sizes(9).collect::<Vec<_>>(), vec![5, 9]);
    assert_eq!(scale_sizes(13).collect::<Vec<_>>(), vec![5, 9, 13]);

    let bank = FilterBank::build(13, 2, &GaborParams::default()).unwrap();
    assert_eq!(bank.scale_sizes(), vec![5, 9, 13]);
    for group in bank.scales() {
        assert!(group.kernels().iter().all(|k| k.weights().dim() == (group.size(), group.size())));
    }
}

#[test]
fn orientations_are_evenly_spaced() {
    let thetas: Vec<f64> = orientations(4).collect();
    assert_eq!(thetas.len(), 4);
    for (i, theta) in thetas.iter().enumerate() {
        assert!((theta - i as f64 * PI / 4.0).abs() < 1e-12);
    }
    assert!(thetas.iter().all(|&t| (0.0..PI).contains(&t)));

    let bank = FilterBank::build(9, 6, &GaborParams::default()).unwrap();
    for group in bank.scales() {
        let angles: Vec<f64> = group.kernels().iter().map(GaborKernel::theta).collect();
        assert_eq!(angles, orientations(6).collect::<Vec<_>>());
    }
}

#[test]
fn kernels_sum_to_normalization_target() {
    let bank = FilterBank::build(21, 8, &GaborParams::default()).unwrap();
    for kernel in bank.kernels() {
        assert!(
            (kernel.sum() - 1.0 / 1.5).abs() < 1e-4,
            "size {} theta {} sums to {}",
            kernel.size(),
            kernel.theta(),
            kernel.sum()
        );
    }
}

#[test]
fn even_phase_kernel_is_point_symmetric() {
    let kernel = GaborKernel::synthesize(9, PI / 3.0, &GaborParams::default()).unwrap();
    let w = kernel.weights();
    let n = kernel.size();
    for r in 0..n {
        for c in 0..n {
            assert!((w[[r, c]] - w[[n - 1 - r, n - 1 - c]]).abs() < 1e-6);
        }
    }
}

#[test]
fn horizontal_kernel_oscillates_along_columns() {
    // theta = 0 puts the carrier along x
    let kernel = GaborKernel::synthesize(13, 0.0, &GaborParams::default()).unwrap();
    let w = kernel.weights();
    let center = 6;
    // cos(2 pi * 6 / 10) < 0 at the left and right edges of the center row
    assert!(w[[center, center]] > 0.0);
    assert!(w[[center, 0]] < 0.0);
    assert!(w[[center, 12]] < 0.0);
}

#[test]
fn odd_phase_kernel_is_degenerate() {
    let params = GaborParams {
        psi: PI / 2.0,
        ..GaborParams::default()
    };
    match GaborKernel::synthesize(5, 0.0, &params) {
        Err(GaborError::DegenerateKernel { size, .. }) => assert_eq!(size, 5),
        other => panic!("expected degenerate kernel, got {other:?}"),
    }
    assert!(matches!(
        FilterBank::build(9, 4, &params),
        Err(GaborError::DegenerateKernel { .. })
    ));
}

#[test]
fn even_kernel_size_is_rejected() {
    assert!(matches!(
        GaborKernel::synthesize(6, 0.0, &GaborParams::default()),
        Err(GaborError::InvalidConfiguration { .. })
    ));
}

#[test]
fn flat_kernel_list_regroups_by_orientation_count() {
    let bank = FilterBank::build(13, 4, &GaborParams::default()).unwrap();
    let regrouped = FilterBank::from_flat(bank.clone().into_flat(), 4).unwrap();
    assert_eq!(regrouped, bank);

    let mut flat = bank.clone().into_flat();
    flat.pop();
    assert!(matches!(
        FilterBank::from_flat(flat, 4),
        Err(GaborError::InvalidConfiguration { .. })
    ));

    // two orientations per group would pair a 5x5 with a 9x9 kernel here
    let mixed: Vec<GaborKernel> = bank.kernels().skip(3).take(2).cloned().collect();
    assert!(matches!(
        FilterBank::from_flat(mixed, 2),
        Err(GaborError::ShapeMismatch { .. })
    ));

    assert!(FilterBank::from_flat(Vec::new(), 4).is_err());
    assert!(FilterBank::from_flat(bank.into_flat(), 0).is_err());
}

// configuration

#[test]
fn invalid_configuration_is_rejected() {
    let cases = [
        ExtractorConfig::new(3, 4, PoolingType::Mean),
        ExtractorConfig::new(0, 4, PoolingType::Mean),
        ExtractorConfig::new(9, 0, PoolingType::Max),
        ExtractorConfig::new(9, 4, PoolingType::Max).with_pooling_kernel_size(0),
        ExtractorConfig::new(9, 4, PoolingType::Max).with_params(GaborParams {
            normalization: 0.0,
            ..GaborParams::default()
        }),
        ExtractorConfig::new(9, 4, PoolingType::Max).with_params(GaborParams {
            sigma: -1.0,
            ..GaborParams::default()
        }),
    ];

    for config in cases {
        assert!(
            matches!(
                GaborFeatureExtractor::new(config.clone()),
                Err(GaborError::InvalidConfiguration { .. })
            ),
            "{config:?} accepted"
        );
    }
}

#[test]
fn pooling_type_parses_only_mean_and_max() {
    assert_eq!("mean".parse::<PoolingType>().unwrap(), PoolingType::Mean);
    assert_eq!("max".parse::<PoolingType>().unwrap(), PoolingType::Max);
    for bad in ["median", "Mean", ""] {
        assert!(matches!(
            bad.parse::<PoolingType>(),
            Err(GaborError::InvalidConfiguration { .. })
        ));
    }
}

#[test]
fn options_parse_from_their_display_names() {
    for mode in [BorderMode::Reflect101, BorderMode::Replicate, BorderMode::Zero] {
        assert_eq!(mode.to_string().parse::<BorderMode>().unwrap(), mode);
    }
    for policy in [EdgePolicy::Pad, EdgePolicy::Truncate, EdgePolicy::Reject] {
        assert_eq!(policy.to_string().parse::<EdgePolicy>().unwrap(), policy);
    }
    assert_eq!("f32".parse::<OutputDepth>().unwrap(), OutputDepth::F32);
    assert_eq!("fft".parse::<ConvolutionMethod>().unwrap(), ConvolutionMethod::Fourier);
    assert!("wrap".parse::<BorderMode>().is_err());
}

#[test]
fn default_config_matches_documented_values() {
    let config = ExtractorConfig::new(9, 4, PoolingType::Mean);
    assert_eq!(config.pooling_kernel_size, DEFAULT_POOLING_KERNEL_SIZE);
    assert_eq!(config.pooling_kernel_size, 3);
    assert_eq!(config.border, BorderMode::Reflect101);
    assert_eq!(config.output_depth, OutputDepth::U8);
    assert_eq!(config.edge_policy, EdgePolicy::Pad);
    assert_eq!(config.params.sigma, 4.0);
    assert_eq!(config.params.lambda, 10.0);
    assert_eq!(config.params.gamma, 0.5);
    assert_eq!(config.params.psi, 0.0);
}

// correlation

#[test]
fn border_modes_map_outside_coordinates() {
    let r = BorderMode::Reflect101;
    assert_eq!(r.source_index(-1, 5), Some(1));
    assert_eq!(r.source_index(-2, 5), Some(2));
    assert_eq!(r.source_index(5, 5), Some(3));
    assert_eq!(r.source_index(6, 5), Some(2));
    assert_eq!(r.source_index(-3, 1), Some(0));

    let p = BorderMode::Replicate;
    assert_eq!(p.source_index(-3, 5), Some(0));
    assert_eq!(p.source_index(7, 5), Some(4));

    assert_eq!(BorderMode::Zero.source_index(-1, 5), None);
    assert_eq!(BorderMode::Zero.source_index(2, 5), Some(2));
}

#[test]
fn identity_kernel_reproduces_image() {
    let image = noise_image(6, 5, 2, 7);
    let kernel = array![[0.0f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];

    for border in [BorderMode::Reflect101, BorderMode::Replicate, BorderMode::Zero] {
        let out = filter_2d(image.view(), kernel.view(), border, OutputDepth::F32);
        assert_eq!(out, image);
    }
}

#[test]
fn correlation_does_not_flip_kernel() {
    let mut image = Array3::<f32>::zeros((5, 5, 1));
    image[[2, 2, 0]] = 1.0;
    let kernel = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];

    let out = filter_2d(image.view(), kernel.view(), BorderMode::Zero, OutputDepth::F32);

    // an impulse picks up the kernel rotated by 180 degrees
    assert_eq!(out[[1, 1, 0]], 9.0);
    assert_eq!(out[[1, 3, 0]], 7.0);
    assert_eq!(out[[3, 1, 0]], 3.0);
    assert_eq!(out[[3, 3, 0]], 1.0);
}

#[test]
fn u8_depth_rounds_and_saturates() {
    let image = Array3::from_shape_vec((1, 3, 1), vec![200.0f32, 0.25, 2.5]).unwrap();
    let kernel = array![[2.0f32]];
    let out = filter_2d(image.view(), kernel.view(), BorderMode::Zero, OutputDepth::U8);
    assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![255.0, 0.0, 5.0]);

    let negative = array![[-1.0f32]];
    let out = filter_2d(image.view(), negative.view(), BorderMode::Zero, OutputDepth::U8);
    assert!(out.iter().all(|&v| v == 0.0));

    assert_eq!(OutputDepth::U8.quantize(2.5), 2.0);
    assert_eq!(OutputDepth::U8.quantize(3.5), 4.0);
}

#[test]
fn fourier_correlation_matches_direct() {
    let image = noise_image(13, 10, 2, 11);
    let bank = FilterBank::build(9, 3, &GaborParams::default()).unwrap();

    for border in [BorderMode::Reflect101, BorderMode::Replicate, BorderMode::Zero] {
        for kernel in bank.kernels() {
            let direct = correlate(
                image.view(),
                kernel.weights().view(),
                border,
                OutputDepth::F32,
                ConvolutionMethod::Direct,
            );
            let spectral = correlate(
                image.view(),
                kernel.weights().view(),
                border,
                OutputDepth::F32,
                ConvolutionMethod::Fourier,
            );
            assert!(max_abs_diff(&direct, &spectral) < 1e-3, "{border} size {}", kernel.size());
        }
    }
}

#[test]
fn fft_of_impulse_is_flat() {
    let mut data = vec![0f64; 16];
    data[0] = 1.0;
    fft(&mut data, false).unwrap();
    for pair in data.chunks_exact(2) {
        assert!((pair[0] - 1.0).abs() < 1e-12);
        assert!(pair[1].abs() < 1e-12);
    }

    let mut grid = vec![0f64; 2 * 4 * 2];
    grid[0] = 8.0;
    fft_2d(&mut grid, (4, 2), true).unwrap();
    for pair in grid.chunks_exact(2) {
        assert!((pair[0] - 1.0).abs() < 1e-12);
    }
}

#[test]
fn fft_rejects_non_power_of_two_lengths() {
    let mut data = vec![0f64; 12];
    assert!(matches!(fft(&mut data, false), Err(GaborError::ShapeMismatch { .. })));
    assert!(fft_2d(&mut data, (3, 2), false).is_err());
    assert!(fft_2d(&mut data, (4, 2), false).is_err());
}

// response aggregation

#[test]
fn constant_image_gives_uniform_response() {
    let image = Array3::<f32>::from_elem((20, 20, 1), 100.0);
    let gabor = extractor(9, 4, PoolingType::Mean, 4);
    let bank = gabor.build_filters().unwrap();

    let tensor = gabor.get_gabor(image.view(), &bank).unwrap();
    assert_eq!(tensor.dim(), (2, 20, 20, 1));

    // every kernel sums to 1 / 1.5, so the response is 100 / 1.5 rounded
    assert!(tensor.iter().all(|&v| v == 67.0));
}

#[test]
fn constant_image_is_uniform_inside_zero_border() {
    let image = Array3::<f32>::from_elem((20, 20, 1), 100.0);
    let config = ExtractorConfig::new(9, 4, PoolingType::Mean).with_border(BorderMode::Zero);
    let gabor = GaborFeatureExtractor::new(config).unwrap();
    let bank = gabor.build_filters().unwrap();

    let tensor = gabor.get_gabor(image.view(), &bank).unwrap();
    for (s, scale) in tensor.axis_iter(Axis(0)).enumerate() {
        let margin = bank.scales()[s].size() / 2;
        let reference = scale[[margin, margin, 0]];
        for y in margin..20 - margin {
            for x in margin..20 - margin {
                assert_eq!(scale[[y, x, 0]], reference);
            }
        }
    }
}

#[test]
fn aggregation_is_maximum_over_orientations() {
    let image = noise_image(12, 12, 1, 3);
    let gabor = extractor(5, 4, PoolingType::Max, 3);
    let bank = gabor.build_filters().unwrap();
    let group = &bank.scales()[0];

    let aggregated = gabor.process(image.view(), group);

    let responses: Vec<Array3<f32>> = group
        .kernels()
        .iter()
        .map(|k| {
            filter_2d(
                image.view(),
                k.weights().view(),
                BorderMode::Reflect101,
                OutputDepth::U8,
            )
        })
        .collect();

    for ((y, x, c), &value) in aggregated.indexed_iter() {
        let expected = responses.iter().map(|r| r[[y, x, c]]).fold(0.0, f32::max);
        assert_eq!(value, expected);
    }
}

#[test]
fn empty_image_is_rejected() {
    let gabor = extractor(9, 4, PoolingType::Mean, 4);
    let bank = gabor.build_filters().unwrap();
    let image = Array3::<f32>::zeros((0, 8, 1));
    assert!(matches!(
        gabor.get_gabor(image.view(), &bank),
        Err(GaborError::ShapeMismatch { .. })
    ));
}

// pooling

#[test]
fn mean_of_identical_block_is_that_value() {
    let tensor = Array4::<f32>::from_elem((2, 4, 4, 1), 7.5);
    let pooled = block_reduce(tensor.view(), 2, PoolingType::Mean, EdgePolicy::Reject).unwrap();
    assert_eq!(pooled.dim(), (2, 2, 2, 1));
    assert!(pooled.iter().all(|&v| v == 7.5));
}

#[test]
fn max_of_block_returns_its_peak() {
    let mut tensor = Array4::<f32>::zeros((1, 4, 4, 2));
    tensor[[0, 1, 1, 0]] = 9.0;
    tensor[[0, 3, 2, 1]] = 4.0;

    let pooled = block_reduce(tensor.view(), 2, PoolingType::Max, EdgePolicy::Reject).unwrap();
    assert_eq!(pooled[[0, 0, 0, 0]], 9.0);
    assert_eq!(pooled[[0, 1, 1, 1]], 4.0);
    assert_eq!(pooled[[0, 1, 1, 0]], 0.0);
    assert_eq!(pooled[[0, 0, 0, 1]], 0.0);
}

#[test]
fn edge_policies_size_partial_blocks() {
    let tensor = Array4::<f32>::from_elem((1, 5, 7, 1), 1.0);

    let padded = block_reduce(tensor.view(), 2, PoolingType::Mean, EdgePolicy::Pad).unwrap();
    assert_eq!(padded.dim(), (1, 3, 4, 1));
    assert_eq!(padded[[0, 0, 0, 0]], 1.0);
    // last row of blocks covers one real row out of two
    assert_eq!(padded[[0, 2, 0, 0]], 0.5);
    assert_eq!(padded[[0, 2, 3, 0]], 0.25);

    let truncated = block_reduce(tensor.view(), 2, PoolingType::Mean, EdgePolicy::Truncate).unwrap();
    assert_eq!(truncated.dim(), (1, 2, 3, 1));
    assert!(truncated.iter().all(|&v| v == 1.0));

    assert!(matches!(
        block_reduce(tensor.view(), 2, PoolingType::Mean, EdgePolicy::Reject),
        Err(GaborError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        block_reduce(tensor.view(), 8, PoolingType::Max, EdgePolicy::Truncate),
        Err(GaborError::ShapeMismatch { .. })
    ));
}

#[test]
fn padded_max_sees_zero_fill() {
    let tensor = Array4::<f32>::from_elem((1, 3, 3, 1), -2.0);
    let pooled = block_reduce(tensor.view(), 2, PoolingType::Max, EdgePolicy::Pad).unwrap();
    assert_eq!(pooled[[0, 0, 0, 0]], -2.0);
    assert_eq!(pooled[[0, 1, 1, 0]], 0.0);
}

#[test]
fn flatten_orders_scale_row_column_channel() {
    let pooled = Array4::from_shape_fn((2, 2, 2, 3), |(s, y, x, c)| {
        (s * 1000 + y * 100 + x * 10 + c) as f32
    });
    let row = flatten(pooled);
    assert_eq!(row.dim(), (1, 24));
    assert_eq!(row[[0, 0]], 0.0);
    assert_eq!(row[[0, 1]], 1.0);
    assert_eq!(row[[0, 3]], 10.0);
    assert_eq!(row[[0, 6]], 100.0);
    assert_eq!(row[[0, 12]], 1000.0);
    assert_eq!(row[[0, 23]], 1112.0);
}

// end to end

#[test]
fn single_channel_64x64_gives_512_features() {
    let gabor = extractor(9, 4, PoolingType::Mean, 4);
    let bank = gabor.build_filters().unwrap();
    let image = gradient_image(64, 64);

    let features = gabor.extract(single_channel(image.view()), &bank).unwrap();

    assert_eq!(features.dim(), (1, 2 * 16 * 16));
    assert_eq!(gabor.feature_len(&bank, (64, 64, 1)).unwrap(), 512);
    assert!(features.iter().all(|&v| (0.0..=255.0).contains(&v)));
}

#[test]
fn color_channels_are_pooled_independently() {
    let gray = noise_image(16, 16, 1, 5);
    let color = ndarray::concatenate(Axis(2), &[gray.view(), gray.view(), gray.view()]).unwrap();

    let gabor = extractor(9, 4, PoolingType::Max, 4);
    let bank = gabor.build_filters().unwrap();

    let single = gabor.extract(gray.view(), &bank).unwrap();
    let triple = gabor.extract(color.view(), &bank).unwrap();

    assert_eq!(triple.len(), 3 * single.len());
    for (i, &v) in single.iter().enumerate() {
        for c in 0..3 {
            assert_eq!(triple[[0, 3 * i + c]], v);
        }
    }
}

#[test]
fn batch_rows_match_single_image_pipeline() {
    let gabor = extractor(9, 4, PoolingType::Mean, 4);
    let bank = gabor.build_filters().unwrap();
    let images = Array4::from_shape_fn((3, 16, 20, 1), |(n, y, x, _)| {
        ((n * 31 + y * 5 + x * 11) % 256) as f32
    });

    let features = gabor.batch_process(images.view(), &bank).unwrap();
    assert_eq!(features.nrows(), 3);

    for (n, image) in images.axis_iter(Axis(0)).enumerate() {
        let expected = gabor.extract(image, &bank).unwrap();
        assert_eq!(features.row(n), expected.row(0));
    }
}

#[test]
fn parallel_batch_matches_sequential() {
    let gabor = extractor(13, 3, PoolingType::Max, 3);
    let bank = gabor.build_filters().unwrap();
    let images = Array4::from_shape_fn((5, 12, 12, 3), |(n, y, x, c)| {
        ((n * 17 + y * 3 + x * 7 + c * 29) % 256) as f32
    });

    let thread_pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();

    let sequential = gabor.batch_process(images.view(), &bank).unwrap();
    let parallel = gabor.batch_process_para(images.view(), &bank, &thread_pool).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn empty_batch_has_feature_width() {
    let gabor = extractor(9, 4, PoolingType::Mean, 4);
    let bank = gabor.build_filters().unwrap();
    let images = Array4::<f32>::zeros((0, 64, 64, 1));

    let features = gabor.batch_process(images.view(), &bank).unwrap();
    assert_eq!(features.dim(), (0, 512));
}

#[test]
fn reject_policy_fails_whole_batch() {
    let config = ExtractorConfig::new(9, 2, PoolingType::Mean)
        .with_pooling_kernel_size(4)
        .with_edge_policy(EdgePolicy::Reject);
    let gabor = GaborFeatureExtractor::new(config).unwrap();
    let bank = gabor.build_filters().unwrap();
    let images = Array4::<f32>::zeros((2, 10, 12, 1));

    assert!(matches!(
        gabor.batch_process(images.view(), &bank),
        Err(GaborError::ShapeMismatch { .. })
    ));
}
