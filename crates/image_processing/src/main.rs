// CLI for extracting Gabor texture features from image files

use clap::{Args, Parser, Subcommand};
use gabor_bank::{
    BorderMode, ConvolutionMethod, EdgePolicy, ExtractorConfig, GaborError,
    GaborFeatureExtractor, OutputDepth, PoolingType,
};
use image_processing::{ProcessingError, features, inspect};
use std::path::PathBuf;

// setup command line args

#[derive(Parser)]
#[command(about = "Texture features from banks of oriented Gabor filters")]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write feature vectors of one or more images as JSON
    Extract(ExtractArgs),
    /// Write every kernel of the filter bank as a PNG
    Bank(BankArgs),
    /// Write the per-scale response maps of one image as PNGs
    Responses(ResponsesArgs),
}

#[derive(Debug, Args)]
pub struct BankOptions {
    /// Upper bound on kernel size; scales are 5, 9, 13, ...
    #[clap(long, default_value_t = 9)]
    max_kernel_size: usize,
    #[clap(long, default_value_t = 4)]
    orientations: usize,
    /// mean or max
    #[clap(long, default_value = "mean")]
    pooling: PoolingType,
    #[clap(long, default_value_t = gabor_bank::DEFAULT_POOLING_KERNEL_SIZE)]
    pool_size: usize,
    /// pad, truncate or reject
    #[clap(long, default_value = "pad")]
    edge_policy: EdgePolicy,
    /// reflect101, replicate or zero
    #[clap(long, default_value = "reflect101")]
    border: BorderMode,
    /// u8 or f32
    #[clap(long, default_value = "u8")]
    depth: OutputDepth,
    /// direct or fourier
    #[clap(long, default_value = "direct")]
    method: ConvolutionMethod,
}

impl BankOptions {
    fn extractor(&self) -> Result<GaborFeatureExtractor, GaborError> {
        let config = ExtractorConfig::new(self.max_kernel_size, self.orientations, self.pooling)
            .with_pooling_kernel_size(self.pool_size)
            .with_edge_policy(self.edge_policy)
            .with_border(self.border)
            .with_output_depth(self.depth)
            .with_method(self.method);
        GaborFeatureExtractor::new(config)
    }
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[clap(required = true)]
    paths: Vec<PathBuf>,
    #[command(flatten)]
    bank: BankOptions,
    /// Keep color channels instead of converting to grayscale
    #[clap(long, action)]
    rgb: bool,
    #[clap(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    resize: Option<Vec<u32>>,
    /// Worker threads, defaults to the number of CPUs
    #[clap(long)]
    threads: Option<usize>,
    #[clap(long, default_value = "features.json")]
    output: PathBuf,
}

#[derive(Debug, Args)]
pub struct BankArgs {
    #[command(flatten)]
    bank: BankOptions,
    #[clap(long, default_value = "gabor_bank")]
    out_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct ResponsesArgs {
    path: PathBuf,
    #[command(flatten)]
    bank: BankOptions,
    #[clap(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    resize: Option<Vec<u32>>,
    #[clap(long, default_value = "gabor_responses")]
    out_dir: PathBuf,
}

fn resize_dims(resize: &Option<Vec<u32>>) -> Option<(u32, u32)> {
    match resize.as_deref() {
        Some([width, height]) => Some((*width, *height)),
        _ => None,
    }
}

fn main() -> Result<(), ProcessingError> {
    env_logger::init();

    let args = CliArgs::parse();

    match args.command {
        Command::Extract(args) => {
            let extractor = args.bank.extractor()?;
            let bank = extractor.build_filters()?;

            let thread_pool = rayon::ThreadPoolBuilder::new()
                .num_threads(args.threads.unwrap_or_else(num_cpus::get))
                .build()?;

            let options = features::LoadOptions {
                rgb: args.rgb,
                resize: resize_dims(&args.resize),
            };

            let records =
                features::extract_files(&args.paths, &extractor, &bank, &options, &thread_pool)?;
            features::write_records(&records, &args.output)?;
        }
        Command::Bank(args) => {
            let bank = args.bank.extractor()?.build_filters()?;
            inspect::save_filter_bank(&bank, &args.out_dir)?;
        }
        Command::Responses(args) => {
            let extractor = args.bank.extractor()?;
            let bank = extractor.build_filters()?;

            let options = features::LoadOptions {
                rgb: false,
                resize: resize_dims(&args.resize),
            };
            let image = features::load_array(&args.path, &options)?;

            let tensor = extractor.get_gabor(image.view(), &bank)?;
            inspect::save_responses(tensor.view(), &bank.scale_sizes(), &args.out_dir)?;
        }
    }

    Ok(())
}
