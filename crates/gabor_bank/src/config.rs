// Extractor configuration.

use crate::bank::MIN_KERNEL_SIZE;
use crate::convolution::{BorderMode, ConvolutionMethod, OutputDepth};
use crate::error::{GaborError, GaborResult};
use crate::kernel::GaborParams;
use crate::pooling::{EdgePolicy, PoolingType};

pub const DEFAULT_POOLING_KERNEL_SIZE: usize = 3;

/// Settings fixed when a `GaborFeatureExtractor` is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Upper bound on kernel side length; scales run 5, 9, 13, ...
    pub max_kernel_size: usize,
    pub num_orientations: usize,
    pub pooling_type: PoolingType,
    /// Side of the square pooling window.
    pub pooling_kernel_size: usize,
    pub edge_policy: EdgePolicy,
    pub border: BorderMode,
    pub output_depth: OutputDepth,
    pub method: ConvolutionMethod,
    pub params: GaborParams,
}

impl ExtractorConfig {
    pub fn new(max_kernel_size: usize, num_orientations: usize, pooling_type: PoolingType) -> Self {
        Self {
            max_kernel_size,
            num_orientations,
            pooling_type,
            pooling_kernel_size: DEFAULT_POOLING_KERNEL_SIZE,
            edge_policy: EdgePolicy::default(),
            border: BorderMode::default(),
            output_depth: OutputDepth::default(),
            method: ConvolutionMethod::default(),
            params: GaborParams::default(),
        }
    }

    pub fn with_pooling_kernel_size(mut self, size: usize) -> Self {
        self.pooling_kernel_size = size;
        self
    }

    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    pub fn with_border(mut self, border: BorderMode) -> Self {
        self.border = border;
        self
    }

    pub fn with_output_depth(mut self, output_depth: OutputDepth) -> Self {
        self.output_depth = output_depth;
        self
    }

    pub fn with_method(mut self, method: ConvolutionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_params(mut self, params: GaborParams) -> Self {
        self.params = params;
        self
    }

    pub fn validate(&self) -> GaborResult<()> {
        if self.max_kernel_size < MIN_KERNEL_SIZE {
            return Err(GaborError::config(format!(
                "maximum kernel size must be at least {MIN_KERNEL_SIZE}, got {}",
                self.max_kernel_size
            )));
        }
        if self.num_orientations == 0 {
            return Err(GaborError::config("number of orientations must be positive"));
        }
        if self.pooling_kernel_size == 0 {
            return Err(GaborError::config("pooling kernel size must be positive"));
        }
        self.params.validate()
    }
}
