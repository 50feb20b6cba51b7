//! CNN Model Architecture for Leaf Disease Classification
//!
//! This module implements the convolutional network used by the service:
//! a feature-extraction backbone topped by a small classification head
//! (global average pooling, dropout, a 128-unit dense layer, dropout,
//! and the 38-way output layer). Backbone weights come from the
//! exported checkpoint and are never updated at runtime; there is no
//! training path in this crate.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the LeafClassifier model
#[derive(Config, Debug)]
pub struct LeafClassifierConfig {
    /// Number of output classes
    #[config(default = "38")]
    pub num_classes: usize,

    /// Input image size (assumes square images)
    #[config(default = "224")]
    pub input_size: usize,

    /// Dropout rate in the classification head
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,
}

/// A backbone block with Conv2d, BatchNorm, ReLU, and optional MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
    pub relu: Relu,
    pub pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        with_pool: bool,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Leaf Disease Classifier
///
/// Architecture:
/// - 4 convolutional backbone blocks with increasing filter counts
///   (frozen: weights are loaded from the checkpoint, never trained here)
/// - Global Average Pooling
/// - Dropout, 128-unit dense layer, Dropout, 38-way output layer
#[derive(Module, Debug)]
pub struct LeafClassifier<B: Backend> {
    // Backbone blocks
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,
    pub conv4: ConvBlock<B>,

    // Global pooling
    pub global_pool: AdaptiveAvgPool2d,

    // Classification head
    pub dropout1: Dropout,
    pub fc1: Linear<B>,
    pub dropout2: Dropout,
    pub fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> LeafClassifier<B> {
    /// Create a new LeafClassifier from configuration
    pub fn new(config: &LeafClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        // Backbone: 3 -> 32 -> 64 -> 128 -> 256, halving spatial dims each block
        let conv1 = ConvBlock::new(config.in_channels, base, 3, true, device);
        let conv2 = ConvBlock::new(base, base * 2, 3, true, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, 3, true, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, 3, true, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        // Head: pooled features -> 128 -> num_classes
        let dropout1 = DropoutConfig::new(config.dropout_rate).init();
        let fc1 = LinearConfig::new(base * 8, 128).init(device);
        let dropout2 = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(128, config.num_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
            dropout1,
            fc1,
            dropout2,
            fc2,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        // Backbone feature extraction
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // Global pooling: [B, C, H, W] -> [B, C, 1, 1]
        let x = self.global_pool.forward(x);

        // Flatten: [B, C, 1, 1] -> [B, C]
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        // Classification head
        let x = self.dropout1.forward(x);
        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout2.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    type TestBackend = DefaultBackend;

    #[test]
    fn test_leaf_classifier_output_shape() {
        let device = Default::default();
        let config = LeafClassifierConfig::new();
        let model = LeafClassifier::<TestBackend>::new(&config, &device);

        // Dummy input: [batch=2, channels=3, height=64, width=64].
        // Global pooling makes the head independent of spatial size.
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 64, 64], &device);

        let output = model.forward(input);
        let dims = output.dims();

        assert_eq!(dims[0], 2);
        assert_eq!(dims[1], 38);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let device = Default::default();
        let config = LeafClassifierConfig::new();
        let model = LeafClassifier::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 64], &device);
        let probs = model.forward_softmax(input);

        let sum: f32 = probs.sum().into_scalar();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_config_defaults() {
        let config = LeafClassifierConfig::new();
        assert_eq!(config.num_classes, 38);
        assert_eq!(config.input_size, 224);
        assert_eq!(config.in_channels, 3);
    }
}
