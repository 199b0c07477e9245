//! Small convolutional image encoder.
//!
//! Four stride-2 3x3 convolutions with leaky ReLU, flattened to a fixed
//! feature vector. Each layer halves the spatial dimensions (rounding up),
//! so a 42x42 input reaches 3x3 and a 4-channel observation encodes to
//! 3 * 3 * 32 = 288 features.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::leaky_relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Configuration for the convolutional encoder.
#[derive(Debug, Clone)]
pub struct ConvEncoderConfig {
    /// Input channels.
    pub in_channels: usize,
    /// Output channels per conv layer.
    pub channels: [usize; 4],
    /// Input height.
    pub height: usize,
    /// Input width.
    pub width: usize,
}

impl ConvEncoderConfig {
    /// Create a config for 4-channel observations of the given spatial size.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            in_channels: 4,
            channels: [32, 32, 32, 32],
            height,
            width,
        }
    }

    /// Set the number of input channels.
    pub fn with_in_channels(mut self, channels: usize) -> Self {
        self.in_channels = channels;
        self
    }

    /// Flattened output feature size.
    pub fn out_features(&self) -> usize {
        self.channels[3] * Self::spatial_out(self.height) * Self::spatial_out(self.width)
    }

    /// Spatial extent after the four stride-2 layers (kernel 3, padding 1
    /// gives ceil(d / 2) per layer).
    fn spatial_out(mut d: usize) -> usize {
        for _ in 0..4 {
            d = (d + 1) / 2;
        }
        d
    }

    /// Initialize the encoder.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvEncoder<B> {
        let conv = |c_in: usize, c_out: usize| {
            Conv2dConfig::new([c_in, c_out], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };

        ConvEncoder {
            conv1: conv(self.in_channels, self.channels[0]),
            conv2: conv(self.channels[0], self.channels[1]),
            conv3: conv(self.channels[1], self.channels[2]),
            conv4: conv(self.channels[2], self.channels[3]),
            out_features: self.out_features(),
        }
    }
}

/// Four-layer stride-2 convolutional encoder.
#[derive(Module, Debug)]
pub struct ConvEncoder<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    conv4: Conv2d<B>,
    #[module(skip)]
    out_features: usize,
}

impl<B: Backend> ConvEncoder<B> {
    /// Flattened output feature size.
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Encode a channel-first image batch `[batch, c, h, w]` to
    /// `[batch, out_features]`.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = leaky_relu(self.conv1.forward(x), 0.01);
        let x = leaky_relu(self.conv2.forward(x), 0.01);
        let x = leaky_relu(self.conv3.forward(x), 0.01);
        let x = leaky_relu(self.conv4.forward(x), 0.01);

        let [batch, c, h, w] = x.dims();
        debug_assert_eq!(c * h * w, self.out_features);
        x.reshape([batch, c * h * w])
    }
}
