//! Mask generator network
//!
//! A small stack of fully-connected layers mapping one observation to a
//! mask sized to the target model's weight matrix. Pure data
//! transformation: no interior mutability, no call-time randomness.

use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};
use crate::params::{LayerParams, StructuredParams};
use crate::types::LinearShape;

/// Rectified linear activation
pub fn relu(x: &Array1<f32>) -> Array1<f32> {
    x.mapv(|v| v.max(0.0))
}

/// Logistic activation, bounding outputs to (0, 1)
pub fn sigmoid(x: &Array1<f32>) -> Array1<f32> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

/// One fully-connected layer: `y = W^T x + b`
fn dense(layer: &LayerParams, x: ArrayView1<f32>) -> Result<Array1<f32>> {
    if x.len() != layer.weights.nrows() {
        return Err(Error::shape(format!(
            "layer input has {} features, expected {}",
            x.len(),
            layer.weights.nrows()
        )));
    }
    Ok(layer.weights.t().dot(&x) + &layer.bias)
}

/// Feed-forward mask generator
///
/// Structure is fixed at construction: hidden layers in order, then an
/// output layer of `mask_size = in_features * out_features` units. ReLU
/// after every hidden layer, sigmoid after the output layer.
#[derive(Debug, Clone)]
pub struct MaskNetwork {
    layer_sizes: Vec<usize>,
    mask_size: usize,
}

impl MaskNetwork {
    /// Build the network structure for a target layer shape
    pub fn new(target: LinearShape, hidden_sizes: &[usize], obs_features: usize) -> Result<Self> {
        if hidden_sizes.is_empty() {
            return Err(Error::config("mask network needs at least one hidden layer"));
        }
        if obs_features == 0 {
            return Err(Error::config("observation feature count must be positive"));
        }
        let mask_size = target.mask_size();

        let mut layer_sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        layer_sizes.push(obs_features);
        layer_sizes.extend_from_slice(hidden_sizes);
        layer_sizes.push(mask_size);

        Ok(Self {
            layer_sizes,
            mask_size,
        })
    }

    /// Consecutive layer sizes, input dimension first
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Output length, one element per target-layer weight
    pub fn mask_size(&self) -> usize {
        self.mask_size
    }

    /// Forward pass for a single observation
    ///
    /// With `round_output` the sigmoid output is rounded to {0, 1} using
    /// round-half-to-even, so exact 0.5 activations go to 0. Deterministic
    /// either way: identical params and obs give bit-identical output.
    pub fn forward(
        &self,
        params: &StructuredParams,
        obs: ArrayView1<f32>,
        round_output: bool,
    ) -> Result<Array1<f32>> {
        let layers = params.layers();
        let expected = self.layer_sizes.len() - 1;
        if layers.len() != expected {
            return Err(Error::shape(format!(
                "structured params have {} layers, expected {}",
                layers.len(),
                expected
            )));
        }

        let mut x = obs.to_owned();
        for (i, (_, layer)) in layers.iter().enumerate() {
            let pre = dense(layer, x.view())?;
            x = if i + 1 < layers.len() {
                relu(&pre)
            } else {
                sigmoid(&pre)
            };
        }

        if x.len() != self.mask_size {
            return Err(Error::internal(format!(
                "network produced {} outputs, expected {}",
                x.len(),
                self.mask_size
            )));
        }

        if round_output {
            x.mapv_inplace(f32::round_ties_even);
        }
        Ok(x)
    }
}
