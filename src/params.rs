//! Flat parameter vector <-> structured parameter conversion
//!
//! The external optimizer hands the policy one flat `f32` vector per
//! population member. This module owns the deterministic mapping between
//! that flat form and the per-layer weight/bias tensors the network
//! consumes. The mapping is discovered once at construction from a seeded
//! throwaway initialization and is shape-preserving in both directions:
//! a length mismatch is a hard error, never a truncation.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Weights and bias of one fully-connected layer
///
/// `weights` is `[in, out]`; `bias` is `[out]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams {
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
}

impl LayerParams {
    /// Number of scalar parameters in this layer
    pub fn count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }
}

/// Ordered, named per-layer parameters for one network
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredParams {
    layers: Vec<(String, LayerParams)>,
}

impl StructuredParams {
    pub fn layers(&self) -> &[(String, LayerParams)] {
        &self.layers
    }

    /// Total scalar parameter count across all layers
    pub fn count(&self) -> usize {
        self.layers.iter().map(|(_, l)| l.count()).sum()
    }

    /// Flatten back into the optimizer's flat-vector form
    ///
    /// Layer order, then weights (row-major), then bias. Exact inverse of
    /// [`ShapeTemplate::unflatten`].
    pub fn flatten(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.count());
        for (_, layer) in &self.layers {
            flat.extend(layer.weights.iter().copied());
            flat.extend(layer.bias.iter().copied());
        }
        flat
    }
}

/// Shape template for a stack of fully-connected layers
///
/// Built once at policy construction; records the total parameter count and
/// the deterministic unflatten mapping. Holds no live weights.
#[derive(Debug, Clone)]
pub struct ShapeTemplate {
    /// (in, out) per layer, in forward order
    layer_dims: Vec<(usize, usize)>,
    num_params: usize,
}

impl ShapeTemplate {
    /// Build the template for consecutive layer sizes `[d0, d1, ..., dn]`
    ///
    /// A throwaway parameter structure is initialized from `seed` solely to
    /// discover the flat layout and count; its values are discarded. The
    /// seed is documented at the call site and never reused for inference
    /// weights.
    pub fn build(layer_sizes: &[usize], seed: u64) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(Error::config(format!(
                "network needs at least one layer, got sizes {:?}",
                layer_sizes
            )));
        }
        if layer_sizes.iter().any(|&s| s == 0) {
            return Err(Error::config(format!(
                "layer sizes must be positive, got {:?}",
                layer_sizes
            )));
        }

        let layer_dims: Vec<(usize, usize)> = layer_sizes
            .windows(2)
            .map(|w| (w[0], w[1]))
            .collect();

        let throwaway = init_params(&layer_dims, seed);
        let num_params = throwaway.count();

        Ok(Self {
            layer_dims,
            num_params,
        })
    }

    /// Total scalar parameter count for a conforming flat vector
    pub fn num_params(&self) -> usize {
        self.num_params
    }

    /// Reconstruct structured parameters from a flat vector
    ///
    /// The vector length must equal `num_params()` exactly.
    pub fn unflatten(&self, flat: &[f32]) -> Result<StructuredParams> {
        if flat.len() != self.num_params {
            return Err(Error::shape(format!(
                "flat parameter vector has length {}, expected {}",
                flat.len(),
                self.num_params
            )));
        }

        let mut layers = Vec::with_capacity(self.layer_dims.len());
        let mut offset = 0;
        for (i, &(rows, cols)) in self.layer_dims.iter().enumerate() {
            let w_len = rows * cols;
            let weights =
                Array2::from_shape_vec((rows, cols), flat[offset..offset + w_len].to_vec())
                    .map_err(|e| Error::internal(format!("weight reshape failed: {}", e)))?;
            offset += w_len;
            let bias = Array1::from_vec(flat[offset..offset + cols].to_vec());
            offset += cols;
            layers.push((format!("dense_{}", i), LayerParams { weights, bias }));
        }

        Ok(StructuredParams { layers })
    }
}

/// Seeded initialization of a full parameter structure
///
/// Small uniform weights, zero bias. Used by [`ShapeTemplate::build`] for
/// shape discovery and by tests that need reproducible weights.
pub fn init_params(layer_dims: &[(usize, usize)], seed: u64) -> StructuredParams {
    let mut rng = StdRng::seed_from_u64(seed);
    let layers = layer_dims
        .iter()
        .enumerate()
        .map(|(i, &(rows, cols))| {
            let weights = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-0.05..0.05));
            let bias = Array1::zeros(cols);
            (format!("dense_{}", i), LayerParams { weights, bias })
        })
        .collect();
    StructuredParams { layers }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_params_matches_formula() {
        // 1 -> 10 -> 100 -> 6: (1*10+10) + (10*100+100) + (100*6+6)
        let template = ShapeTemplate::build(&[1, 10, 100, 6], 0).unwrap();
        assert_eq!(template.num_params(), 20 + 1100 + 606);
    }

    #[test]
    fn test_build_rejects_degenerate_sizes() {
        assert!(matches!(
            ShapeTemplate::build(&[1], 0),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ShapeTemplate::build(&[1, 0, 5], 0),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_unflatten_shapes_and_order() {
        let template = ShapeTemplate::build(&[2, 3, 4], 0).unwrap();
        let flat: Vec<f32> = (0..template.num_params()).map(|i| i as f32).collect();
        let params = template.unflatten(&flat).unwrap();

        let layers = params.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].0, "dense_0");
        assert_eq!(layers[0].1.weights.shape(), &[2, 3]);
        assert_eq!(layers[0].1.bias.len(), 3);
        assert_eq!(layers[1].1.weights.shape(), &[3, 4]);
        assert_eq!(layers[1].1.bias.len(), 4);

        // First layer weights are read row-major from the head of the vector.
        assert_eq!(layers[0].1.weights[[0, 0]], 0.0);
        assert_eq!(layers[0].1.weights[[0, 1]], 1.0);
        assert_eq!(layers[0].1.weights[[1, 0]], 3.0);
        assert_eq!(layers[0].1.bias[0], 6.0);
    }

    #[test]
    fn test_flatten_is_inverse_of_unflatten() {
        let template = ShapeTemplate::build(&[3, 5, 2], 7).unwrap();
        let flat: Vec<f32> = (0..template.num_params())
            .map(|i| (i as f32) * 0.25 - 1.0)
            .collect();
        let params = template.unflatten(&flat).unwrap();
        assert_eq!(params.flatten(), flat);
        assert_eq!(params.count(), template.num_params());
    }

    #[test]
    fn test_unflatten_rejects_wrong_length() {
        let template = ShapeTemplate::build(&[1, 10, 100, 6], 0).unwrap();
        let short = vec![0.0; template.num_params() - 1];
        assert!(matches!(template.unflatten(&short), Err(Error::Shape(_))));
        let long = vec![0.0; template.num_params() + 1];
        assert!(matches!(template.unflatten(&long), Err(Error::Shape(_))));
    }

    #[test]
    fn test_init_params_deterministic() {
        let dims = [(1, 10), (10, 100)];
        let a = init_params(&dims, 0);
        let b = init_params(&dims, 0);
        assert_eq!(a, b);

        let c = init_params(&dims, 1);
        assert_ne!(a, c);
    }
}
