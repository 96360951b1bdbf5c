//! Core data types shared across the crate

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape of the target model's single linear layer
///
/// Explicit capability descriptor: the policy never inspects the target
/// model itself, only this shape, validated once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearShape {
    pub in_features: usize,
    pub out_features: usize,
}

impl LinearShape {
    /// Create a new shape descriptor, rejecting degenerate layers
    pub fn new(in_features: usize, out_features: usize) -> Result<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(Error::config(format!(
                "target linear layer must have positive dimensions, got {}x{}",
                in_features, out_features
            )));
        }
        Ok(Self {
            in_features,
            out_features,
        })
    }

    /// Number of mask elements, one per weight of the target layer
    pub fn mask_size(&self) -> usize {
        self.in_features * self.out_features
    }
}

/// Per-member observations for one policy step
///
/// `obs` is batch-first: row i belongs to population member i.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub obs: Array2<f32>,
}

impl TaskState {
    pub fn new(obs: Array2<f32>) -> Self {
        Self { obs }
    }

    /// Number of population members in this state
    pub fn batch_size(&self) -> usize {
        self.obs.nrows()
    }

    /// Observation feature count per member
    pub fn feature_dim(&self) -> usize {
        self.obs.ncols()
    }
}

/// Opaque carry-through state for policies with recurrent internals
///
/// The mask policy is stateless and returns this token unchanged. It exists
/// to keep the calling convention uniform across policy implementations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyState(pub Option<serde_json::Value>);

/// Reshape a flat mask row into the target layer's weight-matrix shape
pub fn mask_matrix(mask: ArrayView1<f32>, shape: &LinearShape) -> Result<Array2<f32>> {
    if mask.len() != shape.mask_size() {
        return Err(Error::shape(format!(
            "mask length {} does not match target layer {}x{}",
            mask.len(),
            shape.in_features,
            shape.out_features
        )));
    }
    Array2::from_shape_vec((shape.in_features, shape.out_features), mask.to_vec())
        .map_err(|e| Error::internal(format!("mask reshape failed: {}", e)))
}

/// Apply a flat mask element-wise to a weight matrix
///
/// This is the downstream consumption of a mask: selected weights are zeroed
/// out by multiplication.
pub fn apply_mask(weights: ArrayView2<f32>, mask: ArrayView1<f32>) -> Result<Array2<f32>> {
    let shape = LinearShape::new(weights.nrows(), weights.ncols())?;
    let mask = mask_matrix(mask, &shape)?;
    Ok(&weights * &mask)
}
