//! evomask - Parameter-conditioned mask policy for evolutionary strategies
//!
//! A small feed-forward network that outputs a binary mask over a target
//! model's linear-layer weights, wrapped in the batched inference contract
//! an external evolutionary optimizer expects: per generation, the
//! optimizer hands over one flat parameter vector and one observation per
//! population member and gets one mask per member back, in order.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use evomask::{LinearShape, MaskPolicy, PolicyNetwork, PolicyState, TaskState};
//! use ndarray::Array2;
//!
//! fn main() -> evomask::Result<()> {
//!     let target = LinearShape::new(784, 10)?;
//!     let policy = MaskPolicy::with_target(target)?;
//!
//!     let params = Array2::<f32>::zeros((4, policy.num_params()));
//!     let t_states = TaskState::new(Array2::zeros((4, 1)));
//!     let (masks, _state) =
//!         policy.get_actions(&t_states, params.view(), &PolicyState::default())?;
//!     assert_eq!(masks.shape(), &[4, 7840]);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;
pub mod config;
pub mod types;

// Network and parameter plumbing
pub mod params;
pub mod network;
pub mod batch;

// Policy surface
pub mod policy;

// Re-export commonly used types
pub use config::MaskPolicyConfig;
pub use error::{Error, Result, WithErrorContext};
pub use network::MaskNetwork;
pub use params::{LayerParams, ShapeTemplate, StructuredParams};
pub use policy::{MaskPolicy, PolicyNetwork};
pub use types::{apply_mask, mask_matrix, LinearShape, PolicyState, TaskState};
