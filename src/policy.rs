//! Mask policy adapter
//!
//! Wraps [`MaskNetwork`](crate::network::MaskNetwork) with the batched
//! inference contract the evolutionary optimizer expects: one flat
//! parameter vector and one observation per population member in, one mask
//! per member out, policy state passed through untouched.

use log::info;
use ndarray::{Array2, ArrayView2};

use crate::batch::{build_pool, par_map_members};
use crate::config::MaskPolicyConfig;
use crate::error::{Error, Result};
use crate::network::MaskNetwork;
use crate::params::ShapeTemplate;
use crate::types::{LinearShape, PolicyState, TaskState};

/// Contract shared by all policy implementations
///
/// The optimizer only sees this trait: a fixed parameter count and a
/// batched, order-preserving action computation.
pub trait PolicyNetwork {
    /// Length of the flat parameter vector for one population member
    fn num_params(&self) -> usize;

    /// Compute actions for a whole population
    ///
    /// `params` is `[B, num_params]`, batch-aligned with `t_states.obs`;
    /// output row i corresponds to member i. The policy state is returned
    /// unchanged by stateless policies.
    fn get_actions(
        &self,
        t_states: &TaskState,
        params: ArrayView2<f32>,
        p_states: &PolicyState,
    ) -> Result<(Array2<f32>, PolicyState)>;
}

/// Mask-generating policy over a target model's linear layer
///
/// Stateless after construction: it owns the network structure, the
/// parameter shape template, and an optional thread pool, all read-only.
/// Live weights arrive per call from the optimizer.
pub struct MaskPolicy {
    network: MaskNetwork,
    template: ShapeTemplate,
    num_params: usize,
    round_output: bool,
    pool: Option<rayon::ThreadPool>,
}

impl MaskPolicy {
    /// Build a mask policy for a target layer shape
    ///
    /// Fails with a configuration error if the target shape or config is
    /// degenerate. Emits a single info line reporting the parameter count;
    /// nothing is logged on the inference path.
    pub fn new(target: LinearShape, config: MaskPolicyConfig) -> Result<Self> {
        config.validate()?;

        let network = MaskNetwork::new(target, &config.hidden_sizes, config.obs_features)?;
        let template = ShapeTemplate::build(network.layer_sizes(), config.template_seed)?;
        let num_params = template.num_params();
        info!("MaskPolicy num_params = {}", num_params);

        let pool = match config.parallel_threads {
            Some(threads) => Some(build_pool(threads)?),
            None => None,
        };

        Ok(Self {
            network,
            template,
            num_params,
            round_output: config.round_output,
            pool,
        })
    }

    /// Build with the default configuration
    pub fn with_target(target: LinearShape) -> Result<Self> {
        Self::new(target, MaskPolicyConfig::default())
    }

    /// Mask length produced for every member
    pub fn mask_size(&self) -> usize {
        self.network.mask_size()
    }

    /// The underlying network structure
    pub fn network(&self) -> &MaskNetwork {
        &self.network
    }
}

impl PolicyNetwork for MaskPolicy {
    fn num_params(&self) -> usize {
        self.num_params
    }

    fn get_actions(
        &self,
        t_states: &TaskState,
        params: ArrayView2<f32>,
        p_states: &PolicyState,
    ) -> Result<(Array2<f32>, PolicyState)> {
        let batch_size = t_states.batch_size();
        if params.nrows() != batch_size {
            return Err(Error::shape(format!(
                "params batch has {} members but observations have {}",
                params.nrows(),
                batch_size
            )));
        }
        if params.ncols() != self.num_params {
            return Err(Error::shape(format!(
                "flat parameter vectors have length {}, expected {}",
                params.ncols(),
                self.num_params
            )));
        }
        let obs_features = self.network.layer_sizes()[0];
        if t_states.feature_dim() != obs_features {
            return Err(Error::shape(format!(
                "observations have {} features, expected {}",
                t_states.feature_dim(),
                obs_features
            )));
        }

        let rows = par_map_members(batch_size, self.pool.as_ref(), |i| {
            let flat = params.row(i).to_vec();
            let structured = self.template.unflatten(&flat)?;
            self.network
                .forward(&structured, t_states.obs.row(i), self.round_output)
        })?;

        let mask_size = self.network.mask_size();
        let mut masks = Array2::zeros((batch_size, mask_size));
        for (i, row) in rows.into_iter().enumerate() {
            masks.row_mut(i).assign(&row);
        }

        Ok((masks, p_states.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_policy(in_features: usize, out_features: usize) -> MaskPolicy {
        let target = LinearShape::new(in_features, out_features).unwrap();
        MaskPolicy::with_target(target).unwrap()
    }

    fn random_params(policy: &MaskPolicy, batch: usize, seed: u64) -> Array2<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((batch, policy.num_params()), |_| rng.gen_range(-0.1..0.1))
    }

    fn scalar_obs(values: &[f32]) -> TaskState {
        TaskState::new(
            Array1::from_vec(values.to_vec())
                .into_shape((values.len(), 1))
                .unwrap(),
        )
    }

    #[test]
    fn test_mnist_scenario_shapes() {
        // 784x10 target layer, population of 4 scalar observations.
        let policy = test_policy(784, 10);
        assert_eq!(policy.mask_size(), 7840);

        let params = random_params(&policy, 4, 0);
        let t_states = scalar_obs(&[0.0, 0.25, 0.5, 1.0]);
        let (masks, state) = policy
            .get_actions(&t_states, params.view(), &PolicyState::default())
            .unwrap();

        assert_eq!(masks.shape(), &[4, 7840]);
        assert_eq!(state, PolicyState::default());
        assert!(masks.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_repeated_calls_identical() {
        let policy = test_policy(6, 4);
        let params = random_params(&policy, 3, 1);
        let t_states = scalar_obs(&[0.1, 0.2, 0.3]);
        let state = PolicyState::default();

        let (a, _) = policy.get_actions(&t_states, params.view(), &state).unwrap();
        let (b, _) = policy.get_actions(&t_states, params.view(), &state).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_independence() {
        let policy = test_policy(5, 3);
        let params = random_params(&policy, 4, 2);
        let t_states = scalar_obs(&[0.1, 0.2, 0.3, 0.4]);
        let state = PolicyState::default();

        let (baseline, _) = policy.get_actions(&t_states, params.view(), &state).unwrap();

        // Replace member 2's parameters; only row 2 may change.
        let mut altered = params.clone();
        let replacement = random_params(&policy, 4, 99);
        altered.row_mut(2).assign(&replacement.row(2));
        let (changed, _) = policy.get_actions(&t_states, altered.view(), &state).unwrap();

        for i in [0usize, 1, 3] {
            assert_eq!(baseline.row(i), changed.row(i), "row {} changed", i);
        }

        // Row 2 must equal the single-member evaluation of its new pair.
        let solo_params = altered.row(2).insert_axis(ndarray::Axis(0)).to_owned();
        let solo_obs = scalar_obs(&[0.3]);
        let (solo, _) = policy
            .get_actions(&solo_obs, solo_params.view(), &state)
            .unwrap();
        assert_eq!(changed.row(2), solo.row(0));
    }

    #[test]
    fn test_positional_correspondence() {
        let policy = test_policy(4, 4);
        let params = random_params(&policy, 3, 3);
        let t_states = scalar_obs(&[-0.5, 0.0, 0.5]);
        let state = PolicyState::default();

        let (batched, _) = policy.get_actions(&t_states, params.view(), &state).unwrap();

        for i in 0..3 {
            let solo_params = params.row(i).insert_axis(ndarray::Axis(0)).to_owned();
            let solo_obs = scalar_obs(&[t_states.obs[[i, 0]]]);
            let (solo, _) = policy
                .get_actions(&solo_obs, solo_params.view(), &state)
                .unwrap();
            assert_eq!(batched.row(i), solo.row(0));
        }
    }

    #[test]
    fn test_malformed_params_rejected() {
        let policy = test_policy(6, 4);
        let t_states = scalar_obs(&[0.1, 0.2]);
        let state = PolicyState::default();

        // One scalar short per member.
        let short = Array2::<f32>::zeros((2, policy.num_params() - 1));
        assert!(matches!(
            policy.get_actions(&t_states, short.view(), &state),
            Err(Error::Shape(_))
        ));

        // Batch size mismatch between params and observations.
        let wrong_batch = Array2::<f32>::zeros((3, policy.num_params()));
        assert!(matches!(
            policy.get_actions(&t_states, wrong_batch.view(), &state),
            Err(Error::Shape(_))
        ));

        // Observation feature count mismatch.
        let wide_obs = TaskState::new(Array2::zeros((2, 3)));
        let ok_params = Array2::<f32>::zeros((2, policy.num_params()));
        assert!(matches!(
            policy.get_actions(&wide_obs, ok_params.view(), &state),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn test_soft_mask_mode() {
        let target = LinearShape::new(3, 3).unwrap();
        let mut config = MaskPolicyConfig::default();
        config.round_output = false;
        let policy = MaskPolicy::new(target, config).unwrap();

        let params = random_params(&policy, 2, 4);
        let t_states = scalar_obs(&[0.2, 0.8]);
        let (masks, _) = policy
            .get_actions(&t_states, params.view(), &PolicyState::default())
            .unwrap();
        assert!(masks.iter().all(|&v| v > 0.0 && v < 1.0));
    }

    #[test]
    fn test_policy_state_passthrough() {
        let policy = test_policy(4, 2);
        let params = random_params(&policy, 1, 5);
        let t_states = scalar_obs(&[0.5]);

        let state = PolicyState(Some(serde_json::json!({"step": 7})));
        let (_, returned) = policy.get_actions(&t_states, params.view(), &state).unwrap();
        assert_eq!(returned, state);
    }

    #[test]
    fn test_dedicated_pool_matches_global() {
        let target = LinearShape::new(5, 2).unwrap();
        let mut config = MaskPolicyConfig::default();
        config.parallel_threads = Some(2);
        let pooled = MaskPolicy::new(target, config).unwrap();
        let global = MaskPolicy::with_target(target).unwrap();

        let params = random_params(&global, 3, 6);
        let t_states = scalar_obs(&[0.1, 0.5, 0.9]);
        let state = PolicyState::default();

        let (a, _) = pooled.get_actions(&t_states, params.view(), &state).unwrap();
        let (b, _) = global.get_actions(&t_states, params.view(), &state).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_num_params_formula() {
        // Capture the construction-time num_params info line in test output.
        let _ = env_logger::builder().is_test(true).try_init();

        // 1 -> 10 -> 100 -> 24: (1*10+10) + (10*100+100) + (100*24+24)
        let policy = test_policy(6, 4);
        assert_eq!(policy.num_params(), 20 + 1100 + 2424);
    }
}
