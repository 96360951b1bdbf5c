//! Batched application of per-member functions
//!
//! The evolutionary optimizer evaluates a whole population per generation,
//! so every policy call maps the same pure function independently across
//! the leading batch dimension. Members never share mutable state, which
//! lets rayon parallelize freely; results keep input order because
//! downstream consumers index them positionally.

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Build a dedicated rayon thread pool
pub fn build_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| Error::internal(format!("failed to create thread pool: {}", e)))
}

/// Apply `f` to every member index in parallel, preserving order
///
/// Row i of the output always corresponds to member i. The first error
/// aborts the batch; no partial results are returned.
pub fn par_map_members<T, F>(
    batch_size: usize,
    pool: Option<&rayon::ThreadPool>,
    f: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync,
{
    let run = || (0..batch_size).into_par_iter().map(&f).collect::<Result<Vec<T>>>();
    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}
