/*!
# Sample Materialization.

Helpers for callers that accept either a number of draws or an already materialized
batch of samples:
- [`get_samples`] resolves exactly one of the two into a tensor.
- [`resolve_seed`] turns an optional seed into a concrete one, drawing a fresh seed from
  the thread-local RNG when none is given (the same split as `init` vs `init_with_seed`).
*/

use burn::prelude::*;
use log::trace;
use rand::Rng;

use crate::distributions::Distribution;
use crate::error::ExpectationError;

/// Returns `seed`, or a random seed if none was supplied.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::rng().random::<u64>())
}

/// Checks the arguments and returns the samples.
///
/// Exactly one of `n` (a number of draws) and `z` (materialized samples) must be given.
/// With `n`, `n` samples are drawn from `dist` using `seed`, or a random seed if `seed` is
/// `None`. With `z`, the data is converted into a tensor on the default device.
///
/// # Errors
///
/// - [`ExpectationError::SampleSource`] if both or neither of `n` and `z` are given.
/// - [`ExpectationError::SampleRank`] if `z` does not have rank `D`.
///
/// # Examples
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::prelude::*;
/// use mc_expectation::core::get_samples;
/// use mc_expectation::distributions::Distribution;
///
/// type B = NdArray;
///
/// struct Constant;
///
/// impl Distribution<B, 1> for Constant {
///     fn sample(&self, n: usize, _seed: u64) -> Tensor<B, 1> {
///         Tensor::ones([n], &Default::default())
///     }
///     fn log_prob(&self, x: Tensor<B, 1>) -> Tensor<B, 1> {
///         x.zeros_like()
///     }
/// }
///
/// let drawn = get_samples(&Constant, Some(5), None, Some(42)).unwrap();
/// assert_eq!(drawn.dims(), [5]);
///
/// let given = get_samples(&Constant, None, Some(TensorData::from([0.5f32, 1.5])), None).unwrap();
/// assert_eq!(given.dims(), [2]);
///
/// assert!(get_samples(&Constant, None, None, None).is_err());
/// ```
pub fn get_samples<B, const D: usize, Dist>(
    dist: &Dist,
    n: Option<usize>,
    z: Option<TensorData>,
    seed: Option<u64>,
) -> Result<Tensor<B, D>, ExpectationError>
where
    B: Backend,
    Dist: Distribution<B, D>,
{
    match (n, z) {
        (Some(n), None) => {
            let seed = resolve_seed(seed);
            trace!("drawing {n} samples with seed {seed}");
            Ok(dist.sample(n, seed))
        }
        (None, Some(z)) => {
            if z.shape.len() != D {
                return Err(ExpectationError::SampleRank {
                    expected: D,
                    found: z.shape.len(),
                });
            }
            trace!("using {:?} materialized samples", z.shape);
            Ok(Tensor::<B, D>::from_data(z, &B::Device::default()))
        }
        (n, z) => Err(ExpectationError::SampleSource {
            n_given: n.is_some(),
            z_given: z.is_some(),
        }),
    }
}
