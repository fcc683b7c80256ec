/*!
The capability set a distribution needs to feed the Monte-Carlo estimator.

The crate does not ship distributions. Anything that can draw a batch of samples and
evaluate their log-density can implement [`Distribution`], which is all that
[`get_samples`](crate::core::get_samples) and
[`Expectation::estimate_with`](crate::expectation::Expectation::estimate_with) rely on.

## Example

```rust
use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use burn::tensor::Distribution as TensorDistribution;
use mc_expectation::distributions::{Distribution, Reparameterization};

type B = Autodiff<NdArray>;

/// Standard normal noise shifted by `loc`.
struct ShiftedNormal {
    loc: Tensor<B, 1>,
}

impl Distribution<B, 1> for ShiftedNormal {
    fn sample(&self, n: usize, seed: u64) -> Tensor<B, 1> {
        B::seed(seed);
        let eps = Tensor::<B, 1>::random([n], TensorDistribution::Normal(0.0, 1.0), &Default::default());
        eps + self.loc.clone()
    }

    fn log_prob(&self, x: Tensor<B, 1>) -> Tensor<B, 1> {
        let z = x - self.loc.clone();
        z.powi_scalar(2).mul_scalar(-0.5).sub_scalar(0.5 * (2.0 * std::f64::consts::PI).ln())
    }

    fn reparameterization(&self) -> Reparameterization {
        Reparameterization::FullyReparameterized
    }
}
```
*/

use burn::prelude::*;

/// Whether gradients may flow from the samples of a distribution back to its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reparameterization {
    /// Samples are a differentiable transform of parameterless noise.
    FullyReparameterized,
    /// The sampling operation is opaque to the chain rule.
    #[default]
    NotReparameterized,
}

impl Reparameterization {
    pub fn is_fully_reparameterized(self) -> bool {
        matches!(self, Reparameterization::FullyReparameterized)
    }
}

/// A distribution the estimator can draw from and score.
///
/// # Type Parameters
///
/// * `B`: The burn backend the samples live on.
/// * `D`: Rank of a batch of samples. Axis 0 indexes the draws.
pub trait Distribution<B: Backend, const D: usize> {
    /// Draws `n` samples, deterministically for a given `seed`.
    fn sample(&self, n: usize, seed: u64) -> Tensor<B, D>;

    /// Evaluates the natural logarithm of the pdf/pmf of each sample.
    fn log_prob(&self, x: Tensor<B, D>) -> Tensor<B, D>;

    /// How the samples depend on the parameters of the distribution.
    ///
    /// Defaults to [`Reparameterization::NotReparameterized`], which is always safe: the
    /// score-function estimator is unbiased either way.
    fn reparameterization(&self) -> Reparameterization {
        Reparameterization::NotReparameterized
    }
}
