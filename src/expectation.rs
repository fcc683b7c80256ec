/*!
# Monte-Carlo Expectation.

Computes the Monte-Carlo approximation of `E_p[f(X)]`,

```text
E_p[f(X)] approx= m**-1 sum_j f(x_j),  x_j ~iid p(X)
```

where `x_j` runs over the sample axes of `samples` and `m` is the number of draws.

## Reparameterization and the score-function trick

When `p` is reparameterized, i.e. a diffeomorphic transform of parameterless noise
(`Normal(y; m, s) <=> y = s x + m, x ~ Normal(0, 1)`), gradient and expectation can be
swapped and the average of `f(samples)` is differentiated directly.

Otherwise the chain rule stops at the samples and that gradient is wrong. The
score-function (REINFORCE) identity

```text
grad[ E_p[f(X)] ] = E_p[ grad[ f(x) p(x) / stop_grad[p(x)] ] ]
```

gives an unbiased estimator instead. It is implemented by rewriting `f(x)` as

```text
f(x) + stop(f(x)) * (log p(x) - stop(log p(x)))
```

The added term is `stop(f(x))` times `h - stop(h)`, which is exactly zero in the forward
pass (IEEE-754 guarantees `x - x == 0` and `x + 0 == x`), while its gradient is
`f(x) grad[log p(x)]`. The value of the estimate is therefore the same whichever
estimator is chosen; only its gradient differs.

## Example

```rust
use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use mc_expectation::expectation::Expectation;

type B = Autodiff<NdArray>;

let device = Default::default();
let theta = Tensor::<B, 1>::from_floats([0.5], &device).require_grad();
let samples = Tensor::<B, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &device);

let approx: Tensor<B, 1> = Expectation::new()
    .reparameterized(false)
    .estimate_score_function(|x| x, samples, |x: Tensor<B, 1>| x * theta.clone())
    .unwrap();

assert_eq!(approx.clone().into_scalar(), 2.5);

// d/dtheta = mean(f(x) * x) = (1 + 4 + 9 + 16) / 4
let grads = approx.backward();
let d_theta = theta.grad(&grads).unwrap().into_scalar();
assert!((d_theta - 7.5).abs() < 1e-6);
```
*/

use burn::prelude::*;
use log::debug;

use crate::distributions::{Distribution, Reparameterization};
use crate::error::ExpectationError;
use crate::stats::{reduce_mean, SampleAxes};

/// How the gradient of the estimate is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GradientEstimator {
    /// Differentiate through the samples (pathwise gradient).
    #[default]
    Reparameterized,
    /// Detach the samples and correct the gradient through `log_prob`.
    ScoreFunction,
}

impl From<Reparameterization> for GradientEstimator {
    fn from(kind: Reparameterization) -> Self {
        if kind.is_fully_reparameterized() {
            GradientEstimator::Reparameterized
        } else {
            GradientEstimator::ScoreFunction
        }
    }
}

/// Rewrites `fx` so its value is unchanged but its gradient gains `fx * grad[logpx]`.
///
/// `logpx` has the same rank as `fx` and must broadcast to its shape.
///
/// The correction is built as a real subtraction of the detached log-density from itself,
/// never as a literal zero, so that the forward value is bit-identical to `fx` while the
/// backward pass still sees `logpx`.
pub fn score_function_surrogate<B: Backend, const D: usize>(
    fx: Tensor<B, D>,
    logpx: Tensor<B, D>,
) -> Tensor<B, D> {
    let zeros = logpx.clone() - logpx.detach();
    fx.clone() + fx.detach() * zeros
}

/// Checks that `logpx` lines up with `fx`: equal sizes along the sample axes, and along
/// the remaining axes either equal sizes or a broadcast size of 1.
fn check_alignment(
    fx: &[usize],
    logpx: &[usize],
    sample_axes: &[usize],
) -> Result<(), ExpectationError> {
    let aligned = fx.iter().zip(logpx).enumerate().all(|(axis, (&f, &l))| {
        if sample_axes.contains(&axis) {
            f == l
        } else {
            f == l || l == 1
        }
    });
    if aligned {
        Ok(())
    } else {
        Err(ExpectationError::ShapeMismatch {
            fx: fx.to_vec(),
            log_prob: logpx.to_vec(),
        })
    }
}

/// Configuration of a Monte-Carlo expectation.
///
/// Defaults: reparameterized gradients, averaging over axis 0, reduced axes dropped.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::prelude::*;
/// use mc_expectation::expectation::Expectation;
///
/// let samples = Tensor::<NdArray, 2>::from_floats([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], &Default::default());
///
/// let mean: Tensor<NdArray, 1> = Expectation::new()
///     .estimate_reparameterized(|x| x.powi_scalar(2), samples.clone())
///     .unwrap();
/// assert_eq!(mean.dims(), [2]);
///
/// let kept: Tensor<NdArray, 2> = Expectation::new()
///     .keep_dims(true)
///     .estimate_reparameterized(|x| x, samples)
///     .unwrap();
/// assert_eq!(kept.dims(), [1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expectation {
    pub estimator: GradientEstimator,
    pub axes: SampleAxes,
    pub keep_dims: bool,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the estimator matching how `dist` produces its samples.
    pub fn for_distribution<B, const D: usize, Dist>(dist: &Dist) -> Self
    where
        B: Backend,
        Dist: Distribution<B, D>,
    {
        Self::new().estimator(dist.reparameterization().into())
    }

    pub fn estimator(mut self, estimator: GradientEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// `true` selects [`GradientEstimator::Reparameterized`], `false` the score-function
    /// estimator.
    pub fn reparameterized(self, use_reparametrization: bool) -> Self {
        self.estimator(if use_reparametrization {
            GradientEstimator::Reparameterized
        } else {
            GradientEstimator::ScoreFunction
        })
    }

    /// Average over a single axis.
    pub fn axis(mut self, axis: usize) -> Self {
        self.axes = SampleAxes::from(axis);
        self
    }

    /// Average over several axes.
    pub fn axes(mut self, axes: impl Into<Vec<usize>>) -> Self {
        self.axes = SampleAxes::Dims(axes.into());
        self
    }

    /// Average over every axis.
    pub fn all_axes(mut self) -> Self {
        self.axes = SampleAxes::All;
        self
    }

    /// Keep averaged axes with size 1.
    pub fn keep_dims(mut self, keep_dims: bool) -> Self {
        self.keep_dims = keep_dims;
        self
    }

    /// Validates everything that can be checked before `f` runs.
    fn validate<const DF: usize, const DO: usize>(&self) -> Result<Vec<usize>, ExpectationError> {
        let sample_axes = self.axes.resolve(DF)?;
        let expected = self.axes.output_rank(DF, self.keep_dims)?;
        if expected != DO {
            return Err(ExpectationError::OutputRank {
                expected,
                requested: DO,
            });
        }
        Ok(sample_axes)
    }

    /// Estimates `E_p[f(X)]` with the configured estimator.
    ///
    /// `log_prob` is only used, and only required, by the score-function estimator.
    ///
    /// # Errors
    ///
    /// - [`ExpectationError::MissingLogProb`] in score-function mode without `log_prob`.
    /// - [`ExpectationError::InvalidAxis`] / [`ExpectationError::OutputRank`] if the axes
    ///   or the output rank `DO` do not fit the output of `f`.
    /// - [`ExpectationError::ShapeMismatch`] if `log_prob` does not align with `f`.
    ///
    /// None of `f`, `log_prob` or the samples are touched when validation fails, apart
    /// from the shape check, which needs both outputs.
    ///
    /// # Panics
    ///
    /// A sample axis of size 0 panics inside the NdArray backend's mean reduction; the
    /// estimate of an empty batch is not defined here.
    pub fn estimate<B, const D: usize, const DF: usize, const DO: usize, F, L>(
        &self,
        f: F,
        samples: Tensor<B, D>,
        log_prob: Option<L>,
    ) -> Result<Tensor<B, DO>, ExpectationError>
    where
        B: Backend,
        F: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
        L: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
    {
        match self.estimator {
            GradientEstimator::Reparameterized => self.estimate_reparameterized(f, samples),
            GradientEstimator::ScoreFunction => {
                let log_prob = log_prob.ok_or(ExpectationError::MissingLogProb)?;
                self.estimate_score_function(f, samples, log_prob)
            }
        }
    }

    /// Averages `f(samples)`, letting gradients flow through `samples`.
    ///
    /// Ignores the configured estimator.
    pub fn estimate_reparameterized<B, const D: usize, const DF: usize, const DO: usize, F>(
        &self,
        f: F,
        samples: Tensor<B, D>,
    ) -> Result<Tensor<B, DO>, ExpectationError>
    where
        B: Backend,
        F: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
    {
        self.validate::<DF, DO>()?;
        debug!(
            "reparameterized expectation over {:?} of samples {:?} (keep_dims = {})",
            self.axes,
            samples.dims(),
            self.keep_dims
        );
        reduce_mean(f(samples), &self.axes, self.keep_dims)
    }

    /// Averages `f(samples)` with the score-function gradient correction.
    ///
    /// `samples` is detached first, so no gradient reaches whatever produced it; the
    /// gradient flows through `log_prob` instead. `log_prob` and `f` are each called once.
    ///
    /// Ignores the configured estimator.
    pub fn estimate_score_function<B, const D: usize, const DF: usize, const DO: usize, F, L>(
        &self,
        f: F,
        samples: Tensor<B, D>,
        log_prob: L,
    ) -> Result<Tensor<B, DO>, ExpectationError>
    where
        B: Backend,
        F: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
        L: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
    {
        let sample_axes = self.validate::<DF, DO>()?;
        debug!(
            "score-function expectation over {:?} of samples {:?} (keep_dims = {})",
            self.axes,
            samples.dims(),
            self.keep_dims
        );

        let x = samples.detach();
        let logpx = log_prob(x.clone());
        let fx = f(x);
        check_alignment(&fx.dims(), &logpx.dims(), &sample_axes)?;

        reduce_mean(
            score_function_surrogate(fx, logpx),
            &self.axes,
            self.keep_dims,
        )
    }

    /// Estimates `E_p[f(X)]` using `dist.log_prob` as the log-density.
    ///
    /// Combine with [`Expectation::for_distribution`] to let `dist` choose the estimator.
    pub fn estimate_with<B, const D: usize, const DO: usize, Dist, F>(
        &self,
        dist: &Dist,
        f: F,
        samples: Tensor<B, D>,
    ) -> Result<Tensor<B, DO>, ExpectationError>
    where
        B: Backend,
        Dist: Distribution<B, D>,
        F: FnOnce(Tensor<B, D>) -> Tensor<B, D>,
    {
        self.estimate::<B, D, D, DO, _, _>(f, samples, Some(|x: Tensor<B, D>| dist.log_prob(x)))
    }
}

/// Computes the Monte-Carlo approximation of `E_p[f(X)]`.
///
/// Argument-for-argument form of [`Expectation::estimate`]:
///
/// * `f` - Computes `f(samples)`.
/// * `samples` - Draws from `p`, indexed by `axes`.
/// * `log_prob` - Natural log of the pdf/pmf of each sample. Only required when
///   `use_reparametrization` is `false`.
/// * `use_reparametrization` - Whether the gradient of the samples is unbiased. Only
///   affects the gradient of the result, never its value.
/// * `axes` - The dimensions to average; [`SampleAxes::All`] averages all of them.
/// * `keep_dims` - Retain averaged dimensions with size 1.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::prelude::*;
/// use mc_expectation::expectation::expectation;
/// use mc_expectation::stats::SampleAxes;
///
/// type B = NdArray;
///
/// let samples = Tensor::<B, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &Default::default());
/// let approx: Tensor<B, 1> = expectation(
///     |x| x,
///     samples,
///     None::<fn(Tensor<B, 1>) -> Tensor<B, 1>>,
///     true,
///     SampleAxes::default(),
///     false,
/// )
/// .unwrap();
/// assert_eq!(approx.into_scalar(), 2.5);
/// ```
pub fn expectation<B, const D: usize, const DF: usize, const DO: usize, F, L>(
    f: F,
    samples: Tensor<B, D>,
    log_prob: Option<L>,
    use_reparametrization: bool,
    axes: SampleAxes,
    keep_dims: bool,
) -> Result<Tensor<B, DO>, ExpectationError>
where
    B: Backend,
    F: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
    L: FnOnce(Tensor<B, D>) -> Tensor<B, DF>,
{
    Expectation {
        axes,
        keep_dims,
        ..Expectation::new()
    }
    .reparameterized(use_reparametrization)
    .estimate(f, samples, log_prob)
}
