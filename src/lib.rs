//! # mc-expectation
//!
//! Monte-Carlo approximations of `E_p[f(X)]` over [`burn`] tensors, with control over how
//! gradients propagate through the approximation.
//!
//! ## Getting Started
//!
//! ```bash
//! cargo add mc-expectation
//! ```
//!
//! The library provides one estimator with two gradient modes:
//! 1. **Reparameterized**: the samples are a differentiable function of the parameters
//!    (e.g. `loc + scale * eps`), so the plain sample mean is differentiated directly.
//! 2. **Score-function (REINFORCE)**: the sampling operation is a black box. The samples are
//!    detached and the gradient is recovered through `log_prob`, while the returned value
//!    stays bit-for-bit identical to the reparameterized one.
//!
//! ## Example 1: The same value, two different gradients
//!
//! ```rust
//! use burn::backend::{Autodiff, NdArray};
//! use burn::prelude::*;
//! use mc_expectation::expectation::expectation;
//! use mc_expectation::stats::SampleAxes;
//!
//! type B = Autodiff<NdArray>;
//!
//! let device = Default::default();
//! let theta = Tensor::<B, 1>::from_floats([0.5], &device).require_grad();
//! let samples = Tensor::<B, 1>::from_floats([1.0, 2.0, 3.0, 4.0], &device);
//! let log_prob = |x: Tensor<B, 1>| x * theta.clone();
//!
//! let score: Tensor<B, 1> = expectation(
//!     |x| x,
//!     samples.clone(),
//!     Some(log_prob),
//!     false,
//!     SampleAxes::default(),
//!     false,
//! )
//! .unwrap();
//! let pathwise: Tensor<B, 1> = expectation(
//!     |x| x,
//!     samples,
//!     Some(log_prob),
//!     true,
//!     SampleAxes::default(),
//!     false,
//! )
//! .unwrap();
//!
//! assert_eq!(score.clone().into_scalar(), 2.5);
//! assert_eq!(pathwise.into_scalar(), 2.5);
//!
//! let grads = score.backward();
//! assert!((theta.grad(&grads).unwrap().into_scalar() - 7.5).abs() < 1e-6);
//! ```
//!
//! ## Example 2: Letting the distribution pick the estimator
//!
//! ```rust
//! use burn::backend::{Autodiff, NdArray};
//! use burn::prelude::*;
//! use burn::tensor::Distribution as TensorDistribution;
//! use mc_expectation::core::get_samples;
//! use mc_expectation::distributions::Distribution;
//! use mc_expectation::expectation::Expectation;
//!
//! type B = Autodiff<NdArray>;
//!
//! /// Bernoulli draws, which cannot be reparameterized.
//! struct Bernoulli {
//!     logit: Tensor<B, 1>,
//! }
//!
//! impl Distribution<B, 1> for Bernoulli {
//!     fn sample(&self, n: usize, seed: u64) -> Tensor<B, 1> {
//!         B::seed(seed);
//!         let p = burn::tensor::activation::sigmoid(self.logit.clone()).detach().into_scalar();
//!         Tensor::<B, 1>::random([n], TensorDistribution::Bernoulli(p as f64), &Default::default())
//!     }
//!
//!     fn log_prob(&self, x: Tensor<B, 1>) -> Tensor<B, 1> {
//!         let n = x.dims()[0];
//!         let logit = self.logit.clone().expand([n]);
//!         // x * log(sigmoid(l)) + (1 - x) * log(sigmoid(-l))
//!         let log_p = burn::tensor::activation::log_sigmoid(logit.clone());
//!         let log_q = burn::tensor::activation::log_sigmoid(logit.neg());
//!         x.clone() * log_p + (x.neg().add_scalar(1.0)) * log_q
//!     }
//! }
//!
//! let p = Bernoulli { logit: Tensor::from_floats([0.0], &Default::default()).require_grad() };
//! let samples = get_samples(&p, Some(1000), None, Some(42)).unwrap();
//!
//! let approx: Tensor<B, 1> = Expectation::for_distribution(&p)
//!     .estimate_with(&p, |x| x, samples)
//!     .unwrap();
//! let grads = approx.backward();
//! // d/dlogit E[x] = sigmoid'(0) = 0.25; the score-function estimate is noisy but close.
//! let d_logit = p.logit.grad(&grads).unwrap().into_scalar();
//! assert!((d_logit - 0.25).abs() < 0.1);
//! ```
//!
//! ## Modules
//! - [`expectation`]: the estimator, its configuration and the score-function surrogate.
//! - [`stats`]: sample-axis reductions (`sample_mean`, `sample_max`, `reduce_mean`).
//! - [`distributions`]: the capability trait distributions implement to feed the estimator.
//! - [`core`]: resolving a sample count or materialized samples into a tensor.
//! - [`error`]: the crate error type.
//!
//! Logging goes through the [`log`] facade; install any logger to see what the estimator
//! does (`debug` per estimate, `trace` per reduction).

pub mod core;
pub mod distributions;
pub mod error;
pub mod expectation;
pub mod stats;

pub use error::ExpectationError;
pub use expectation::{expectation, Expectation, GradientEstimator};
pub use stats::SampleAxes;
