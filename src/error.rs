//! Error type shared by the estimator, the reducers and the sample helpers.

use thiserror::Error;

/// Errors raised while validating the arguments of a Monte-Carlo estimate.
///
/// Every variant is detected before any numeric work on the samples is done, except
/// [`ExpectationError::ShapeMismatch`], which can only be checked once `f` and
/// `log_prob` have produced their outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectationError {
    /// Score-function mode was requested without a log-density function.
    #[error("`log_prob` must be supplied when `use_reparametrization` is false")]
    MissingLogProb,

    /// An averaging axis is out of range for the output of `f`, or listed twice.
    #[error("invalid averaging axis {axis} for a tensor of rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// The requested output rank does not match the axes and `keep_dims`.
    #[error("reduction produces a rank {expected} tensor, but rank {requested} was requested")]
    OutputRank { expected: usize, requested: usize },

    /// `log_prob(x)` cannot be aligned with `f(x)` along the sample axes.
    #[error("`log_prob` output of shape {log_prob:?} does not align with `f` output of shape {fx:?}")]
    ShapeMismatch { fx: Vec<usize>, log_prob: Vec<usize> },

    /// Exactly one of a sample count and materialized samples has to be given.
    #[error("must specify exactly one of arguments \"n\" and \"z\" (n given: {n_given}, z given: {z_given})")]
    SampleSource { n_given: bool, z_given: bool },

    /// Materialized samples do not have the rank the caller asked for.
    #[error("materialized samples have rank {found}, expected rank {expected}")]
    SampleRank { expected: usize, found: usize },
}
