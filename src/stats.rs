//! Reductions over the sample axes of a batch of Monte-Carlo draws.
//!
//! burn has no rank-0 tensors, so a reduction that would leave no dimension behind
//! returns a rank-1 tensor holding a single element instead of a scalar.

use burn::prelude::*;
use log::trace;

use crate::error::ExpectationError;

/// The dimensions of a tensor that index i.i.d. draws and are averaged away.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleAxes {
    /// Average over every dimension.
    All,
    /// Average over the listed dimensions only.
    Dims(Vec<usize>),
}

impl Default for SampleAxes {
    /// The left-most dimension.
    fn default() -> Self {
        SampleAxes::Dims(vec![0])
    }
}

impl From<usize> for SampleAxes {
    fn from(axis: usize) -> Self {
        SampleAxes::Dims(vec![axis])
    }
}

impl From<Vec<usize>> for SampleAxes {
    fn from(axes: Vec<usize>) -> Self {
        SampleAxes::Dims(axes)
    }
}

impl From<Option<usize>> for SampleAxes {
    /// `None` averages all dimensions.
    fn from(axis: Option<usize>) -> Self {
        axis.map_or(SampleAxes::All, SampleAxes::from)
    }
}

impl SampleAxes {
    /// Validates the axes against a tensor of rank `rank` and returns them in ascending
    /// order.
    pub fn resolve(&self, rank: usize) -> Result<Vec<usize>, ExpectationError> {
        match self {
            SampleAxes::All => Ok((0..rank).collect()),
            SampleAxes::Dims(dims) => {
                let mut resolved = Vec::with_capacity(dims.len());
                for &axis in dims {
                    if axis >= rank || resolved.contains(&axis) {
                        return Err(ExpectationError::InvalidAxis { axis, rank });
                    }
                    resolved.push(axis);
                }
                resolved.sort_unstable();
                Ok(resolved)
            }
        }
    }

    /// Rank of the result of averaging a rank `rank` tensor over these axes.
    pub fn output_rank(&self, rank: usize, keep_dims: bool) -> Result<usize, ExpectationError> {
        let n_reduced = self.resolve(rank)?.len();
        Ok(reduced_rank(rank, n_reduced, keep_dims))
    }
}

fn reduced_rank(rank: usize, n_reduced: usize, keep_dims: bool) -> usize {
    if keep_dims {
        rank
    } else {
        (rank - n_reduced).max(1)
    }
}

fn reduced_shape(dims: &[usize], reduced: &[usize], keep_dims: bool) -> Vec<usize> {
    let shape: Vec<usize> = dims
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| match (reduced.contains(&i), keep_dims) {
            (false, _) => Some(d),
            (true, true) => Some(1),
            (true, false) => None,
        })
        .collect();
    if shape.is_empty() {
        vec![1]
    } else {
        shape
    }
}

fn fixed_shape<const N: usize>(shape: &[usize]) -> [usize; N] {
    core::array::from_fn(|i| shape[i])
}

/// Arithmetic mean of `values` over `axes`.
///
/// Reduced axes are dropped unless `keep_dims` is set, in which case they are kept with
/// size 1. The const parameter `DO` must match the resulting rank, otherwise
/// [`ExpectationError::OutputRank`] is returned.
///
/// # Panics
///
/// An empty reduced axis (e.g. `Tensor::zeros([0, 3])` over axis 0) panics inside the
/// NdArray backend rather than producing NaN.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::prelude::*;
/// use mc_expectation::stats::{reduce_mean, SampleAxes};
///
/// let values = Tensor::<NdArray, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &Default::default());
/// let mean: Tensor<NdArray, 2> = reduce_mean(values, &SampleAxes::default(), true).unwrap();
/// assert_eq!(mean.dims(), [1, 2]);
/// ```
pub fn reduce_mean<B: Backend, const D: usize, const DO: usize>(
    values: Tensor<B, D>,
    axes: &SampleAxes,
    keep_dims: bool,
) -> Result<Tensor<B, DO>, ExpectationError> {
    let reduced = axes.resolve(D)?;
    let expected = reduced_rank(D, reduced.len(), keep_dims);
    if expected != DO {
        return Err(ExpectationError::OutputRank {
            expected,
            requested: DO,
        });
    }

    let dims = values.dims();
    let shape = reduced_shape(&dims, &reduced, keep_dims);
    trace!("mean over axes {reduced:?} of {dims:?} -> {shape:?}");

    let mean = reduced
        .iter()
        .fold(values, |acc, &axis| acc.mean_dim(axis));
    Ok(mean.reshape(fixed_shape::<DO>(&shape)))
}

/// Mean over the sample index, which is always axis 0 here.
///
/// # Panics
/// Panics if `D2` is not the rank left after removing axis 0 (1 for rank-1 input).
pub fn sample_mean<B: Backend, const D: usize, const D2: usize>(
    values: Tensor<B, D>,
) -> Tensor<B, D2> {
    let dims = values.dims();
    let shape = reduced_shape(&dims, &[0], false);
    assert_eq!(
        shape.len(),
        D2,
        "sample_mean: expected output rank {}, got {D2}",
        shape.len()
    );
    values.mean_dim(0).reshape(fixed_shape::<D2>(&shape))
}

/// Max over the sample index, which is always axis 0 here.
///
/// # Panics
/// Panics if `D2` is not the rank left after removing axis 0 (1 for rank-1 input).
pub fn sample_max<B: Backend, const D: usize, const D2: usize>(
    values: Tensor<B, D>,
) -> Tensor<B, D2> {
    let dims = values.dims();
    let shape = reduced_shape(&dims, &[0], false);
    assert_eq!(
        shape.len(),
        D2,
        "sample_max: expected output rank {}, got {D2}",
        shape.len()
    );
    values.max_dim(0).reshape(fixed_shape::<D2>(&shape))
}
