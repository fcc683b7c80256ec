use burn::backend::{Autodiff, NdArray};
use burn::prelude::*;
use mc_expectation::core::get_samples;
use mc_expectation::distributions::{Distribution, Reparameterization};
use mc_expectation::expectation::{Expectation, GradientEstimator};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

type BackendType = Autodiff<NdArray>;

/// Normal(loc, 1) with a tracked location.
///
/// Draws are `loc + eps`, so the pathwise gradient reaches `loc` through the samples.
struct UnitNormal {
    loc: Tensor<BackendType, 1>,
}

impl Distribution<BackendType, 1> for UnitNormal {
    fn sample(&self, n: usize, seed: u64) -> Tensor<BackendType, 1> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let eps: Vec<f32> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        Tensor::<BackendType, 1>::from_data(TensorData::new(eps, [n]), &Default::default())
            + self.loc.clone()
    }

    fn log_prob(&self, x: Tensor<BackendType, 1>) -> Tensor<BackendType, 1> {
        (x - self.loc.clone())
            .powi_scalar(2)
            .mul_scalar(-0.5)
            .sub_scalar(0.5 * (2.0 * std::f64::consts::PI).ln())
    }

    fn reparameterization(&self) -> Reparameterization {
        Reparameterization::FullyReparameterized
    }
}

fn main() {
    let _ = env_logger::try_init();

    // E[x^2] under N(1.5, 1); the exact gradient w.r.t. loc is 3.0.
    for estimator in [GradientEstimator::Reparameterized, GradientEstimator::ScoreFunction] {
        let p = UnitNormal {
            loc: Tensor::from_floats([1.5], &Default::default()).require_grad(),
        };
        let samples = get_samples(&p, Some(20_000), None, Some(42)).unwrap();

        let approx: Tensor<BackendType, 1> = Expectation::new()
            .estimator(estimator)
            .estimate_with(&p, |x| x.powi_scalar(2), samples)
            .unwrap();
        let value = approx.clone().into_scalar();
        let grads = approx.backward();
        let d_loc = p.loc.grad(&grads).unwrap().into_scalar();

        println!("{estimator:?}: E[x^2] ~ {value:.4}, d/dloc ~ {d_loc:.4}");
    }
}

#[cfg(test)]
mod tests {
    use super::main;

    #[test]
    fn test_main() {
        main();
    }
}
