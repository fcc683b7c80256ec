//! Tests comparing reparameterized and score-function expectations under a Normal
//! distribution, against closed-form values.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use burn::backend::{Autodiff, NdArray};
    use burn::prelude::*;
    use mc_expectation::core::get_samples;
    use mc_expectation::distributions::{Distribution, Reparameterization};
    use mc_expectation::expectation::{Expectation, GradientEstimator};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;
    use std::f64::consts::PI;

    type B = Autodiff<NdArray>;

    // Shared constants.
    const NUM_DRAWS: usize = 100_000;
    const SEED: u64 = 42;

    /// `Normal(loc, scale)` with both parameters as tracked tensors of shape `[1]`.
    ///
    /// Samples are `loc + scale * eps`, so gradients reach the parameters through them.
    struct Normal {
        loc: Tensor<B, 1>,
        scale: Tensor<B, 1>,
    }

    impl Normal {
        fn new(loc: f32, scale: f32) -> Self {
            let device = Default::default();
            Self {
                loc: Tensor::from_floats([loc], &device).require_grad(),
                scale: Tensor::from_floats([scale], &device).require_grad(),
            }
        }

        fn fixed(loc: f32, scale: f32) -> Self {
            let device = Default::default();
            Self {
                loc: Tensor::from_floats([loc], &device),
                scale: Tensor::from_floats([scale], &device),
            }
        }
    }

    impl Distribution<B, 1> for Normal {
        fn sample(&self, n: usize, seed: u64) -> Tensor<B, 1> {
            let mut rng = SmallRng::seed_from_u64(seed);
            let eps: Vec<f32> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
            let eps = Tensor::<B, 1>::from_data(TensorData::new(eps, [n]), &Default::default());
            eps * self.scale.clone() + self.loc.clone()
        }

        fn log_prob(&self, x: Tensor<B, 1>) -> Tensor<B, 1> {
            let z = (x - self.loc.clone()) / self.scale.clone();
            (z.powi_scalar(2).mul_scalar(-0.5) - self.scale.clone().log())
                .sub_scalar(0.5 * (2.0 * PI).ln())
        }

        fn reparameterization(&self) -> Reparameterization {
            Reparameterization::FullyReparameterized
        }
    }

    fn values(t: Tensor<B, 1>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    /// Monte-Carlo KL(p || q) for p = N(0, 1), q = N(1, 2); exact value 0.44314718.
    #[test_log::test]
    fn kl_normal_normal_in_both_modes() {
        let p = Normal::fixed(0.0, 1.0);
        let q = Normal::fixed(1.0, 2.0);
        let samples = get_samples(&p, Some(NUM_DRAWS), None, Some(SEED)).unwrap();

        for estimator in [GradientEstimator::Reparameterized, GradientEstimator::ScoreFunction] {
            let kl: Tensor<B, 1> = Expectation::new()
                .estimator(estimator)
                .estimate(
                    |x: Tensor<B, 1>| p.log_prob(x.clone()) - q.log_prob(x),
                    samples.clone(),
                    Some(|x: Tensor<B, 1>| p.log_prob(x)),
                )
                .unwrap();
            let kl = values(kl)[0];
            assert_abs_diff_eq!(kl, 0.443_147_2, epsilon = 0.02);
        }
    }

    /// E[x^2] under N(mu, 1) is mu^2 + 1, so both gradients should approach 2 mu.
    #[test_log::test]
    fn gradients_of_both_estimators_agree_in_expectation() {
        let mu = 1.5_f32;

        let p = Normal::new(mu, 1.0);
        let samples = get_samples(&p, Some(NUM_DRAWS), None, Some(SEED)).unwrap();
        let pathwise: Tensor<B, 1> = Expectation::for_distribution(&p)
            .estimate_with(&p, |x| x.powi_scalar(2), samples)
            .unwrap();
        let grads = pathwise.backward();
        let d_loc = p.loc.grad(&grads).unwrap().into_scalar();
        assert_abs_diff_eq!(d_loc, 2.0 * mu, epsilon = 0.05);

        let p = Normal::new(mu, 1.0);
        let samples = get_samples(&p, Some(NUM_DRAWS), None, Some(SEED + 1)).unwrap();
        let score: Tensor<B, 1> = Expectation::new()
            .estimator(GradientEstimator::ScoreFunction)
            .estimate_with(&p, |x| x.powi_scalar(2), samples)
            .unwrap();
        let grads = score.backward();
        let d_loc = p.loc.grad(&grads).unwrap().into_scalar();
        assert_abs_diff_eq!(d_loc, 2.0 * mu, epsilon = 0.2);
    }

    /// With detached samples, the gradient must be exactly mean(f(x) * d/dloc log p(x)),
    /// i.e. mean(f(x) * (x - loc) / scale^2), with nothing coming through the samples.
    #[test_log::test]
    fn score_function_gradient_matches_closed_form_on_the_same_draws() {
        let (loc, scale) = (0.3_f32, 1.7_f32);
        let p = Normal::new(loc, scale);
        let samples = get_samples(&p, Some(1_000), None, Some(SEED)).unwrap();
        let xs = values(samples.clone());

        let approx: Tensor<B, 1> = Expectation::new()
            .reparameterized(false)
            .estimate_with(&p, |x| x.clone().sin() + x, samples)
            .unwrap();
        let grads = approx.backward();
        let d_loc = p.loc.grad(&grads).unwrap().into_scalar();

        let expected = xs
            .iter()
            .map(|&x| (x.sin() + x) * (x - loc) / (scale * scale))
            .sum::<f32>()
            / xs.len() as f32;
        assert_abs_diff_eq!(d_loc, expected, epsilon = 1e-4);
    }

    #[test_log::test]
    fn value_does_not_depend_on_estimator() {
        let p = Normal::new(-0.7, 0.4);
        let samples = get_samples(&p, Some(4_096), None, Some(SEED)).unwrap();
        let f = |x: Tensor<B, 1>| x.clone().exp() * x.cos();

        let pathwise: Tensor<B, 1> = Expectation::new()
            .estimate_with(&p, f, samples.clone())
            .unwrap();
        let score: Tensor<B, 1> = Expectation::new()
            .reparameterized(false)
            .estimate_with(&p, f, samples)
            .unwrap();
        assert_eq!(values(pathwise), values(score));
    }
}
