//! Tests of the score-function estimator on a discrete distribution, where pathwise
//! gradients do not exist at all.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use burn::backend::{Autodiff, NdArray};
    use burn::prelude::*;
    use burn::tensor::activation::{log_softmax, softmax};
    use mc_expectation::core::get_samples;
    use mc_expectation::distributions::Distribution;
    use mc_expectation::expectation::{Expectation, GradientEstimator};
    use mc_expectation::ExpectationError;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::cell::Cell;

    type B = Autodiff<NdArray>;

    const LOGITS: [f32; 3] = [0.2, -0.5, 1.0];
    const SEED: u64 = 42;

    /// Categorical over `{0, 1, 2}` parameterized by tracked logits. Draws are returned as
    /// floats so `f` can use them directly.
    struct Categorical {
        logits: Tensor<B, 1>,
        n_sampled: Cell<usize>,
    }

    impl Categorical {
        fn new() -> Self {
            Self {
                logits: Tensor::from_floats(LOGITS, &Default::default()).require_grad(),
                n_sampled: Cell::new(0),
            }
        }

        fn probs(&self) -> Vec<f32> {
            softmax(self.logits.clone().detach(), 0)
                .into_data()
                .to_vec::<f32>()
                .unwrap()
        }
    }

    impl Distribution<B, 1> for Categorical {
        fn sample(&self, n: usize, seed: u64) -> Tensor<B, 1> {
            self.n_sampled.set(self.n_sampled.get() + n);
            let probs = self.probs();
            let mut rng = SmallRng::seed_from_u64(seed);
            let draws: Vec<f32> = (0..n)
                .map(|_| {
                    let r: f32 = rng.random();
                    let mut cum = 0.0;
                    let mut k = probs.len() - 1;
                    for (i, &p) in probs.iter().enumerate() {
                        cum += p;
                        if r <= cum {
                            k = i;
                            break;
                        }
                    }
                    k as f32
                })
                .collect();
            Tensor::from_data(TensorData::new(draws, [n]), &Default::default())
        }

        fn log_prob(&self, x: Tensor<B, 1>) -> Tensor<B, 1> {
            let log_p = log_softmax(self.logits.clone(), 0);
            (0..LOGITS.len()).fold(x.zeros_like(), |acc, k| {
                let mask = x.clone().equal_elem(k as f32).float();
                acc + mask * log_p.clone().slice([k..k + 1])
            })
        }
    }

    fn values(t: Tensor<B, 1>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test_log::test]
    fn mean_category_and_its_gradient() {
        let dist = Categorical::new();
        let samples = get_samples(&dist, Some(50_000), None, Some(SEED)).unwrap();
        assert_eq!(dist.n_sampled.get(), 50_000);

        let approx: Tensor<B, 1> = Expectation::for_distribution(&dist)
            .estimate_with(&dist, |x| x, samples)
            .unwrap();

        let probs = dist.probs();
        let mean: f32 = probs.iter().enumerate().map(|(k, p)| k as f32 * p).sum();
        assert_abs_diff_eq!(values(approx.clone())[0], mean, epsilon = 0.02);

        // d/dl_j E[x] = p_j (j - E[x])
        let grads = approx.backward();
        let d_logits = dist
            .logits
            .grad(&grads)
            .unwrap()
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        for (j, (&got, &p)) in d_logits.iter().zip(&probs).enumerate() {
            assert_abs_diff_eq!(got, p * (j as f32 - mean), epsilon = 0.03);
        }
    }

    #[test_log::test]
    fn gradient_is_exact_score_estimate_on_given_draws() {
        let dist = Categorical::new();
        let draws = [2.0f32, 0.0, 2.0, 1.0, 2.0, 0.0, 2.0, 2.0];
        let samples = get_samples(&dist, None, Some(TensorData::from(draws)), None).unwrap();
        assert_eq!(dist.n_sampled.get(), 0);

        let approx: Tensor<B, 1> = Expectation::new()
            .estimator(GradientEstimator::ScoreFunction)
            .estimate_with(&dist, |x| x.powi_scalar(2), samples)
            .unwrap();
        let grads = approx.backward();
        let d_logits = dist
            .logits
            .grad(&grads)
            .unwrap()
            .into_data()
            .to_vec::<f32>()
            .unwrap();

        // mean_i f(x_i) * (1[x_i = j] - p_j)
        let probs = dist.probs();
        for (j, &got) in d_logits.iter().enumerate() {
            let expected = draws
                .iter()
                .map(|&x| x * x * ((x as usize == j) as u8 as f32 - probs[j]))
                .sum::<f32>()
                / draws.len() as f32;
            assert_abs_diff_eq!(got, expected, epsilon = 1e-5);
        }
    }

    #[test_log::test]
    fn sample_source_must_be_exclusive() {
        let dist = Categorical::new();
        let err = get_samples::<B, 1, _>(&dist, Some(4), Some(TensorData::from([1.0f32])), None)
            .unwrap_err();
        assert_eq!(
            err,
            ExpectationError::SampleSource {
                n_given: true,
                z_given: true
            }
        );
        assert_eq!(dist.n_sampled.get(), 0);
    }
}
