use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest step ever applied, so a run always reaches 100.
pub(crate) const MIN_STEP: f64 = 0.01;

/// Produces the progress delta for each tick.
pub trait StepSource: Send {
    fn next_step(&mut self, max_step: f64) -> f64;
}

/// Uniform step in `(0, max_step]`.
pub struct RandomStep {
    rng: StdRng,
}

impl RandomStep {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl StepSource for RandomStep {
    fn next_step(&mut self, max_step: f64) -> f64 {
        // gen::<f64>() is in [0, 1); flip it so zero is excluded.
        max_step * (1.0 - self.rng.gen::<f64>())
    }
}

/// Always the same delta.
pub struct FixedStep(pub f64);

impl StepSource for FixedStep {
    fn next_step(&mut self, _max_step: f64) -> f64 {
        self.0
    }
}

/// Clamp a generated delta into `(0, max_step]`.
pub(crate) fn sanitize_step(delta: f64, max_step: f64) -> f64 {
    let max = if max_step.is_finite() && max_step > 0.0 {
        max_step
    } else {
        MIN_STEP
    };
    if !delta.is_finite() || delta <= 0.0 {
        return MIN_STEP.min(max);
    }
    delta.min(max)
}
