//! Random record sampling.

/// Keeps each record with probability `1 / (rate + 1)`.
///
/// A rate of 0 keeps everything.
#[derive(Debug, Clone)]
pub struct Sampler {
    rate: u32,
    rng: fastrand::Rng,
}

impl Sampler {
    /// Sampler seeded from the system.
    pub fn new(rate: u32) -> Self {
        Self {
            rate,
            rng: fastrand::Rng::new(),
        }
    }

    /// Sampler with a fixed seed, for reproducible runs.
    pub fn with_seed(rate: u32, seed: u64) -> Self {
        Self {
            rate,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Sampling rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Decide whether the next record is kept.
    pub fn keep(&mut self) -> bool {
        self.rate == 0 || self.rng.u32(0..=self.rate) == 0
    }
}
