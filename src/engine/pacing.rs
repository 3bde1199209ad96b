//! Keystroke pacing
//!
//! Base delay per character is `60 / cpm` seconds, scaled by a uniform
//! factor in `[1 - jitter, 1 + jitter]`. A seeded job produces the same
//! sequence of delays and typo decisions on every run.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Random source for delays and typo decisions
pub struct Pacing {
    jitter: f64,
    rng: StdRng,
}

impl Pacing {
    pub fn new(jitter: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            jitter: jitter.clamp(0.0, 1.0),
            rng,
        }
    }

    /// Unjittered delay for one character at `speed_cpm`
    pub fn base_delay(speed_cpm: u32) -> Duration {
        Duration::from_secs_f64(60.0 / f64::from(speed_cpm.max(1)))
    }

    /// Jittered delay for the next character
    pub fn char_delay(&mut self, speed_cpm: u32) -> Duration {
        let base = Self::base_delay(speed_cpm);
        if self.jitter == 0.0 {
            return base;
        }
        let factor = self.rng.gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        base.mul_f64(factor)
    }

    /// Uniform duration in `[min, max]`
    pub fn between(&mut self, (min, max): (Duration, Duration)) -> Duration {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// True with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    pub fn pick(&mut self, choices: &[char]) -> Option<char> {
        choices.choose(&mut self.rng).copied()
    }
}
