//! Injectable PRNG for the coreset tree's weighted sampling.
//!
//! The teacher crate already seeds a `rand_chacha::ChaCha8Rng` for
//! reproducible sampling (`space.rs::choose_unique`). We generalize that
//! one-off into a trait so the tree never reaches for a process-wide
//! singleton: a production caller injects `ChaChaStreamRng`, a test injects
//! `ScriptedRng` and gets a bitwise-identical centre sequence back.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplies the two primitives the coreset tree needs: a uniform integer in
/// `[0, 2^31)` and a uniform real in the open interval `(0, 1)`.
pub trait StreamRng {
    fn next_u31(&mut self) -> u32;
    fn next_open01(&mut self) -> f64;
}

/// Seeded `ChaCha8Rng`-backed implementation for production use.
#[derive(Debug, Clone)]
pub struct ChaChaStreamRng(ChaCha8Rng);

impl ChaChaStreamRng {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl StreamRng for ChaChaStreamRng {
    fn next_u31(&mut self) -> u32 {
        self.0.gen_range(0..(1u32 << 31))
    }

    fn next_open01(&mut self) -> f64 {
        // `gen::<f64>()` samples `[0, 1)`; nudge away from the closed end so
        // callers can divide by this value without special-casing zero.
        loop {
            let v: f64 = self.0.gen();
            if v > 0.0 {
                return v;
            }
        }
    }
}

/// A deterministic test double that replays a fixed, pre-recorded sequence
/// of draws instead of sampling. Panics (test-only code) if a test exhausts
/// the script it handed in, since that means the test under-specified it.
#[derive(Debug, Default)]
pub struct ScriptedRng {
    ints: VecDeque<u32>,
    reals: VecDeque<f64>,
}

impl ScriptedRng {
    pub fn new(ints: impl IntoIterator<Item = u32>, reals: impl IntoIterator<Item = f64>) -> Self {
        Self {
            ints: ints.into_iter().collect(),
            reals: reals.into_iter().collect(),
        }
    }
}

impl StreamRng for ScriptedRng {
    fn next_u31(&mut self) -> u32 {
        self.ints.pop_front().expect("scripted rng ran out of integer draws")
    }

    fn next_open01(&mut self) -> f64 {
        self.reals.pop_front().expect("scripted rng ran out of real draws")
    }
}
