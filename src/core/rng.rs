//! Deterministic random number generation for computer players.
//!
//! The evaluator's tie-breaks are the only randomness in the engine. Every
//! draw goes through a `GameRng` so a fixed seed replays a whole game:
//!
//! ```
//! use chain_reaction::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//!
//! // Each computer turn gets its own fork
//! let mut turn_rng = rng.fork();
//!
//! let mut again = GameRng::new(42);
//! let mut turn_again = again.fork();
//! assert_eq!(turn_rng.coin_flip(), turn_again.coin_flip());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG with forking.
///
/// Uses ChaCha8 for speed. Forks are derived from the parent seed and a
/// fork counter, so the n-th fork of a given seed is always the same stream.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork this RNG to create an independent branch.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    /// Fair coin.
    pub fn coin_flip(&mut self) -> bool {
        self.inner.gen_bool(0.5)
    }

    /// True with probability `1 / k`. `k == 0` or `k == 1` is always true.
    pub fn one_in(&mut self, k: u32) -> bool {
        k <= 1 || self.inner.gen_range(0..k) == 0
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.inner)
    }
}
