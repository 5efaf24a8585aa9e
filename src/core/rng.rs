//! Deterministic random number generation for dice resolution.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical roll sequence
//! - **Attributable**: Every bounded roll advances a call counter, so a roll
//!   is identified by (seed, call index)
//! - **Serializable**: O(1) state capture and restore
//! - **Mode-selected entropy**: Seeded for replay/tests, OS entropy for live
//!   play — chosen by configuration, not by code path
//!
//! ## Replay
//!
//! ```
//! use ttrpg_rules::core::{DiceRng, RngMode};
//!
//! let mut rng = DiceRng::new(RngMode::Seeded(777));
//! let first = rng.roll(20);
//!
//! // A fresh rng with the same seed replays the same rolls.
//! let mut replay = DiceRng::new(RngMode::Seeded(777));
//! assert_eq!(replay.roll(20), first);
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// How the dice stream is seeded.
///
/// Both modes produce a ChaCha8 stream; `Entropy` merely draws its seed from
/// the operating system once at construction. The resolved seed is always
/// recorded in [`DiceRngState`], so even live sessions can be replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RngMode {
    /// Fixed seed for deterministic simulation and tests.
    Seeded(u64),
    /// Seed drawn from OS entropy at construction (live play).
    Entropy,
}

/// Deterministic dice RNG.
///
/// Uses ChaCha8 for speed while maintaining cryptographic quality randomness.
/// The stream is a pure function of (seed, call sequence): no hidden global
/// entropy is consulted after construction.
#[derive(Clone, Debug)]
pub struct DiceRng {
    inner: ChaCha8Rng,
    seed: u64,
    calls: u64,
}

impl DiceRng {
    /// Create a new RNG for the given mode.
    #[must_use]
    pub fn new(mode: RngMode) -> Self {
        let seed = match mode {
            RngMode::Seeded(seed) => seed,
            RngMode::Entropy => rand::rngs::OsRng.gen(),
        };
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            calls: 0,
        }
    }

    /// Create a new RNG from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(RngMode::Seeded(seed))
    }

    /// The seed this stream was constructed from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of bounded rolls made so far.
    ///
    /// The next roll will be call index `calls()`.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Roll a single die, returning a value in `[1, sides]`.
    ///
    /// # Panics
    ///
    /// Panics if `sides` is zero. Die sizes come from parsed notation or
    /// engine constants, never untrusted input; the dice parser rejects
    /// zero-sided dice before reaching here.
    pub fn roll(&mut self, sides: u32) -> u32 {
        assert!(sides > 0, "A die must have at least one side");
        self.calls += 1;
        self.inner.gen_range(1..=sides)
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> DiceRngState {
        DiceRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            calls: self.calls,
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &DiceRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            calls: state.calls,
        }
    }
}

/// Serializable RNG state for checkpointing and replay.
///
/// Uses the ChaCha8 word position for O(1) serialization regardless of
/// how many rolls have been made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRngState {
    /// Original seed.
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter).
    pub word_pos: u128,
    /// Bounded rolls made so far.
    pub calls: u64,
}
