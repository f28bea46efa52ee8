//! Deterministic random number generation for combat resolution.
//!
//! Every roll in a fight flows through [`CombatRng`]: hit checks, damage
//! variance, critical rolls, AI decisions, and target selection. There is no
//! global random state, so a fixed seed reproduces an identical fight for
//! testing and audit.

/// Stateful PCG random number generator (Permuted Congruential Generator).
///
/// Uses the PCG-XSH-RR variant: 64-bit LCG state, 32-bit permuted output.
/// Small, fast, and passes standard statistical test batteries.
///
/// # Determinism
///
/// Two generators built from the same seed produce the same sequence. Callers
/// that need independent streams for separate decision points should derive
/// per-decision seeds with [`compute_seed`] rather than sharing one generator
/// across unrelated code paths.
#[derive(Clone, Copy, Debug)]
pub struct CombatRng {
    state: u64,
}

impl CombatRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    /// Creates a generator from a seed.
    ///
    /// The seed is stepped once on construction so that adjacent seeds do not
    /// produce correlated first outputs.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        rng.step();
        rng
    }

    #[inline]
    fn step(&mut self) {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
    }

    /// XSH-RR output permutation: xorshift high bits, then random rotate.
    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Advances the generator and returns the next 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.step();
        Self::output(self.state)
    }

    /// Rolls a d100 (1-100 inclusive). Common for percentage mechanics.
    pub fn roll_d100(&mut self) -> u32 {
        (self.next_u32() % 100) + 1
    }

    /// Rolls a die with N sides (1-N inclusive).
    pub fn roll_die(&mut self, sides: u32) -> u32 {
        (self.next_u32() % sides.max(1)) + 1
    }

    /// Returns a value in `[min, max]` inclusive.
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = max - min + 1;
        min + (self.next_u32() % span)
    }

    /// Percentage check: true with `percent` in 100 probability.
    ///
    /// A `percent` of 0 never succeeds; 100 or more always succeeds.
    pub fn chance(&mut self, percent: u32) -> bool {
        if percent == 0 {
            return false;
        }
        self.roll_d100() <= percent
    }

    /// Returns a uniform index into a collection of `len` elements.
    ///
    /// `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        (self.next_u32() as usize) % len.max(1)
    }
}

/// Derives a per-decision seed from match-level entropy sources.
///
/// # Arguments
///
/// * `match_seed` - Base seed fixed at match creation
/// * `nonce` - Decision counter (increments for each random decision point)
/// * `actor` - Participant the decision concerns
/// * `context` - Distinguishes multiple rolls within one decision
///   (0 = primary, 1 = secondary, ...)
pub fn compute_seed(match_seed: u64, nonce: u64, actor: u32, context: u32) -> u64 {
    // SplitMix64/FxHash-style mixing constants
    let mut hash = match_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}
