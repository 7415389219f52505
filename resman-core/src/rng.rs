use crate::Address;
use rand_chacha::ChaChaRng;
use rand_core::{Rng, SeedableRng as _};

/// Deterministic random stream
///
/// Every consumer of randomness (the role assignment and each node's
/// application) owns its own [`SimRng`]. Nothing is shared, so replaying
/// the same seed with the same sequence of ticks and receptions yields
/// exactly the same draws.
#[derive(Debug, Clone)]
pub struct SimRng(ChaChaRng);

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self(ChaChaRng::seed_from_u64(seed))
    }

    /// the stream of the application running on `address`
    ///
    /// Derived from the scenario seed so that nodes don't all draw the
    /// same sequence.
    pub fn for_node(seed: u64, address: Address) -> Self {
        Self::seed_from_u64(splitmix64(seed ^ splitmix64(u64::from(address))))
    }

    /// uniform draw in `[0, bound)`
    ///
    /// # Panics
    ///
    /// if `bound` is `0`
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "cannot draw from an empty range");

        // reject the low values so the remaining span is a multiple of `bound`
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let bits = self.0.next_u64();
            if bits >= threshold {
                return bits % bound;
            }
        }
    }

    /// uniform draw in `[min, max)`, `min` if the range is empty
    pub fn range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            min
        } else {
            min + self.below(max - min)
        }
    }

    /// `true` with a probability of `percent`%
    pub fn percent(&mut self, percent: u8) -> bool {
        self.below(100) < u64::from(percent)
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
