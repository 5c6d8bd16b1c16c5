use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::sim::GridLayout;

/// Initial condition for the flow field
///
/// Every channel of every texel, padding included, gets an independent
/// uniform value in `[0, 1)`. The same seed always yields the same state.
pub fn seed_base_state(layout: &GridLayout, seed: u64) -> Vec<[f32; 4]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (0..layout.texel_count())
        .map(|_| [rng.gen(), rng.gen(), rng.gen(), rng.gen()])
        .collect()
}
