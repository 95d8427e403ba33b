use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Returns a copy of `items` in an order fully determined by `seed`.
///
/// The same seed over the same input always yields the same order, which is
/// what lets a random list resume where it left off after a restart.
#[must_use]
pub fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut out = items.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    out.shuffle(&mut rng);
    out
}

/// Draws a new seed for a freshly chosen random list.
#[must_use]
pub fn fresh_seed() -> u64 {
    rand::rng().random()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_order() {
        let items: Vec<u32> = (0..50).collect();
        assert_eq!(shuffled(&items, 7), shuffled(&items, 7));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let items: Vec<u32> = (0..50).collect();
        let mut out = shuffled(&items, 99);
        assert_ne!(out, items);
        out.sort_unstable();
        assert_eq!(out, items);
    }

    #[test]
    fn empty_input_is_fine() {
        let items: Vec<u8> = Vec::new();
        assert!(shuffled(&items, 1).is_empty());
    }
}
