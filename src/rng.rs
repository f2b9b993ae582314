use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

const GROUP_DERIVATION_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derive an independent stream for one group so groups never share RNG state.
pub fn derive_group_rng(base_seed: u64, group_id: usize) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(
        base_seed.wrapping_add((group_id as u64 + 1).wrapping_mul(GROUP_DERIVATION_PRIME)),
    )
}

/// Seed drawn from the platform entropy source, with a fixed fallback when none is available.
pub fn entropy_seed() -> u64 {
    getrandom::u64().unwrap_or(GROUP_DERIVATION_PRIME)
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::{create_rng, derive_group_rng};

    #[test]
    fn same_seed_replays_same_stream() {
        let mut a = create_rng(7);
        let mut b = create_rng(7);
        for _ in 0..16 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn groups_get_distinct_streams() {
        let mut a = derive_group_rng(7, 0);
        let mut b = derive_group_rng(7, 1);
        let first: Vec<u64> = (0..4).map(|_| a.random()).collect();
        let second: Vec<u64> = (0..4).map(|_| b.random()).collect();
        assert_ne!(first, second);
    }
}
