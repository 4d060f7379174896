use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

// Seeded permutation of 0..=255, stored twice (512 entries) so the
// double lookup perm[perm[x] + y] never needs a bounds wrap
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationTable {
    perm: [u8; 512],
}

impl PermutationTable {
    // seed >= 0 gives the same table on every run and every platform,
    // seed < 0 draws the shuffle from system entropy
    pub fn new(seed: i64) -> Self {
        let mut p: Vec<u8> = (0..=255u8).collect();
        let mut rng = seeded_rng(seed);
        // Fisher–Yates shuffle
        p.shuffle(&mut rng);

        // Duplicate into an array of length 512
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }

        Self { perm }
    }

    // Hash any lattice coordinate, negative ones included.
    // `& 255` on a two's complement integer is a floor-based modulo,
    // so -1 maps to 255 rather than to -1 % 256.
    #[inline]
    pub fn lookup(&self, i: i64) -> u8 {
        self.perm[(i & 255) as usize]
    }

    // Raw access into the doubled table; `i` must be < 512
    #[inline]
    pub(crate) fn at(&self, i: usize) -> u8 {
        self.perm[i]
    }

    // The 256 shuffled values (first half of the doubled table)
    pub fn values(&self) -> &[u8] {
        &self.perm[..256]
    }
}

// Every seeded stream in the crate comes from here: ChaCha8 is portable,
// so a non-negative seed reproduces across processes and targets
pub(crate) fn seeded_rng(seed: i64) -> ChaCha8Rng {
    if seed >= 0 {
        ChaCha8Rng::seed_from_u64(seed as u64)
    } else {
        tracing::warn!(seed, "negative seed, drawing from system entropy");
        ChaCha8Rng::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::PermutationTable;

    #[test]
    fn permutation_is_a_shuffle_of_all_bytes() {
        let table = PermutationTable::new(42);
        let mut seen = [false; 256];
        for &v in table.values() {
            assert!(!seen[v as usize], "value {} appears twice", v);
            seen[v as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn same_seed_same_table() {
        assert_eq!(PermutationTable::new(1234), PermutationTable::new(1234));
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(PermutationTable::new(1), PermutationTable::new(2));
    }

    #[test]
    fn shuffle_is_not_identity() {
        let table = PermutationTable::new(7);
        let identity: Vec<u8> = (0..=255u8).collect();
        assert_ne!(table.values(), identity.as_slice());
    }

    #[test]
    fn second_half_mirrors_first() {
        let table = PermutationTable::new(99);
        for i in 0..256 {
            assert_eq!(table.at(i), table.at(i + 256));
        }
    }

    #[test]
    fn negative_indices_wrap_like_floor_modulo() {
        let table = PermutationTable::new(5);
        assert_eq!(table.lookup(-1), table.lookup(255));
        assert_eq!(table.lookup(-256), table.lookup(0));
        assert_eq!(table.lookup(-257), table.lookup(255));
        assert_eq!(table.lookup(256), table.lookup(0));
    }

    #[test]
    fn entropy_seed_still_builds_a_permutation() {
        let table = PermutationTable::new(-1);
        let mut sorted = table.values().to_vec();
        sorted.sort_unstable();
        let identity: Vec<u8> = (0..=255u8).collect();
        assert_eq!(sorted, identity);
    }
}
