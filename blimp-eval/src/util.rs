use rand::{rngs::SmallRng, SeedableRng};

/// A reproducible generator when `seed` is given, an entropy-seeded one otherwise.
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
  match seed {
    Some(seed) => SmallRng::seed_from_u64(seed),
    None => SmallRng::from_entropy(),
  }
}
