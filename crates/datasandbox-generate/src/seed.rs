use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Random number stream for one randomized field.
///
/// All fields of a run share the seed; the stream id selects an independent
/// ChaCha stream, so a field's sequence does not depend on which other
/// randomized fields exist.
pub fn field_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Mix a seed with a textual key (FNV-1a), e.g. to give each dataset its
/// own seed space.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
