use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

/// Stable 64-bit hash of a value, used for render cache keys.
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    value.hash(&mut hasher);
    hasher.finish()
}
