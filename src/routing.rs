//! Key to worker routing.
//!
//! FNV-1a over the key bytes. Deterministic for the life of the process and
//! independent of `RandomState`, so a key always lands on the same worker.

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[inline]
pub fn stable_hash(key: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Index in `[0, workers)` for `key`. `workers` must be non-zero.
#[inline]
pub fn route(key: &str, workers: usize) -> usize {
    debug_assert!(workers > 0);
    (stable_hash(key) % workers as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(stable_hash(""), 0xcbf29ce484222325);
        assert_eq!(stable_hash("a"), 0xaf63dc4c8601ec8c);
        assert_eq!(stable_hash("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn route_is_stable_and_in_range() {
        for workers in 1..=16 {
            for i in 0..200 {
                let key = format!("key-{i}");
                let idx = route(&key, workers);
                assert!(idx < workers);
                assert_eq!(idx, route(&key, workers));
            }
        }
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(route("anything", 1), 0);
        assert_eq!(route("", 1), 0);
    }

    #[test]
    fn spreads_keys_across_workers() {
        let workers = 8;
        let mut buckets = vec![0usize; workers];
        for i in 0..8_000 {
            buckets[route(&format!("user:{i}"), workers)] += 1;
        }
        // 1000 expected per bucket
        for count in buckets {
            assert!((700..=1300).contains(&count), "skewed bucket: {count}");
        }
    }
}
