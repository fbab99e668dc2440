//! Cache key derivation for API resources

use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a fingerprint (32 hex characters)
const DIGEST_BYTES: usize = 16;

/// Derives the cache key for a resource and its canonical query string
///
/// The query string must already be canonical (keys sorted, form-urlencoded)
/// so that equal parameter sets produce equal fingerprints. The resource name
/// is kept as a readable prefix: `fingerprint("recipients", "currency=EUR")`
/// yields `recipients-<32 hex chars>`.
pub fn fingerprint(resource: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(resource.as_bytes());
    hasher.update(b"\n");
    hasher.update(query.as_bytes());
    let digest = hasher.finalize();

    format!("{}-{}", resource, hex::encode(&digest[..DIGEST_BYTES]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("recipients", "currency=EUR&profileId=42");
        let b = fingerprint("recipients", "currency=EUR&profileId=42");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_is_stable_across_runs() {
        // Pinned value: a change here invalidates every cache on disk
        assert_eq!(fingerprint("profiles", ""), "profiles-ec06e190b1093b3a224b2794a0f03006");
        assert_eq!(
            fingerprint("recipients", "currency=EUR"),
            "recipients-a6d8c006d23587f16ffc74c38db3e531"
        );
    }

    #[test]
    fn test_fingerprint_differs_by_query_value() {
        let eur = fingerprint("recipients", "currency=EUR");
        let gbp = fingerprint("recipients", "currency=GBP");
        assert_ne!(eur, gbp);
    }

    #[test]
    fn test_fingerprint_differs_by_resource() {
        assert_ne!(fingerprint("transfers", "limit=100"), fingerprint("recipients", "limit=100"));
    }

    #[test]
    fn test_fingerprint_separates_resource_from_query() {
        assert_ne!(fingerprint("ab", "c"), fingerprint("a", "bc"));
    }

    #[test]
    fn test_fingerprint_shape() {
        let key = fingerprint("transfers", "limit=100&offset=0");
        let (prefix, hash) = key.split_once('-').expect("Key should contain a dash");

        assert_eq!(prefix, "transfers");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_many_distinct_queries() {
        let keys: std::collections::HashSet<String> = (0..1000)
            .map(|i| fingerprint("transfers", &format!("limit=100&offset={}", i)))
            .collect();
        assert_eq!(keys.len(), 1000);
    }
}
