use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

const FRAGMENT_SPACE: u64 = 1_000_000;

/// Mints `{time:4}{fragment:6}@{domain}` staff ids.
///
/// The fragment walks `seed + n * stride (mod 10^6)` with a random seed and a
/// random stride coprime to 10^6, so one generator never repeats a fragment
/// within a million ids. Ids from different processes can still collide; the
/// store's unique index plus a retry covers that.
#[derive(Debug)]
pub struct StaffIdGenerator {
    domain: String,
    seed: u64,
    stride: u64,
    issued: AtomicU64,
}

impl StaffIdGenerator {
    pub fn new(domain: impl Into<String>) -> Self {
        let mut rng = rand::rng();
        let seed = rng.random_range(0..FRAGMENT_SPACE);
        let stride = loop {
            let candidate = rng.random_range(1..FRAGMENT_SPACE);
            if candidate % 2 != 0 && candidate % 5 != 0 {
                break candidate;
            }
        };
        Self {
            domain: domain.into(),
            seed,
            stride,
            issued: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::Relaxed);
        let fragment = (self.seed + (n % FRAGMENT_SPACE) * self.stride) % FRAGMENT_SPACE;
        let time_fragment = Utc::now().timestamp_millis().rem_euclid(10_000);
        format!("{:04}{:06}@{}", time_fragment, fragment, self.domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_well_formed(id: &str, domain: &str) -> bool {
        match id.split_once('@') {
            Some((local, d)) => local.len() == 10 && local.chars().all(|c| c.is_ascii_digit()) && d == domain,
            None => false,
        }
    }

    #[test]
    fn ids_have_stable_format() {
        let generator = StaffIdGenerator::new("classcify.in");
        for _ in 0..100 {
            let id = generator.next_id();
            assert!(is_well_formed(&id, "classcify.in"), "malformed staff id: {}", id);
        }
    }

    #[test]
    fn ten_thousand_ids_are_distinct() {
        let generator = StaffIdGenerator::new("classcify.in");
        let ids: HashSet<String> = (0..10_000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn uses_configured_domain() {
        let generator = StaffIdGenerator::new("school.example");
        assert!(generator.next_id().ends_with("@school.example"));
        assert_eq!(generator.domain(), "school.example");
    }
}
