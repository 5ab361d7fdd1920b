use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// In-memory record of URLs claimed during the current run
///
/// A URL is claimed by the worker that is about to process it. Claiming is
/// an atomic check-and-insert, so two workers racing on the same URL cannot
/// both win. The lock is only held for the set operation itself.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url`; returns false if it was already claimed
    pub fn claim(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    /// Gives a claim back so a later discovery of `url` may try again
    pub fn release(&self, url: &str) {
        self.lock().remove(url);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    // A panic while holding the lock cannot leave a HashSet half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_once() {
        let set = VisitedSet::new();
        assert!(set.claim("https://example.test/"));
        assert!(!set.claim("https://example.test/"));
        assert!(set.contains("https://example.test/"));
    }

    #[test]
    fn test_release_allows_reclaim() {
        let set = VisitedSet::new();
        assert!(set.claim("https://example.test/a"));
        set.release("https://example.test/a");
        assert!(!set.contains("https://example.test/a"));
        assert!(set.claim("https://example.test/a"));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let set = Arc::new(VisitedSet::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let set = set.clone();
                std::thread::spawn(move || set.claim("https://example.test/race"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
