//! Discharge summary progress lock.
//!
//! The progress lock is advisory: it records how far a generation has got so
//! clients can poll it, and it lets callers see that a generation is running.
//! It does not stop a second generation from starting. [`LeaseLock`] is the
//! exclusive variant, keyed separately and released only by its owner.

use std::time::Duration;

use crate::cache::{CacheError, CacheResult, ProgressCache};

/// How long a progress entry lives without being refreshed.
pub const LOCK_DURATION: Duration = Duration::from_secs(2 * 60);

/// Cache key of the progress entry for a consultation.
pub fn lock_key(consultation_external_id: &str) -> String {
    format!("discharge_summary_{}", consultation_external_id)
}

fn lease_key(consultation_external_id: &str) -> String {
    format!("discharge_summary_lease_{}", consultation_external_id)
}

/// Progress of in-flight discharge summary generations.
#[derive(Clone, Copy)]
pub struct ProgressLock<'a> {
    cache: &'a dyn ProgressCache,
    ttl: Duration,
}

impl<'a> ProgressLock<'a> {
    pub fn new(cache: &'a dyn ProgressCache) -> Self {
        Self {
            cache,
            ttl: LOCK_DURATION,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Record progress (0-100), refreshing the expiry.
    pub fn set(&self, consultation_external_id: &str, progress: u8) -> CacheResult<()> {
        if progress > 100 {
            return Err(CacheError::InvalidProgress(progress));
        }
        self.cache.set_with_ttl(
            &lock_key(consultation_external_id),
            &progress.to_string(),
            self.ttl,
        )
    }

    /// Current progress, or `None` when no generation is running.
    pub fn get(&self, consultation_external_id: &str) -> CacheResult<Option<u8>> {
        let key = lock_key(consultation_external_id);
        match self.cache.get(&key)? {
            Some(value) => value
                .parse::<u8>()
                .map(Some)
                .map_err(|_| CacheError::InvalidValue { key, value }),
            None => Ok(None),
        }
    }

    /// Remove the entry. Idempotent.
    pub fn clear(&self, consultation_external_id: &str) -> CacheResult<()> {
        self.cache.delete(&lock_key(consultation_external_id))
    }

    /// Set the initial progress and return a guard that clears it when dropped.
    pub fn acquire(
        &self,
        consultation_external_id: &str,
        progress: u8,
    ) -> CacheResult<LockGuard<'a>> {
        self.set(consultation_external_id, progress)?;
        Ok(LockGuard {
            lock: *self,
            consultation_external_id: consultation_external_id.to_string(),
        })
    }
}

/// Clears the progress entry on drop, on success and error paths alike.
pub struct LockGuard<'a> {
    lock: ProgressLock<'a>,
    consultation_external_id: String,
}

impl LockGuard<'_> {
    pub fn set_progress(&self, progress: u8) -> CacheResult<()> {
        self.lock.set(&self.consultation_external_id, progress)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.clear(&self.consultation_external_id) {
            tracing::warn!(
                consultation = %self.consultation_external_id,
                error = %e,
                "failed to clear discharge summary lock"
            );
        }
    }
}

/// A held lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub consultation_external_id: String,
    pub owner: String,
}

/// Exclusive generation lease with an owner token and expiry.
pub struct LeaseLock<'a> {
    cache: &'a dyn ProgressCache,
    ttl: Duration,
}

impl<'a> LeaseLock<'a> {
    pub fn new(cache: &'a dyn ProgressCache) -> Self {
        Self {
            cache,
            ttl: LOCK_DURATION,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Take the lease unless someone else holds a live one.
    pub fn try_acquire(
        &self,
        consultation_external_id: &str,
        owner: &str,
    ) -> CacheResult<Option<Lease>> {
        let acquired =
            self.cache
                .set_if_absent(&lease_key(consultation_external_id), owner, self.ttl)?;
        Ok(acquired.then(|| Lease {
            consultation_external_id: consultation_external_id.to_string(),
            owner: owner.to_string(),
        }))
    }

    /// Current holder, if any.
    pub fn holder(&self, consultation_external_id: &str) -> CacheResult<Option<String>> {
        self.cache.get(&lease_key(consultation_external_id))
    }

    /// Release a lease. Returns false if it had expired or was taken over.
    pub fn release(&self, lease: &Lease) -> CacheResult<bool> {
        self.cache
            .delete_if_equals(&lease_key(&lease.consultation_external_id), &lease.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryCache};
    use std::sync::Arc;

    #[test]
    fn test_set_get_clear() {
        let cache = MemoryCache::new();
        let lock = ProgressLock::new(&cache);

        lock.set("c-1", 5).unwrap();
        assert_eq!(lock.get("c-1").unwrap(), Some(5));

        lock.set("c-1", 50).unwrap();
        assert_eq!(lock.get("c-1").unwrap(), Some(50));

        lock.clear("c-1").unwrap();
        assert_eq!(lock.get("c-1").unwrap(), None);
        lock.clear("c-1").unwrap();
    }

    #[test]
    fn test_key_format() {
        let cache = MemoryCache::new();
        ProgressLock::new(&cache).set("abc", 10).unwrap();
        assert_eq!(cache.get("discharge_summary_abc").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn test_expires_after_two_minutes() {
        let clock = Arc::new(ManualClock::new());
        let cache = MemoryCache::with_clock(Arc::clone(&clock));
        let lock = ProgressLock::new(&cache);

        lock.set("c-1", 5).unwrap();
        clock.advance(Duration::from_secs(119));
        assert_eq!(lock.get("c-1").unwrap(), Some(5));
        clock.advance(Duration::from_secs(1));
        assert_eq!(lock.get("c-1").unwrap(), None);
    }

    #[test]
    fn test_rejects_out_of_range_progress() {
        let cache = MemoryCache::new();
        let lock = ProgressLock::new(&cache);
        assert!(matches!(lock.set("c-1", 101), Err(CacheError::InvalidProgress(101))));
        lock.set("c-1", 100).unwrap();
    }

    #[test]
    fn test_garbage_value_is_reported() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl(&lock_key("c-1"), "half", Duration::from_secs(5))
            .unwrap();
        let err = ProgressLock::new(&cache).get("c-1").unwrap_err();
        assert!(matches!(err, CacheError::InvalidValue { .. }));
    }

    #[test]
    fn test_guard_clears_on_drop() {
        let cache = MemoryCache::new();
        let lock = ProgressLock::new(&cache);
        {
            let guard = lock.acquire("c-1", 5).unwrap();
            guard.set_progress(10).unwrap();
            assert_eq!(lock.get("c-1").unwrap(), Some(10));
        }
        assert_eq!(lock.get("c-1").unwrap(), None);
    }

    #[test]
    fn test_guard_clears_on_early_return() {
        fn failing_step(lock: &ProgressLock<'_>) -> Result<(), &'static str> {
            let _guard = lock.acquire("c-1", 5).map_err(|_| "cache")?;
            Err("boom")
        }

        let cache = MemoryCache::new();
        let lock = ProgressLock::new(&cache);
        assert!(failing_step(&lock).is_err());
        assert_eq!(lock.get("c-1").unwrap(), None);
    }

    #[test]
    fn test_lease_is_exclusive() {
        let cache = MemoryCache::new();
        let leases = LeaseLock::new(&cache);

        let lease = leases.try_acquire("c-1", "worker-a").unwrap().unwrap();
        assert!(leases.try_acquire("c-1", "worker-b").unwrap().is_none());
        assert_eq!(leases.holder("c-1").unwrap().as_deref(), Some("worker-a"));

        let stolen = Lease {
            consultation_external_id: "c-1".into(),
            owner: "worker-b".into(),
        };
        assert!(!leases.release(&stolen).unwrap());
        assert!(leases.release(&lease).unwrap());
        assert!(leases.try_acquire("c-1", "worker-b").unwrap().is_some());
    }

    #[test]
    fn test_lease_expires() {
        let clock = Arc::new(ManualClock::new());
        let cache = MemoryCache::with_clock(Arc::clone(&clock));
        let leases = LeaseLock::new(&cache).with_ttl(Duration::from_secs(30));

        let lease = leases.try_acquire("c-1", "worker-a").unwrap().unwrap();
        clock.advance(Duration::from_secs(30));
        assert!(leases.try_acquire("c-1", "worker-b").unwrap().is_some());
        assert!(!leases.release(&lease).unwrap());
    }

    #[test]
    fn test_lease_does_not_touch_progress() {
        let cache = MemoryCache::new();
        LeaseLock::new(&cache).try_acquire("c-1", "worker-a").unwrap();
        assert_eq!(ProgressLock::new(&cache).get("c-1").unwrap(), None);
    }
}
