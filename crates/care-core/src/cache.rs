//! Short-lived key/value cache used for generation progress.
//!
//! [`ProgressCache`] is the interface the pipeline needs from a shared cache
//! (Redis in a multi-process deployment). [`MemoryCache`] is the in-process
//! implementation; expiry is driven by a [`Clock`] so tests can move time.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Cache errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("invalid cached value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("progress out of range: {0}")]
    InvalidProgress(u8),
}

impl<T> From<std::sync::PoisonError<T>> for CacheError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        CacheError::Poisoned
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// String key/value cache with per-entry expiry.
pub trait ProgressCache: Send + Sync {
    /// Store `value`, replacing any existing entry, expiring after `ttl`.
    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Read a live entry.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Remove an entry. Missing keys are not an error.
    fn delete(&self, key: &str) -> CacheResult<()>;

    /// Store `value` only if no live entry exists. Returns whether it was stored.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// Remove the entry only if it currently holds `expected`.
    fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool>;
}

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache<C: Clock = SystemClock> {
    clock: C,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> CacheResult<usize> {
        let now = self.clock.now();
        let entries = self.entries.lock()?;
        Ok(entries.values().filter(|e| e.expires_at > now).count())
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }

    fn live_value(entries: &HashMap<String, Entry>, key: &str, now: Instant) -> Option<String> {
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }
}

impl<C: Clock> ProgressCache for MemoryCache<C> {
    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock()?;
        let value = Self::live_value(&entries, key, now);
        if value.is_none() {
            entries.remove(key);
        }
        Ok(value)
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock()?.remove(key);
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        let now = self.clock.now();
        let mut entries = self.entries.lock()?;
        if Self::live_value(&entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        let now = self.clock.now();
        let mut entries = self.entries.lock()?;
        match Self::live_value(&entries, key, now) {
            Some(current) if current == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
