use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Copy)]
struct CacheEntry {
    timestamp: f64,
    inserted: Instant,
}

/// Fingerprint -> query-timestamp index used to pair responses with their
/// queries. A background sweeper wakes every TTL and evicts entries older
/// than TTL, on the monotonic clock. Lookups do not refresh or consume an
/// entry, so retransmitted responses still correlate until eviction.
pub struct CacheDns {
    ttl: Duration,
    entries: Arc<DashMap<u64, CacheEntry>>,
    stopped: Arc<AtomicBool>,
}

impl CacheDns {
    pub fn new(ttl: Duration) -> Self {
        let entries: Arc<DashMap<u64, CacheEntry>> = Arc::new(DashMap::new());
        let stopped = Arc::new(AtomicBool::new(false));

        let sweep_entries = entries.clone();
        let sweep_stopped = stopped.clone();
        thread::spawn(move || loop {
            thread::sleep(ttl);
            if sweep_stopped.load(Ordering::Relaxed) {
                break;
            }
            let now = Instant::now();
            sweep_entries.retain(|_, e| now.duration_since(e.inserted) < ttl);
        });

        Self {
            ttl,
            entries,
            stopped,
        }
    }

    /// Inserts or overwrites; a colliding key within TTL takes the later
    /// timestamp.
    pub fn set(&self, key: u64, timestamp: f64) {
        self.entries.insert(
            key,
            CacheEntry {
                timestamp,
                inserted: Instant::now(),
            },
        );
    }

    pub fn get(&self, key: u64) -> Option<f64> {
        self.entries.get(&key).map(|e| e.timestamp)
    }

    /// One synchronous sweep pass; the worker calls this once when draining.
    pub fn expire(&self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now.duration_since(e.inserted) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tells the sweeper to exit at its next wakeup.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

impl Drop for CacheDns {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let cache = CacheDns::new(Duration::from_secs(10));
        cache.set(42, 1700000000.5);
        assert_eq!(cache.get(42), Some(1700000000.5));
        assert_eq!(cache.get(43), None);
    }

    #[test]
    fn get_does_not_consume() {
        let cache = CacheDns::new(Duration::from_secs(10));
        cache.set(7, 1.0);
        assert_eq!(cache.get(7), Some(1.0));
        assert_eq!(cache.get(7), Some(1.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn later_set_overwrites() {
        let cache = CacheDns::new(Duration::from_secs(10));
        cache.set(7, 1.0);
        cache.set(7, 2.0);
        assert_eq!(cache.get(7), Some(2.0));
    }

    #[test]
    fn expire_drops_old_entries() {
        let cache = CacheDns::new(Duration::from_millis(20));
        cache.set(1, 1.0);
        thread::sleep(Duration::from_millis(40));
        cache.set(2, 2.0);
        cache.expire();
        assert_eq!(cache.get(1), None);
        assert_eq!(cache.get(2), Some(2.0));
    }

    #[test]
    fn sweeper_evicts_in_background() {
        let cache = CacheDns::new(Duration::from_millis(20));
        cache.set(1, 1.0);
        thread::sleep(Duration::from_millis(80));
        assert!(cache.is_empty());
    }
}
