use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One mutex per collection name, created lazily on first use.
///
/// The outer map lock is only held for the lookup/insert; callers hold the
/// returned per-collection lock for the duration of a mutation. Entries are
/// never removed.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock for `collection`, creating it if this is the first access.
    /// Every call with the same name returns the same lock.
    pub fn lock_for(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let entry = map
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry)
    }

    /// Number of collections that have a lock.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_same_name_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.lock_for("users");
        let b = registry.lock_for("users");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_different_names_different_locks() {
        let registry = LockRegistry::new();
        let a = registry.lock_for("users");
        let b = registry.lock_for("posts");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);

        // Holding one does not block the other
        let _ga = a.lock().unwrap();
        assert!(b.try_lock().is_ok());
    }

    #[test]
    fn test_concurrent_first_access_creates_one_lock() {
        let registry = LockRegistry::new();
        let locks: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| registry.lock_for("events")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(registry.len(), 1);
        for lock in &locks[1..] {
            assert!(Arc::ptr_eq(&locks[0], lock));
        }
    }

    #[test]
    fn test_lock_serializes_holders() {
        let registry = LockRegistry::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let lock = registry.lock_for("users");
                    let _guard = lock.lock().unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    std::thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_poisoned_lock_still_usable() {
        let registry = LockRegistry::new();
        let lock = registry.lock_for("users");
        let cloned = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        })
        .join();

        let again = registry.lock_for("users");
        let guard = again.lock().unwrap_or_else(|e| e.into_inner());
        drop(guard);
        assert!(Arc::ptr_eq(&lock, &again));
    }
}
