use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static GLOBAL: Lazy<ScrollLock> = Lazy::new(ScrollLock::new);

/// Reference-counted "page may not scroll" flag.
///
/// The page is locked while at least one [`ScrollLockGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    holders: Arc<Mutex<usize>>,
}

impl ScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide lock consulted by the page's scroll handler.
    pub fn global() -> &'static ScrollLock {
        &GLOBAL
    }

    pub fn acquire(&self) -> ScrollLockGuard {
        let mut holders = self.holders.lock();
        *holders += 1;
        if *holders == 1 {
            tracing::debug!("page scroll locked");
        }
        ScrollLockGuard { lock: self.clone() }
    }

    pub fn is_locked(&self) -> bool {
        self.holders() > 0
    }

    pub fn holders(&self) -> usize {
        *self.holders.lock()
    }

    fn release(&self) {
        let mut holders = self.holders.lock();
        *holders = holders.saturating_sub(1);
        if *holders == 0 {
            tracing::debug!("page scroll unlocked");
        }
    }
}

/// Releases its share of the lock when dropped.
#[derive(Debug)]
pub struct ScrollLockGuard {
    lock: ScrollLock,
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = ScrollLock::new();
        assert!(!lock.is_locked());
        let guard = lock.acquire();
        assert!(lock.is_locked());
        drop(guard);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_nested_holders() {
        let lock = ScrollLock::new();
        let first = lock.acquire();
        let second = lock.acquire();
        assert_eq!(lock.holders(), 2);
        drop(first);
        assert!(lock.is_locked());
        drop(second);
        assert_eq!(lock.holders(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let lock = ScrollLock::new();
        let other = lock.clone();
        let _guard = other.acquire();
        assert!(lock.is_locked());
    }
}
