//! Per-key reentrancy guard
//!
//! Entry points that call out to the token ledger hold a [`GuardToken`] for
//! their key for the whole call. A second call for the same key made while the
//! token is alive (for example from inside a ledger transfer) fails with
//! [`CommerceError::AlreadyInProgress`] instead of queueing.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::warn;

use crate::errors::{CommerceError, Result};

#[derive(Debug)]
pub struct ReentrancyGuard<K> {
    in_flight: RefCell<HashSet<K>>,
}

impl<K> Default for ReentrancyGuard<K> {
    fn default() -> Self {
        Self {
            in_flight: RefCell::new(HashSet::new()),
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> ReentrancyGuard<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight until the returned token is dropped
    pub fn enter(&self, key: K) -> Result<GuardToken<'_, K>> {
        if !self.in_flight.borrow_mut().insert(key) {
            warn!(?key, "Rejected reentrant call");
            return Err(CommerceError::AlreadyInProgress);
        }
        Ok(GuardToken { guard: self, key })
    }

    pub fn is_held(&self, key: &K) -> bool {
        self.in_flight.borrow().contains(key)
    }
}

/// Releases its key when dropped, on both success and error paths
#[derive(Debug)]
pub struct GuardToken<'a, K: Copy + Eq + Hash> {
    guard: &'a ReentrancyGuard<K>,
    key: K,
}

impl<K: Copy + Eq + Hash> Drop for GuardToken<'_, K> {
    fn drop(&mut self) {
        self.guard.in_flight.borrow_mut().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_enter_for_same_key_is_rejected() {
        let guard = ReentrancyGuard::new();
        let _token = guard.enter(1_u64).unwrap();

        assert_eq!(
            guard.enter(1_u64).unwrap_err(),
            CommerceError::AlreadyInProgress
        );
        assert!(guard.enter(2_u64).is_ok(), "Other keys stay independent");
    }

    #[test]
    fn test_key_released_on_drop() {
        let guard = ReentrancyGuard::new();
        {
            let _token = guard.enter("subscribe").unwrap();
            assert!(guard.is_held(&"subscribe"));
        }
        assert!(!guard.is_held(&"subscribe"));
        assert!(guard.enter("subscribe").is_ok());
    }
}
