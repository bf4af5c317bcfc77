//! Handle registry.
//!
//! Owns the objects the engine hands out by number: executed children,
//! process lists and info snapshots. Handles are allocated monotonically
//! from 1 and never reused, so a stale handle can never alias a newer
//! entry. Allocation stops at [`MAX_BOUNDARY_HANDLE`].

use procctl_common::{Error, Handle, Result, MAX_BOUNDARY_HANDLE};
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::trace;

#[derive(Debug)]
pub struct HandleRegistry<K, T> {
    entries: HashMap<u64, T>,
    next: u64,
    _key: PhantomData<K>,
}

impl<K: Handle, T> HandleRegistry<K, T> {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    fn starting_at(next: u64) -> Self {
        Self {
            entries: HashMap::new(),
            next,
            _key: PhantomData,
        }
    }

    /// Take ownership of `value` and return its new handle.
    pub fn insert(&mut self, value: T) -> Result<K> {
        if self.next > MAX_BOUNDARY_HANDLE {
            return Err(Error::resource_exhausted("handle space exhausted"));
        }
        let handle = K::from_raw(self.next);
        self.next += 1;
        self.entries.insert(handle.as_raw(), value);
        trace!("Registered {}", handle);
        Ok(handle)
    }

    pub fn get(&self, handle: K) -> Option<&T> {
        self.entries.get(&handle.as_raw())
    }

    pub fn get_mut(&mut self, handle: K) -> Option<&mut T> {
        self.entries.get_mut(&handle.as_raw())
    }

    /// Lookup that reports unknown and freed handles as errors.
    pub fn require(&self, handle: K) -> Result<&T> {
        self.get(handle).ok_or_else(|| Error::invalid_handle(handle))
    }

    pub fn require_mut(&mut self, handle: K) -> Result<&mut T> {
        self.entries
            .get_mut(&handle.as_raw())
            .ok_or_else(|| Error::invalid_handle(handle))
    }

    /// Release an entry. `None` when it was never issued or already freed.
    pub fn remove(&mut self, handle: K) -> Option<T> {
        let removed = self.entries.remove(&handle.as_raw());
        if removed.is_some() {
            trace!("Released {}", handle);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Handle, T> Default for HandleRegistry<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procctl_common::{ErrorKind, ListHandle};

    #[test]
    fn test_handles_are_never_reused() {
        let mut registry: HandleRegistry<ListHandle, &str> = HandleRegistry::new();
        let first = registry.insert("a").unwrap();
        assert_eq!(registry.remove(first), Some("a"));

        let second = registry.insert("b").unwrap();
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert_eq!(registry.get(second), Some(&"b"));
    }

    #[test]
    fn test_double_free_is_detected() {
        let mut registry: HandleRegistry<ListHandle, u32> = HandleRegistry::new();
        let handle = registry.insert(7).unwrap();

        assert!(registry.remove(handle).is_some());
        assert!(registry.remove(handle).is_none());
        assert_eq!(registry.require(handle).unwrap_err().kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_invalid_handle_is_never_issued() {
        let mut registry: HandleRegistry<ListHandle, u32> = HandleRegistry::new();
        let handle = registry.insert(1).unwrap();
        assert!(handle.is_valid());
        assert!(registry.get(ListHandle::INVALID).is_none());
    }

    #[test]
    fn test_allocation_stops_at_boundary() {
        let mut registry: HandleRegistry<ListHandle, u32> =
            HandleRegistry::starting_at(MAX_BOUNDARY_HANDLE);

        let last = registry.insert(1).unwrap();
        assert_eq!(last.as_raw(), MAX_BOUNDARY_HANDLE);
        assert_eq!(ListHandle::from_f64(last.to_f64()), Some(last));

        let err = registry.insert(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
    }
}
