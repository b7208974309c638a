//! Opaque `u64` handles for objects owned on the Rust side of the FFI boundary.

use std::collections::HashMap;

/// Maps handles to values. Handle `0` is never issued, so it can signal failure.
pub struct HandleStore<T> {
    items: HashMap<u64, T>,
    next: u64,
}

impl<T> HandleStore<T> {
    pub fn new() -> Self {
        Self { items: HashMap::new(), next: 1 }
    }

    pub fn insert(&mut self, item: T) -> u64 {
        let handle = self.next;
        self.next += 1;
        self.items.insert(handle, item);
        handle
    }

    pub fn get(&self, handle: u64) -> Option<&T> {
        self.items.get(&handle)
    }

    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        self.items.get_mut(&handle)
    }

    pub fn remove(&mut self, handle: u64) -> Option<T> {
        self.items.remove(&handle)
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_one() {
        let mut store = HandleStore::new();
        assert_eq!(store.insert("a"), 1);
        assert_eq!(store.insert("b"), 2);
        assert!(store.get(0).is_none());
    }

    #[test]
    fn test_removed_handles_are_not_reused() {
        let mut store = HandleStore::new();
        let first = store.insert(10);
        assert_eq!(store.remove(first), Some(10));
        assert!(store.remove(first).is_none());
        assert_ne!(store.insert(11), first);
    }
}
