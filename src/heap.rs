//! A fixed-capacity binary heap that tracks the slot of every entry, allowing
//! membership tests and in-place priority updates in O(log n).
//!
//! The heap stores keys into a [HeapStore] rather than the items themselves.
//! Each item carries its own slot index ([HeapItem::heap_index]), which the
//! heap rewrites on every swap.
use indexmap::IndexMap;
use std::cmp::Ordering;

use crate::error::{NavError, NavResult};

/// An entry that can be ranked by an [IndexedHeap]. [Ordering::Greater] means
/// "extracted earlier".
pub trait HeapItem: Ord {
    fn heap_index(&self) -> usize;
    fn set_heap_index(&mut self, index: usize);
}

/// Backing storage addressed by the keys held in an [IndexedHeap].
pub trait HeapStore {
    type Item: HeapItem;
    fn item(&self, key: usize) -> &Self::Item;
    fn item_mut(&mut self, key: usize) -> &mut Self::Item;
}

impl<T: HeapItem> HeapStore for Vec<T> {
    type Item = T;
    fn item(&self, key: usize) -> &T {
        &self[key]
    }
    fn item_mut(&mut self, key: usize) -> &mut T {
        &mut self[key]
    }
}

/// Keys are entry positions, as returned by [IndexMap::insert_full].
impl<K, T: HeapItem, S> HeapStore for IndexMap<K, T, S> {
    type Item = T;
    fn item(&self, key: usize) -> &T {
        &self[key]
    }
    fn item_mut(&mut self, key: usize) -> &mut T {
        &mut self[key]
    }
}

#[derive(Clone, Debug)]
pub struct IndexedHeap {
    slots: Vec<usize>,
    capacity: usize,
}

impl IndexedHeap {
    pub fn with_capacity(capacity: usize) -> IndexedHeap {
        IndexedHeap {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Key stored at the given slot, if the slot is live.
    pub fn slot(&self, index: usize) -> Option<usize> {
        self.slots.get(index).copied()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn insert<S: HeapStore>(&mut self, store: &mut S, key: usize) -> NavResult<()> {
        if self.slots.len() == self.capacity {
            return Err(NavError::QueueFull {
                capacity: self.capacity,
            });
        }
        store.item_mut(key).set_heap_index(self.slots.len());
        self.slots.push(key);
        self.sift_up(store, key);
        Ok(())
    }

    /// Removes and returns the key of the best item.
    pub fn extract_best<S: HeapStore>(&mut self, store: &mut S) -> Option<usize> {
        let last = self.slots.pop()?;
        if self.slots.is_empty() {
            return Some(last);
        }
        let best = std::mem::replace(&mut self.slots[0], last);
        store.item_mut(last).set_heap_index(0);
        self.sift_down(store, last);
        Some(best)
    }

    /// Only trustworthy while the item's stored index has not gone stale, so
    /// the slot must still hold this very key.
    pub fn contains<S: HeapStore>(&self, store: &S, key: usize) -> bool {
        self.slot(store.item(key).heap_index()) == Some(key)
    }

    /// Restores the heap after an item's priority was raised. Sift-up only.
    pub fn update<S: HeapStore>(&mut self, store: &mut S, key: usize) {
        self.sift_up(store, key);
    }

    fn sift_up<S: HeapStore>(&mut self, store: &mut S, key: usize) {
        let mut index = store.item(key).heap_index();
        while index > 0 {
            let parent = (index - 1) / 2;
            let parent_key = self.slots[parent];
            if store.item(key).cmp(store.item(parent_key)) == Ordering::Greater {
                self.swap(store, index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down<S: HeapStore>(&mut self, store: &mut S, key: usize) {
        let mut index = store.item(key).heap_index();
        loop {
            let left = index * 2 + 1;
            let right = left + 1;
            if left >= self.slots.len() {
                return;
            }
            let mut child = left;
            if right < self.slots.len()
                && store
                    .item(self.slots[left])
                    .cmp(store.item(self.slots[right]))
                    != Ordering::Greater
            {
                child = right;
            }
            if store.item(key).cmp(store.item(self.slots[child])) == Ordering::Less {
                self.swap(store, index, child);
                index = child;
            } else {
                return;
            }
        }
    }

    fn swap<S: HeapStore>(&mut self, store: &mut S, a: usize, b: usize) {
        self.slots.swap(a, b);
        store.item_mut(self.slots[a]).set_heap_index(a);
        store.item_mut(self.slots[b]).set_heap_index(b);
    }
}
