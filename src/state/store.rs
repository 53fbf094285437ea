//! In-memory slide sequence.
//!
//! Slides live in a doubly linked chain whose nodes sit in an arena owned by
//! the [`SlideStore`]. Links are [`NodeRef`] handles rather than references:
//! a handle carries the generation of the slot it points at, so a handle to a
//! removed node stops resolving even after its slot is reused.
//!
//! # Example
//!
//! ```
//! use slideshow::state::data::SlideRecord;
//! use slideshow::state::store::SlideStore;
//!
//! let mut store = SlideStore::new();
//! let a = store.append(SlideRecord::new("img1.jpg", "A"));
//! let b = store.append(SlideRecord::new("img2.jpg", "B"));
//!
//! assert_eq!(store.next(a), Some(b));
//! assert_eq!(store.prev(b), Some(a));
//!
//! assert_eq!(store.remove(a).map(|r| r.description), Some("A".to_string()));
//! assert_eq!(store.head(), Some(b));
//! assert!(store.get(a).is_none());
//! ```

use std::iter::FusedIterator;
use std::mem;

use tracing::debug;

use super::data::SlideRecord;
use crate::error::{Result, SlideError};

/// Handle to a node in a [`SlideStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    index: usize,
    generation: u32,
}

/// A slide plus its neighbours in the sequence.
#[derive(Debug)]
struct SlideNode {
    record: SlideRecord,
    prev: Option<NodeRef>,
    next: Option<NodeRef>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<SlideNode>,
}

/// Doubly linked sequence of slides.
///
/// Invariants, checked by the tests after every mutation:
/// - `head` is `None` exactly when `len == 0`
/// - exactly `len` nodes are reachable forward from `head` and backward from `tail`
/// - `head.prev` and `tail.next` are `None`
/// - `next.prev == node` and `prev.next == node` for every node
#[derive(Debug, Default)]
pub struct SlideStore {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<NodeRef>,
    tail: Option<NodeRef>,
    len: usize,
    version: u64,
}

impl SlideStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` slides.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn head(&self) -> Option<NodeRef> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<NodeRef> {
        self.tail
    }

    /// Layout version.
    ///
    /// Bumped by every mutation that changes which node sits at which
    /// position (append, remove, clear). Replacing a record does not move
    /// anything and leaves the version alone.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Adds a slide at the tail in O(1).
    pub fn append(&mut self, record: SlideRecord) -> NodeRef {
        let prev = self.tail;
        let node = self.allocate(SlideNode {
            record,
            prev,
            next: None,
        });

        match prev.and_then(|tail| self.node_mut(tail)) {
            Some(tail) => tail.next = Some(node),
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        self.version += 1;
        node
    }

    /// Returns the slide after `node`.
    #[inline]
    pub fn next(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node)?.next
    }

    /// Returns the slide before `node`.
    #[inline]
    pub fn prev(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node)?.prev
    }

    /// Returns the record at `node`, or `None` if the handle is stale.
    #[inline]
    pub fn get(&self, node: NodeRef) -> Option<&SlideRecord> {
        self.node(node).map(|n| &n.record)
    }

    #[inline]
    pub fn contains(&self, node: NodeRef) -> bool {
        self.node(node).is_some()
    }

    /// Swaps the record stored at `node`, returning the old one.
    pub fn replace(&mut self, node: NodeRef, record: SlideRecord) -> Result<SlideRecord> {
        let slot = self
            .node_mut(node)
            .ok_or_else(|| SlideError::NotFound(format!("node {}", node.index)))?;
        Ok(mem::replace(&mut slot.record, record))
    }

    /// Unlinks `node`, relinking its neighbours, and returns its record.
    ///
    /// Returns `None` if the handle is stale.
    pub fn remove(&mut self, node: NodeRef) -> Option<SlideRecord> {
        let slot = self.slots.get_mut(node.index)?;
        if slot.generation != node.generation {
            return None;
        }
        let removed = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);

        match removed.prev.and_then(|prev| self.node_mut(prev)) {
            Some(prev) => prev.next = removed.next,
            None => self.head = removed.next,
        }
        match removed.next.and_then(|next| self.node_mut(next)) {
            Some(next) => next.prev = removed.prev,
            None => self.tail = removed.prev,
        }

        self.len -= 1;
        self.version += 1;
        debug!(index = node.index, len = self.len, "removed slide node");
        Some(removed.record)
    }

    /// Drops every slide. Existing handles stop resolving.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index);
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.version += 1;
    }

    /// 0-based position of `node`, found by walking forward from the head.
    pub fn position_of(&self, node: NodeRef) -> Option<usize> {
        if !self.contains(node) {
            return None;
        }
        self.iter().position(|(key, _)| key == node)
    }

    /// Iterates slides from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn allocate(&mut self, node: SlideNode) -> NodeRef {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            NodeRef {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeRef {
                index,
                generation: 0,
            }
        }
    }

    #[inline]
    fn node(&self, node: NodeRef) -> Option<&SlideNode> {
        let slot = self.slots.get(node.index)?;
        if slot.generation != node.generation {
            return None;
        }
        slot.node.as_ref()
    }

    #[inline]
    fn node_mut(&mut self, node: NodeRef) -> Option<&mut SlideNode> {
        let slot = self.slots.get_mut(node.index)?;
        if slot.generation != node.generation {
            return None;
        }
        slot.node.as_mut()
    }
}

impl FromIterator<SlideRecord> for SlideStore {
    fn from_iter<I: IntoIterator<Item = SlideRecord>>(iter: I) -> Self {
        let mut store = SlideStore::new();
        store.extend(iter);
        store
    }
}

impl Extend<SlideRecord> for SlideStore {
    fn extend<I: IntoIterator<Item = SlideRecord>>(&mut self, iter: I) {
        for record in iter {
            self.append(record);
        }
    }
}

/// Head-to-tail iterator over `(handle, record)` pairs.
pub struct Iter<'a> {
    store: &'a SlideStore,
    cursor: Option<NodeRef>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeRef, &'a SlideRecord);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let node = self.store.node(key)?;
        self.cursor = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((key, &node.record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
