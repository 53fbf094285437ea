//! Position lookup over a [`SlideStore`].
//!
//! [`SlideIndex::find_by_index`] resolves a 0-based position to a node. It
//! narrows a `[left, right]` window from both ends of the chain, halving it
//! around a midpoint found with a slow/fast pointer walk. Each halving still
//! walks the window, so a lookup costs O(n) hops; the per-position cache is
//! what makes repeated jumps cheap.
//!
//! ```
//! use slideshow::state::data::SlideRecord;
//! use slideshow::state::lookup::SlideIndex;
//! use slideshow::state::store::SlideStore;
//!
//! let store: SlideStore = ["A", "B", "C"]
//!     .iter()
//!     .map(|d| SlideRecord::new(format!("{d}.jpg"), *d))
//!     .collect();
//! let mut index = SlideIndex::new();
//!
//! let node = index.find_by_index(&store, 1).unwrap();
//! assert_eq!(store.get(node).unwrap().description, "B");
//! assert!(index.find_by_index(&store, 3).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use super::store::{NodeRef, SlideStore};

/// How cached positions react to store mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Entries are dropped as soon as the store's layout version moves.
    #[default]
    Versioned,
    /// Entries are never invalidated. A stale entry can hand back a node
    /// that was removed or now sits at another position.
    Persistent,
}

impl FromStr for CachePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "versioned" => Ok(CachePolicy::Versioned),
            "persistent" => Ok(CachePolicy::Persistent),
            other => Err(format!("unknown cache policy {other:?}")),
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::Versioned => f.write_str("versioned"),
            CachePolicy::Persistent => f.write_str("persistent"),
        }
    }
}

/// Counters describing how lookups were resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to walk the chain
    pub walks: u64,
    /// Node hops taken by all walks
    pub steps: u64,
}

/// Cached position → node lookup.
#[derive(Debug, Default)]
pub struct SlideIndex {
    cache: HashMap<usize, NodeRef>,
    cache_version: Option<u64>,
    policy: CachePolicy,
    stats: LookupStats,
}

impl SlideIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = LookupStats::default();
    }

    /// Number of cached positions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached position.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.cache_version = None;
    }

    /// Returns the node at `position`, or `None` outside `0..store.len()`.
    pub fn find_by_index(&mut self, store: &SlideStore, position: usize) -> Option<NodeRef> {
        if self.policy == CachePolicy::Versioned && self.cache_version != Some(store.version()) {
            if !self.cache.is_empty() {
                trace!(entries = self.cache.len(), "dropping stale position cache");
            }
            self.cache.clear();
            self.cache_version = Some(store.version());
        }

        if let Some(&node) = self.cache.get(&position) {
            self.stats.hits += 1;
            return Some(node);
        }

        if position >= store.len() {
            return None;
        }

        self.stats.walks += 1;
        let found = self.narrow(store, position)?;
        self.cache.insert(position, found);
        Some(found)
    }

    fn narrow(&mut self, store: &SlideStore, position: usize) -> Option<NodeRef> {
        let mut left = store.head()?;
        let mut right = store.tail()?;
        let mut left_index = 0;
        let mut right_index = store.len() - 1;

        while left_index <= right_index {
            if position == left_index {
                return Some(left);
            }
            if position == right_index {
                return Some(right);
            }

            let mid_index = (left_index + right_index) / 2;
            let mid = self.middle_node(store, left, right);

            if mid_index == position {
                return Some(mid);
            } else if mid_index < position {
                left = store.next(mid)?;
                left_index = mid_index + 1;
            } else {
                right = store.prev(mid)?;
                right_index = mid_index.checked_sub(1)?;
            }
        }

        None
    }

    /// Slow/fast walk from `left`, stopping when the fast cursor reaches
    /// `right` or the node just before it.
    fn middle_node(&mut self, store: &SlideStore, left: NodeRef, right: NodeRef) -> NodeRef {
        let mut slow = left;
        let mut fast = left;

        while fast != right {
            let Some(step) = store.next(fast) else { break };
            if step == right {
                break;
            }
            let (Some(jump), Some(next_slow)) = (store.next(step), store.next(slow)) else {
                break;
            };
            slow = next_slow;
            fast = jump;
            self.stats.steps += 3;
        }

        slow
    }
}
