//! The thread-safe priority bucket map.
//!
//! All state sits behind one [`Mutex`]. Each public method takes the lock
//! once, validates its preconditions, and only then mutates, so a failing
//! call leaves the map exactly as it found it.
//!
//! Callbacks passed to [`PriorityBucketMap::for_each`],
//! [`PriorityBucketMap::split_by_predicate`] and
//! [`PriorityBucketMap::merge_with_custom_logic`] run while the lock is held.
//! They must not call back into the same map: the lock is not reentrant.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use prio_core::{BucketError, MapConfig, Result};
use tracing::{debug, trace, warn};

use crate::bucket_set::BucketSet;
use crate::order::PriorityOrder;

/// Elements grouped into FIFO buckets keyed by integer priority.
///
/// Invariant: a priority is present if and only if its bucket is non-empty.
/// "Highest" is the last priority under the active [`PriorityOrder`].
pub struct PriorityBucketMap<T> {
    inner: Mutex<BucketSet<T>>,
}

fn to_vec<T: Clone>(items: &VecDeque<T>) -> Vec<T> {
    items.iter().cloned().collect()
}

impl<T> PriorityBucketMap<T> {
    /// Create an empty map ordered by ascending priority.
    pub fn new() -> Self {
        Self::with_order(PriorityOrder::Ascending)
    }

    pub fn with_order(order: PriorityOrder) -> Self {
        Self::from_set(BucketSet::new(order, 0))
    }

    /// Create an empty map ordered by a caller-supplied comparator.
    pub fn with_comparator<F>(cmp: F) -> Self
    where
        F: Fn(i32, i32) -> std::cmp::Ordering + Send + Sync + 'static,
    {
        Self::with_order(PriorityOrder::custom(cmp))
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::from_set(BucketSet::new(config.order.into(), config.bucket_capacity))
    }

    pub(crate) fn from_set(set: BucketSet<T>) -> Self {
        Self {
            inner: Mutex::new(set),
        }
    }

    /// Acquire the map lock.
    ///
    /// Caller code (callbacks and `T`'s `PartialEq`) only runs before a
    /// mutation starts, so a lock poisoned by its panic still guards a valid
    /// state.
    fn lock(&self) -> MutexGuard<'_, BucketSet<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Bucket map lock poisoned, recovering state");
            poisoned.into_inner()
        })
    }

    /// The active priority ordering.
    pub fn order(&self) -> PriorityOrder {
        self.lock().order().clone()
    }

    /// Total number of elements across all buckets.
    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Highest present priority, if any.
    pub fn highest_priority(&self) -> Option<i32> {
        self.lock().last().map(|b| b.priority)
    }

    /// Lowest present priority, if any.
    pub fn lowest_priority(&self) -> Option<i32> {
        self.lock().first().map(|b| b.priority)
    }

    /// All present priorities in iteration order.
    pub fn all_priorities(&self) -> Result<Vec<i32>> {
        let state = self.lock();
        if state.is_empty() {
            return Err(BucketError::EmptyMap);
        }
        Ok(state.iter().map(|b| b.priority).collect())
    }

    /// Number of elements stored at `priority` (0 when absent).
    pub fn bucket_len(&self, priority: i32) -> usize {
        self.lock().get(priority).map_or(0, VecDeque::len)
    }

    /// Bucket length per present priority, in iteration order.
    pub fn priority_counts(&self) -> IndexMap<i32, usize> {
        self.lock()
            .iter()
            .map(|b| (b.priority, b.items.len()))
            .collect()
    }

    /// Size of the smallest bucket, or `None` for an empty map.
    pub fn min_bucket_size(&self) -> Option<usize> {
        self.lock().iter().map(|b| b.items.len()).min()
    }

    /// Size of the largest bucket, or `None` for an empty map.
    pub fn max_bucket_size(&self) -> Option<usize> {
        self.lock().iter().map(|b| b.items.len()).max()
    }

    pub fn has_elements_at(&self, priority: i32) -> bool {
        self.lock().get(priority).is_some_and(|b| !b.is_empty())
    }

    /// True iff every listed priority is present.
    pub fn has_elements_at_all(&self, priorities: &[i32]) -> bool {
        let state = self.lock();
        priorities
            .iter()
            .all(|&p| state.get(p).is_some_and(|b| !b.is_empty()))
    }

    /// Reverse element order inside every bucket.
    pub fn reverse_order(&self) {
        let mut state = self.lock();
        for bucket in state.iter_mut() {
            bucket.items.make_contiguous().reverse();
        }
        debug!("Reversed all buckets");
    }

    /// Visit every element in priority order, then insertion order.
    pub fn for_each<F>(&self, mut action: F)
    where
        F: FnMut(&T),
    {
        let state = self.lock();
        state.iter().flat_map(|b| b.items.iter()).for_each(&mut action);
    }

    /// Release spare capacity held by buckets. Contents are unchanged.
    pub fn trim_excess(&self) {
        self.lock().shrink_to_fit();
    }

    /// Remove every element and every priority.
    pub fn clear(&self) {
        self.lock().clear();
        debug!("Cleared bucket map");
    }

    /// Replace the internal state with a fresh empty one. Ordering and
    /// capacity settings are kept.
    pub fn reset(&self) {
        let mut state = self.lock();
        *state = state.empty_like();
        debug!("Reset bucket map");
    }

    /// Move every element of `source` to the back of `destination` and drop
    /// `source`. No-op when `source` is absent or equal to `destination`.
    pub fn move_priority(&self, source: i32, destination: i32) {
        let mut state = self.lock();
        Self::move_bucket(&mut state, source, destination);
    }

    /// Move each listed source into `destination`, in list order. Absent
    /// sources are skipped.
    pub fn merge_priorities(&self, priorities: &[i32], destination: i32) {
        if priorities.is_empty() {
            return;
        }
        let mut state = self.lock();
        for &source in priorities {
            Self::move_bucket(&mut state, source, destination);
        }
    }

    fn move_bucket(state: &mut BucketSet<T>, source: i32, destination: i32) {
        if source == destination {
            return;
        }
        let Some(items) = state.remove(source) else {
            return;
        };
        debug!(source, destination, moved = items.len(), "Moving bucket");
        state.entry(destination).extend(items);
    }
}

impl<T: Clone + PartialEq> PriorityBucketMap<T> {
    /// True iff some bucket holds an element equal to `element`.
    pub fn exists(&self, element: &T) -> bool {
        self.lock().iter().any(|b| b.items.contains(element))
    }

    /// Priority of the first bucket (in iteration order) holding an equal
    /// element. When duplicates span several buckets, the lowest wins.
    pub fn priority_of(&self, element: &T) -> Option<i32> {
        Self::find_priority(&self.lock(), element)
    }

    fn find_priority(state: &BucketSet<T>, element: &T) -> Option<i32> {
        state
            .iter()
            .find(|b| b.items.contains(element))
            .map(|b| b.priority)
    }

    /// Copy of the bucket at `priority`; empty when absent.
    pub fn elements_at(&self, priority: i32) -> Vec<T> {
        self.lock().get(priority).map(to_vec).unwrap_or_default()
    }

    /// Every element, by priority then insertion order.
    pub fn all_elements(&self) -> Vec<T> {
        self.lock()
            .iter()
            .flat_map(|b| b.items.iter().cloned())
            .collect()
    }

    /// Ordered copy of every bucket.
    pub fn snapshot(&self) -> Vec<(i32, Vec<T>)> {
        self.lock()
            .iter()
            .map(|b| (b.priority, to_vec(&b.items)))
            .collect()
    }

    /// Front element of the highest bucket, without removing it.
    pub fn peek_highest(&self) -> Result<T> {
        let state = self.lock();
        let bucket = state.last().ok_or(BucketError::EmptyMap)?;
        bucket.items.front().cloned().ok_or(BucketError::EmptyMap)
    }

    /// Front element of the lowest bucket, without removing it.
    pub fn peek_lowest(&self) -> Result<T> {
        let state = self.lock();
        let bucket = state.first().ok_or(BucketError::EmptyMap)?;
        bucket.items.front().cloned().ok_or(BucketError::EmptyMap)
    }

    pub fn get_at(&self, priority: i32, index: usize) -> Result<T> {
        let state = self.lock();
        if state.is_empty() {
            return Err(BucketError::EmptyMap);
        }
        let bucket = state
            .get(priority)
            .ok_or(BucketError::PriorityNotFound(priority))?;
        bucket
            .get(index)
            .cloned()
            .ok_or(BucketError::IndexOutOfBounds {
                priority,
                index,
                len: bucket.len(),
            })
    }

    /// Number of distinct elements by value equality.
    pub fn unique_count(&self) -> usize {
        let state = self.lock();
        let mut seen: Vec<&T> = Vec::new();
        for item in state.iter().flat_map(|b| b.items.iter()) {
            if !seen.contains(&item) {
                seen.push(item);
            }
        }
        seen.len()
    }

    pub fn contains_duplicates(&self) -> bool {
        let state = self.lock();
        let mut seen: Vec<&T> = Vec::new();
        for item in state.iter().flat_map(|b| b.items.iter()) {
            if seen.contains(&item) {
                return true;
            }
            seen.push(item);
        }
        false
    }

    /// Append `element` to the bucket for `priority`, creating it if needed.
    pub fn add(&self, element: T, priority: i32) {
        let mut state = self.lock();
        state.entry(priority).push_back(element);
        trace!(priority, "Added element");
    }

    /// Insert `items` as a new bucket. Returns `false` without touching the
    /// map when `priority` already exists or `items` is empty.
    pub fn add_bucket(&self, items: Vec<T>, priority: i32) -> bool {
        self.lock().insert(priority, items.into())
    }

    /// Append `element` unless an equal one is already in that bucket.
    /// Returns whether it was appended.
    pub fn add_or_update(&self, element: T, priority: i32) -> bool {
        let mut state = self.lock();
        if state.get(priority).is_some_and(|b| b.contains(&element)) {
            return false;
        }
        state.entry(priority).push_back(element);
        trace!(priority, "Added element");
        true
    }

    /// Union `items` into an existing bucket, or create it verbatim.
    /// Returns how many elements were appended.
    pub fn add_or_update_bucket(&self, items: Vec<T>, priority: i32) -> usize {
        let mut state = self.lock();
        if !state.contains(priority) {
            let len = items.len();
            state.insert(priority, items.into());
            return len;
        }
        let mut fresh: Vec<T> = Vec::new();
        if let Some(bucket) = state.get(priority) {
            for item in items {
                if !bucket.contains(&item) && !fresh.contains(&item) {
                    fresh.push(item);
                }
            }
        }
        let appended = fresh.len();
        state.entry(priority).extend(fresh);
        trace!(priority, appended, "Merged into bucket");
        appended
    }

    /// Pop the front of the highest bucket, dropping the bucket once empty.
    pub fn remove_highest(&self) -> Result<T> {
        let mut state = self.lock();
        let priority = state.last().ok_or(BucketError::EmptyMap)?.priority;
        Self::pop_front(&mut state, priority)
    }

    /// Pop the front of the lowest bucket, dropping the bucket once empty.
    pub fn remove_lowest(&self) -> Result<T> {
        let mut state = self.lock();
        let priority = state.first().ok_or(BucketError::EmptyMap)?.priority;
        Self::pop_front(&mut state, priority)
    }

    fn pop_front(state: &mut BucketSet<T>, priority: i32) -> Result<T> {
        let item = state
            .get_mut(priority)
            .and_then(VecDeque::pop_front)
            .ok_or(BucketError::EmptyMap)?;
        state.prune(priority);
        trace!(priority, "Removed element");
        Ok(item)
    }

    /// Remove and return the whole highest bucket.
    pub fn remove_highest_bucket(&self) -> Result<Vec<T>> {
        let mut state = self.lock();
        let bucket = state.remove_last().ok_or(BucketError::EmptyMap)?;
        debug!(priority = bucket.priority, len = bucket.items.len(), "Removed highest bucket");
        Ok(bucket.items.into())
    }

    pub fn remove_at(&self, priority: i32, index: usize) -> Result<T> {
        let mut state = self.lock();
        if state.is_empty() {
            return Err(BucketError::EmptyMap);
        }
        let bucket = state
            .get_mut(priority)
            .ok_or(BucketError::PriorityNotFound(priority))?;
        let len = bucket.len();
        let item = bucket
            .remove(index)
            .ok_or(BucketError::IndexOutOfBounds { priority, index, len })?;
        state.prune(priority);
        trace!(priority, index, "Removed element");
        Ok(item)
    }

    /// Remove every element equal to `element` from every bucket.
    /// Returns `false` when nothing matched.
    pub fn remove_element(&self, element: &T) -> Result<bool> {
        let mut state = self.lock();
        if state.is_empty() {
            return Err(BucketError::EmptyMap);
        }
        let mut removed = 0;
        let mut remaining: Vec<(i32, VecDeque<T>)> = Vec::new();
        for bucket in state.iter() {
            let kept: VecDeque<T> = bucket
                .items
                .iter()
                .filter(|item| *item != element)
                .cloned()
                .collect();
            removed += bucket.items.len() - kept.len();
            remaining.push((bucket.priority, kept));
        }
        if removed == 0 {
            return Ok(false);
        }
        for (priority, items) in remaining {
            state.replace(priority, items);
        }
        debug!(removed, "Removed element from all buckets");
        Ok(true)
    }

    /// Drop the bucket at `priority`. Returns whether it existed.
    pub fn clear_priority(&self, priority: i32) -> Result<bool> {
        let mut state = self.lock();
        if state.is_empty() {
            return Err(BucketError::EmptyMap);
        }
        Ok(state.remove(priority).is_some())
    }

    /// Move one occurrence of `element` from its current bucket (as reported
    /// by [`Self::priority_of`]) to the back of `new_priority`. Returns the
    /// old priority.
    pub fn update_priority(&self, element: &T, new_priority: i32) -> Result<i32> {
        let mut state = self.lock();
        let old_priority = Self::find_priority(&state, element).ok_or_else(|| {
            BucketError::InvalidState("element does not exist in any bucket".to_string())
        })?;
        let item = state.get_mut(old_priority).and_then(|bucket| {
            let pos = bucket.iter().position(|item| item == element)?;
            bucket.remove(pos)
        });
        let Some(item) = item else {
            return Err(BucketError::InvalidState(format!(
                "element vanished from priority {old_priority}"
            )));
        };
        state.prune(old_priority);
        state.entry(new_priority).push_back(item);
        debug!(old_priority, new_priority, "Updated element priority");
        Ok(old_priority)
    }

    /// For each present source, replace the destination bucket with
    /// `merge_fn(destination, source)` and drop the source.
    ///
    /// Every `merge_fn` call happens before the map is touched, so a panic
    /// inside it leaves the map unchanged. An empty merge result removes the
    /// destination bucket.
    pub fn merge_with_custom_logic<F>(&self, priorities: &[i32], destination: i32, mut merge_fn: F)
    where
        F: FnMut(Vec<T>, Vec<T>) -> Vec<T>,
    {
        let mut state = self.lock();
        let mut merged = state.get(destination).map(to_vec).unwrap_or_default();
        let mut consumed: Vec<i32> = Vec::new();
        for &source in priorities {
            if source == destination || consumed.contains(&source) {
                continue;
            }
            if let Some(incoming) = state.get(source) {
                merged = merge_fn(merged, to_vec(incoming));
                consumed.push(source);
            }
        }
        if consumed.is_empty() {
            return;
        }
        for source in &consumed {
            state.remove(*source);
        }
        debug!(?consumed, destination, len = merged.len(), "Merged buckets with custom logic");
        state.replace(destination, merged.into());
    }

    /// Partition into (matching, non-matching) maps, keeping priorities and
    /// relative order. Buckets with no elements on one side are omitted there.
    pub fn split_by_predicate<F>(&self, mut predicate: F) -> (Self, Self)
    where
        F: FnMut(&T) -> bool,
    {
        let state = self.lock();
        let mut matching = state.empty_like();
        let mut rest = state.empty_like();
        for bucket in state.iter() {
            let (yes, no): (VecDeque<T>, VecDeque<T>) =
                bucket.items.iter().cloned().partition(|item| predicate(item));
            matching.insert(bucket.priority, yes);
            rest.insert(bucket.priority, no);
        }
        debug!(
            matching = matching.count(),
            rest = rest.count(),
            "Split bucket map"
        );
        (Self::from_set(matching), Self::from_set(rest))
    }

    /// Build a map pairing `priorities[i]` with `source_buckets[i]`.
    ///
    /// Missing indices contribute nothing. Repeated priorities concatenate
    /// in list order. Fails when there are more priorities than buckets.
    pub fn merge_static_structures(
        mut source_buckets: HashMap<usize, Vec<T>>,
        priorities: &[i32],
    ) -> Result<Self> {
        if priorities.len() > source_buckets.len() {
            return Err(BucketError::InvalidState(format!(
                "{} priorities for {} buckets",
                priorities.len(),
                source_buckets.len()
            )));
        }
        let mut set = BucketSet::new(PriorityOrder::Ascending, 0);
        for (index, &priority) in priorities.iter().enumerate() {
            let items = source_buckets.remove(&index).unwrap_or_default();
            if !items.is_empty() {
                set.entry(priority).extend(items);
            }
        }
        Ok(Self::from_set(set))
    }
}

impl<T> Default for PriorityBucketMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy: the clone owns new buckets and is mutated independently.
impl<T: Clone> Clone for PriorityBucketMap<T> {
    fn clone(&self) -> Self {
        let state = self.lock();
        Self::from_set((*state).clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for PriorityBucketMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_map()
            .entries(state.iter().map(|b| (b.priority, &b.items)))
            .finish()
    }
}

impl<T> FromIterator<(i32, T)> for PriorityBucketMap<T> {
    fn from_iter<I: IntoIterator<Item = (i32, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<T> Extend<(i32, T)> for PriorityBucketMap<T> {
    fn extend<I: IntoIterator<Item = (i32, T)>>(&mut self, iter: I) {
        let state = self
            .inner
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (priority, element) in iter {
            state.entry(priority).push_back(element);
        }
    }
}
