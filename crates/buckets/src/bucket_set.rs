//! Unsynchronized bucket storage behind [`crate::PriorityBucketMap`].
//!
//! Buckets live in a vector kept sorted by the active [`PriorityOrder`], so
//! lookup is a binary search and "highest" is always the last entry.

use std::collections::VecDeque;

use tracing::debug;

use crate::order::PriorityOrder;

#[derive(Debug, Clone)]
pub(crate) struct Bucket<T> {
    pub priority: i32,
    pub items: VecDeque<T>,
}

#[derive(Debug, Clone)]
pub(crate) struct BucketSet<T> {
    order: PriorityOrder,
    bucket_capacity: usize,
    buckets: Vec<Bucket<T>>,
}

impl<T> BucketSet<T> {
    pub fn new(order: PriorityOrder, bucket_capacity: usize) -> Self {
        Self {
            order,
            bucket_capacity,
            buckets: Vec::new(),
        }
    }

    /// Empty set with the same ordering and capacity settings.
    pub fn empty_like(&self) -> Self {
        Self::new(self.order.clone(), self.bucket_capacity)
    }

    pub fn order(&self) -> &PriorityOrder {
        &self.order
    }

    fn find(&self, priority: i32) -> Result<usize, usize> {
        self.buckets
            .binary_search_by(|b| self.order.compare(b.priority, priority))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn count(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bucket<T>> {
        self.buckets.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Bucket<T>> {
        self.buckets.iter_mut()
    }

    pub fn contains(&self, priority: i32) -> bool {
        self.find(priority).is_ok()
    }

    pub fn get(&self, priority: i32) -> Option<&VecDeque<T>> {
        self.find(priority).ok().map(|i| &self.buckets[i].items)
    }

    pub fn get_mut(&mut self, priority: i32) -> Option<&mut VecDeque<T>> {
        match self.find(priority) {
            Ok(i) => Some(&mut self.buckets[i].items),
            Err(_) => None,
        }
    }

    pub fn first(&self) -> Option<&Bucket<T>> {
        self.buckets.first()
    }

    pub fn last(&self) -> Option<&Bucket<T>> {
        self.buckets.last()
    }

    /// Bucket for `priority`, created empty if absent.
    ///
    /// Callers must leave it non-empty or call [`Self::prune`] before
    /// releasing the lock.
    pub fn entry(&mut self, priority: i32) -> &mut VecDeque<T> {
        let idx = match self.find(priority) {
            Ok(i) => i,
            Err(i) => {
                debug!(priority, "Creating bucket");
                self.buckets.insert(
                    i,
                    Bucket {
                        priority,
                        items: VecDeque::with_capacity(self.bucket_capacity),
                    },
                );
                i
            }
        };
        &mut self.buckets[idx].items
    }

    /// Insert a whole bucket if the key is absent. Empty input is ignored.
    pub fn insert(&mut self, priority: i32, items: VecDeque<T>) -> bool {
        if items.is_empty() {
            return false;
        }
        match self.find(priority) {
            Ok(_) => false,
            Err(i) => {
                debug!(priority, len = items.len(), "Inserting bucket");
                self.buckets.insert(i, Bucket { priority, items });
                true
            }
        }
    }

    /// Replace (or create) the bucket at `priority`; empty input deletes it.
    pub fn replace(&mut self, priority: i32, items: VecDeque<T>) {
        if items.is_empty() {
            self.remove(priority);
            return;
        }
        match self.find(priority) {
            Ok(i) => self.buckets[i].items = items,
            Err(i) => self.buckets.insert(i, Bucket { priority, items }),
        }
    }

    pub fn remove(&mut self, priority: i32) -> Option<VecDeque<T>> {
        let i = self.find(priority).ok()?;
        debug!(priority, "Removing bucket");
        Some(self.buckets.remove(i).items)
    }

    pub fn remove_last(&mut self) -> Option<Bucket<T>> {
        self.buckets.pop()
    }

    /// Delete the bucket at `priority` if it has become empty.
    pub fn prune(&mut self, priority: i32) {
        if let Ok(i) = self.find(priority) {
            if self.buckets[i].items.is_empty() {
                debug!(priority, "Removing emptied bucket");
                self.buckets.remove(i);
            }
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        for bucket in &mut self.buckets {
            bucket.items.shrink_to_fit();
        }
        self.buckets.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<T>(set: &BucketSet<T>) -> Vec<i32> {
        set.iter().map(|b| b.priority).collect()
    }

    #[test]
    fn entry_keeps_keys_sorted() {
        let mut set = BucketSet::new(PriorityOrder::Ascending, 0);
        set.entry(5).push_back('a');
        set.entry(-2).push_back('b');
        set.entry(3).push_back('c');
        set.entry(5).push_back('d');
        assert_eq!(keys(&set), vec![-2, 3, 5]);
        assert_eq!(set.get(5).unwrap(), &VecDeque::from(vec!['a', 'd']));
        assert_eq!(set.count(), 4);
    }

    #[test]
    fn descending_order_puts_smallest_last() {
        let mut set = BucketSet::new(PriorityOrder::Descending, 0);
        for p in [1, 9, 4] {
            set.entry(p).push_back(p);
        }
        assert_eq!(keys(&set), vec![9, 4, 1]);
        assert_eq!(set.last().unwrap().priority, 1);
    }

    #[test]
    fn insert_refuses_existing_and_empty() {
        let mut set = BucketSet::new(PriorityOrder::Ascending, 0);
        assert!(set.insert(1, VecDeque::from(vec![1])));
        assert!(!set.insert(1, VecDeque::from(vec![2])));
        assert!(!set.insert(2, VecDeque::new()));
        assert_eq!(keys(&set), vec![1]);
    }

    #[test]
    fn prune_only_removes_empty() {
        let mut set = BucketSet::new(PriorityOrder::Ascending, 4);
        set.entry(1);
        set.entry(2).push_back(7);
        set.prune(2);
        assert_eq!(keys(&set), vec![1, 2]);
        set.prune(1);
        assert_eq!(keys(&set), vec![2]);
    }

    #[test]
    fn replace_with_empty_deletes() {
        let mut set = BucketSet::new(PriorityOrder::Ascending, 0);
        set.replace(3, VecDeque::from(vec![1, 2]));
        assert!(set.contains(3));
        set.replace(3, VecDeque::new());
        assert!(set.is_empty());
    }
}
