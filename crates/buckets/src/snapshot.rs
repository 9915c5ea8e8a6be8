//! JSON form of a [`PriorityBucketMap`].
//!
//! The wire shape is `{"buckets": {"<priority>": [..], ..}}` with keys in
//! iteration order. Custom comparators are not serialized; a decoded map
//! uses the order the caller asks for (ascending by default).

use indexmap::IndexMap;
use prio_core::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bucket_set::BucketSet;
use crate::map::PriorityBucketMap;
use crate::order::PriorityOrder;

/// Serializable copy of every bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSnapshot<T> {
    #[serde(default = "IndexMap::new")]
    pub buckets: IndexMap<i32, Vec<T>>,
}

impl<T: Clone + PartialEq> PriorityBucketMap<T> {
    pub fn to_snapshot(&self) -> BucketSnapshot<T> {
        BucketSnapshot {
            buckets: self.snapshot().into_iter().collect(),
        }
    }

    /// Rebuild a map from a snapshot. Empty buckets are dropped.
    pub fn from_snapshot(snapshot: BucketSnapshot<T>, order: PriorityOrder) -> Self {
        let mut set = BucketSet::new(order, 0);
        for (priority, items) in snapshot.buckets {
            if !items.is_empty() {
                set.entry(priority).extend(items);
            }
        }
        Self::from_set(set)
    }
}

impl<T: Clone + PartialEq + Serialize> PriorityBucketMap<T> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }
}

impl<T: Clone + PartialEq + DeserializeOwned> PriorityBucketMap<T> {
    /// Decode a map ordered by ascending priority.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_json_with_order(text, PriorityOrder::Ascending)
    }

    pub fn from_json_with_order(text: &str, order: PriorityOrder) -> Result<Self> {
        let snapshot: BucketSnapshot<T> = serde_json::from_str(text)?;
        tracing::debug!(buckets = snapshot.buckets.len(), "Decoded bucket map");
        Ok(Self::from_snapshot(snapshot, order))
    }
}

impl<T: Clone + PartialEq + Serialize> Serialize for PriorityBucketMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_snapshot().serialize(serializer)
    }
}

impl<'de, T: Clone + PartialEq + Deserialize<'de>> Deserialize<'de> for PriorityBucketMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let snapshot = BucketSnapshot::deserialize(deserializer)?;
        Ok(Self::from_snapshot(snapshot, PriorityOrder::Ascending))
    }
}
