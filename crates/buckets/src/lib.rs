//! Priority-bucketed collection.
//!
//! [`PriorityBucketMap`] associates elements with integer priorities and
//! keeps one FIFO bucket per present priority. Every public operation runs
//! under a single coarse lock, so each call is atomic with respect to every
//! other call on the same map.

mod bucket_set;
pub mod map;
pub mod order;
pub mod snapshot;

pub use map::PriorityBucketMap;
pub use order::PriorityOrder;
pub use prio_core::{BucketError, MapConfig, OrderKind, Result};
pub use snapshot::BucketSnapshot;
