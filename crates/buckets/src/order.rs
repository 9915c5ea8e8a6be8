//! Priority key ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use prio_core::OrderKind;

/// Shared comparator over priority keys.
pub type Comparator = Arc<dyn Fn(i32, i32) -> Ordering + Send + Sync>;

/// Iteration order of priority keys.
///
/// The last key in this order is the highest priority, the first the lowest.
/// A custom comparator must be a total order over `i32`.
#[derive(Clone, Default)]
pub enum PriorityOrder {
    #[default]
    Ascending,
    Descending,
    Custom(Comparator),
}

impl PriorityOrder {
    /// Wrap a caller-supplied comparator.
    pub fn custom<F>(cmp: F) -> Self
    where
        F: Fn(i32, i32) -> Ordering + Send + Sync + 'static,
    {
        PriorityOrder::Custom(Arc::new(cmp))
    }

    #[inline]
    pub fn compare(&self, a: i32, b: i32) -> Ordering {
        match self {
            PriorityOrder::Ascending => a.cmp(&b),
            PriorityOrder::Descending => b.cmp(&a),
            PriorityOrder::Custom(cmp) => cmp(a, b),
        }
    }

    /// The serializable kind, if this is not a custom comparator.
    pub fn kind(&self) -> Option<OrderKind> {
        match self {
            PriorityOrder::Ascending => Some(OrderKind::Ascending),
            PriorityOrder::Descending => Some(OrderKind::Descending),
            PriorityOrder::Custom(_) => None,
        }
    }
}

impl From<OrderKind> for PriorityOrder {
    fn from(kind: OrderKind) -> Self {
        match kind {
            OrderKind::Ascending => PriorityOrder::Ascending,
            OrderKind::Descending => PriorityOrder::Descending,
        }
    }
}

impl fmt::Debug for PriorityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityOrder::Ascending => write!(f, "Ascending"),
            PriorityOrder::Descending => write!(f, "Descending"),
            PriorityOrder::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
