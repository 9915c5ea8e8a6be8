//! Randomized invariant checks.

use proptest::prelude::*;

use prio_buckets::PriorityBucketMap;

#[derive(Debug, Clone)]
enum Op {
    Add(u8, i32),
    AddOrUpdate(u8, i32),
    AddBucket(Vec<u8>, i32),
    AddOrUpdateBucket(Vec<u8>, i32),
    RemoveHighest,
    RemoveLowest,
    RemoveHighestBucket,
    RemoveAt(i32, usize),
    RemoveElement(u8),
    ClearPriority(i32),
    UpdatePriority(u8, i32),
    Move(i32, i32),
    Merge(Vec<i32>, i32),
    MergeCustom(Vec<i32>, i32, bool),
    Reverse,
    Clear,
    Reset,
}

fn priority() -> impl Strategy<Value = i32> {
    -3i32..6
}

fn element() -> impl Strategy<Value = u8> {
    0u8..8
}

fn elements() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(element(), 0..4)
}

fn priorities() -> impl Strategy<Value = Vec<i32>> {
    proptest::collection::vec(priority(), 0..4)
}

fn element_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (element(), priority()).prop_map(|(e, p)| Op::Add(e, p)),
        1 => (element(), priority()).prop_map(|(e, p)| Op::AddOrUpdate(e, p)),
        2 => Just(Op::RemoveHighest),
        1 => Just(Op::RemoveLowest),
        1 => (priority(), 0usize..4).prop_map(|(p, i)| Op::RemoveAt(p, i)),
        1 => element().prop_map(Op::RemoveElement),
        1 => (element(), priority()).prop_map(|(e, p)| Op::UpdatePriority(e, p)),
    ]
}

fn bucket_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (elements(), priority()).prop_map(|(e, p)| Op::AddBucket(e, p)),
        2 => (elements(), priority()).prop_map(|(e, p)| Op::AddOrUpdateBucket(e, p)),
        1 => Just(Op::RemoveHighestBucket),
        1 => priority().prop_map(Op::ClearPriority),
        1 => (priority(), priority()).prop_map(|(a, b)| Op::Move(a, b)),
        1 => (priorities(), priority()).prop_map(|(s, d)| Op::Merge(s, d)),
        2 => (priorities(), priority(), any::<bool>()).prop_map(|(s, d, k)| Op::MergeCustom(s, d, k)),
        1 => Just(Op::Reverse),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => element_op(),
        2 => bucket_op(),
        1 => prop_oneof![Just(Op::Clear), Just(Op::Reset)],
    ]
}

fn apply(map: &PriorityBucketMap<u8>, op: &Op) {
    match op {
        Op::Add(e, p) => map.add(*e, *p),
        Op::AddOrUpdate(e, p) => {
            map.add_or_update(*e, *p);
        }
        Op::AddBucket(items, p) => {
            map.add_bucket(items.clone(), *p);
        }
        Op::AddOrUpdateBucket(items, p) => {
            map.add_or_update_bucket(items.clone(), *p);
        }
        Op::RemoveHighest => {
            let _ = map.remove_highest();
        }
        Op::RemoveLowest => {
            let _ = map.remove_lowest();
        }
        Op::RemoveHighestBucket => {
            let _ = map.remove_highest_bucket();
        }
        Op::RemoveAt(p, i) => {
            let _ = map.remove_at(*p, *i);
        }
        Op::RemoveElement(e) => {
            let _ = map.remove_element(e);
        }
        Op::ClearPriority(p) => {
            let _ = map.clear_priority(*p);
        }
        Op::UpdatePriority(e, p) => {
            let _ = map.update_priority(e, *p);
        }
        Op::Move(s, d) => map.move_priority(*s, *d),
        Op::Merge(s, d) => map.merge_priorities(s, *d),
        // `keep` = false drops everything, exercising the empty-result path.
        Op::MergeCustom(s, d, keep) => map.merge_with_custom_logic(s, *d, |mut existing, incoming| {
            if *keep {
                existing.extend(incoming);
                existing
            } else {
                Vec::new()
            }
        }),
        Op::Reverse => map.reverse_order(),
        Op::Clear => map.clear(),
        Op::Reset => map.reset(),
    }
}

proptest! {
    #[test]
    fn no_empty_bucket_is_ever_visible(ops in proptest::collection::vec(op(), 0..60)) {
        let map = PriorityBucketMap::new();
        for op in &ops {
            apply(&map, op);
            let snapshot = map.snapshot();
            prop_assert!(snapshot.iter().all(|(_, bucket)| !bucket.is_empty()));
            prop_assert_eq!(map.is_empty(), snapshot.is_empty());
            let total: usize = snapshot.iter().map(|(_, b)| b.len()).sum();
            prop_assert_eq!(map.count(), total);
            let keys: Vec<i32> = snapshot.iter().map(|(p, _)| *p).collect();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn adds_group_by_priority(adds in proptest::collection::vec((0u8..50, -5i32..5), 0..40)) {
        let map = PriorityBucketMap::new();
        for (e, p) in &adds {
            map.add(*e, *p);
        }
        prop_assert_eq!(map.count(), adds.len());

        let mut expected = adds.clone();
        expected.sort_by_key(|(_, p)| *p);
        let expected: Vec<u8> = expected.into_iter().map(|(e, _)| e).collect();
        prop_assert_eq!(map.all_elements(), expected);
    }

    #[test]
    fn priority_of_matches_first_bucket(adds in proptest::collection::vec((0u8..6, -5i32..5), 1..30)) {
        let map = PriorityBucketMap::new();
        for (e, p) in &adds {
            map.add(*e, *p);
        }
        for e in 0u8..6 {
            let lowest = adds.iter().filter(|(x, _)| *x == e).map(|(_, p)| *p).min();
            prop_assert_eq!(map.priority_of(&e), lowest);
            prop_assert_eq!(map.exists(&e), lowest.is_some());
        }
    }
}
