//! Property-based invariant tests for the observable combinators.
//!
//! 1. `map` and `filter` agree with the same operations on an iterator
//! 2. `skip(n)` drops exactly the first `n` values of a connection
//! 3. `flat_map_iter` preserves order and total length
//! 4. zip emits nothing until both sides fired, then one pair per value
//! 5. Subscriber count tracks subscribe/unsubscribe sequences
//! 6. RxRef emits exactly once per value change
//! 7. ReplaySubject replays every accepted value to a late subscriber

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rivulet::{ReplaySubject, RxRef, Source, Subject};

// ── Helpers ──────────────────────────────────────────────────────────

fn recorder<A>() -> (Arc<Mutex<Vec<A>>>, impl Fn(&A) + Send + Sync + 'static)
where
    A: Clone + Send + Sync + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    (seen, move |a: &A| seen_clone.lock().unwrap().push(a.clone()))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. map / filter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn map_filter_match_iterator(values in proptest::collection::vec(any::<i32>(), 0..=64)) {
        let subject = Subject::new();
        let (seen, record) = recorder::<i32>();
        let _subscription = subject
            .filter(|n: &i32| n % 3 == 0)
            .map(|n| n.wrapping_mul(2))
            .subscribe(record);

        for v in &values {
            subject.push(*v).unwrap();
        }
        let expected: Vec<i32> = values
            .iter()
            .filter(|n| *n % 3 == 0)
            .map(|n| n.wrapping_mul(2))
            .collect();
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. skip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn skip_drops_prefix(
        values in proptest::collection::vec(any::<u8>(), 0..=32),
        n in 0usize..40,
    ) {
        let subject = Subject::new();
        let (seen, record) = recorder::<u8>();
        let _subscription = subject.skip(n).subscribe(record);

        for v in &values {
            subject.push(*v).unwrap();
        }
        let expected: Vec<u8> = values.iter().copied().skip(n).collect();
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. flat_map_iter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flat_map_iter_preserves_order(values in proptest::collection::vec(0usize..8, 0..=16)) {
        let subject = Subject::new();
        let (seen, record) = recorder::<usize>();
        let _subscription = subject.flat_map_iter(|n: &usize| 0..*n).subscribe(record);

        for v in &values {
            subject.push(*v).unwrap();
        }
        let expected: Vec<usize> = values.iter().flat_map(|n| 0..*n).collect();
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. zip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zip_emits_after_both_fired(sides in proptest::collection::vec(any::<bool>(), 0..=32)) {
        let (left, right) = (Subject::new(), Subject::new());
        let (seen, record) = recorder::<(usize, usize)>();
        let _subscription = left.zip(&right).subscribe(record);

        let (mut left_fired, mut right_fired) = (false, false);
        let mut expected = 0;
        for (i, is_left) in sides.iter().enumerate() {
            if *is_left {
                left.push(i).unwrap();
                left_fired = true;
            } else {
                right.push(i).unwrap();
                right_fired = true;
            }
            if left_fired && right_fired {
                expected += 1;
            }
        }
        prop_assert_eq!(seen.lock().unwrap().len(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Subscriber count
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subscriber_count_tracks_operations(ops in proptest::collection::vec(any::<bool>(), 0..=48)) {
        let subject = Subject::<()>::new();
        let mut live = Vec::new();
        for subscribe in ops {
            if subscribe || live.is_empty() {
                live.push(subject.subscribe(|_| {}));
            } else {
                let subscription = live.remove(0);
                prop_assert!(subscription.unsubscribe());
                prop_assert!(!subscription.unsubscribe());
            }
            prop_assert_eq!(subject.subscribers(), live.len());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. RxRef change detection
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rx_ref_emits_once_per_change(writes in proptest::collection::vec(0u8..4, 0..=32)) {
        let rx_ref = RxRef::new(0u8);
        let (seen, record) = recorder::<u8>();
        let _subscription = rx_ref.subscribe(record);

        let mut expected = vec![0u8];
        for w in writes {
            let changed = rx_ref.set(w);
            prop_assert_eq!(changed, expected.last() != Some(&w));
            if changed {
                expected.push(w);
            }
        }
        prop_assert_eq!(seen.lock().unwrap().clone(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. ReplaySubject
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn replay_delivers_full_log(values in proptest::collection::vec(any::<i64>(), 0..=32)) {
        let subject = ReplaySubject::new();
        for v in &values {
            subject.push(*v).unwrap();
        }
        let (seen, record) = recorder::<i64>();
        let _subscription = subject.subscribe(record);
        prop_assert_eq!(seen.lock().unwrap().clone(), values);
    }
}
