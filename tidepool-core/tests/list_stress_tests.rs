//! Cross-strategy stress tests.
//!
//! Every synchronization discipline runs the same harness: the semantics
//! must be indistinguishable, only the blocking behavior differs.

use rand::seq::SliceRandom;
use rand::Rng;

use tidepool_core::common_tests::ordered_set_core_tests::*;
use tidepool_core::common_tests::ordered_set_stress_tests::*;
use tidepool_core::{DeferredGuard, HandOverHandList, HarrisList, LazyList};

type HohList = HandOverHandList<i32>;
type OptimisticList = LazyList<i32, DeferredGuard>;
type LockFreeList = HarrisList<i32, DeferredGuard>;

/// 8 threads, 1000 distinct random keys each, drawn from disjoint ranges.
fn random_disjoint_blocks() -> Vec<Vec<i32>> {
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|t| {
            let base = t * 100_000;
            let mut block = Vec::with_capacity(1000);
            let mut seen = std::collections::HashSet::new();
            while block.len() < 1000 {
                let key = base + rng.gen_range(0..100_000);
                if seen.insert(key) {
                    block.push(key);
                }
            }
            block.shuffle(&mut rng);
            block
        })
        .collect()
}

mod hand_over_hand {
    use super::*;

    #[test]
    fn basic() {
        test_basic_operations(&HohList::default());
    }

    #[test]
    fn deterministic_scenario() {
        test_deterministic_scenario::<HohList>();
    }

    #[test]
    fn sequential() {
        test_sequential_operations::<HohList>();
    }

    #[test]
    fn sorted_snapshot() {
        test_sorted_snapshot::<HohList>();
    }

    #[test]
    fn concurrent_inserts() {
        test_concurrent_operations::<HohList>();
    }

    #[test]
    fn concurrent_mixed() {
        test_concurrent_mixed_operations::<HohList>();
    }

    #[test]
    fn high_contention() {
        test_high_contention::<HohList>();
    }

    #[test]
    fn empty_transitions() {
        test_is_empty::<HohList>();
    }

    #[test]
    fn exactly_once_insertion() {
        test_exactly_once_insertion::<HohList>();
    }

    #[test]
    fn exactly_once_removal() {
        test_exactly_once_removal::<HohList>();
    }

    #[test]
    fn disjoint_random_blocks() {
        test_disjoint_block_inserts::<HohList>(super::random_disjoint_blocks());
    }

    #[test]
    fn churn() {
        test_insert_remove_churn::<HohList>();
    }

    #[test]
    fn reads_during_modifications() {
        test_reads_during_modifications::<HohList>();
    }

    #[test]
    fn memory_ordering() {
        test_memory_ordering::<HohList>();
    }
}

mod lazy {
    use super::*;

    #[test]
    fn basic() {
        test_basic_operations(&OptimisticList::default());
    }

    #[test]
    fn deterministic_scenario() {
        test_deterministic_scenario::<OptimisticList>();
    }

    #[test]
    fn sequential() {
        test_sequential_operations::<OptimisticList>();
    }

    #[test]
    fn sorted_snapshot() {
        test_sorted_snapshot::<OptimisticList>();
    }

    #[test]
    fn concurrent_inserts() {
        test_concurrent_operations::<OptimisticList>();
    }

    #[test]
    fn concurrent_mixed() {
        test_concurrent_mixed_operations::<OptimisticList>();
    }

    #[test]
    fn high_contention() {
        test_high_contention::<OptimisticList>();
    }

    #[test]
    fn empty_transitions() {
        test_is_empty::<OptimisticList>();
    }

    #[test]
    fn exactly_once_insertion() {
        test_exactly_once_insertion::<OptimisticList>();
    }

    #[test]
    fn exactly_once_removal() {
        test_exactly_once_removal::<OptimisticList>();
    }

    #[test]
    fn disjoint_random_blocks() {
        test_disjoint_block_inserts::<OptimisticList>(super::random_disjoint_blocks());
    }

    #[test]
    fn churn() {
        test_insert_remove_churn::<OptimisticList>();
    }

    #[test]
    fn reads_during_modifications() {
        test_reads_during_modifications::<OptimisticList>();
    }

    #[test]
    fn memory_ordering() {
        test_memory_ordering::<OptimisticList>();
    }
}

mod lock_free {
    use super::*;

    #[test]
    fn basic() {
        test_basic_operations(&LockFreeList::default());
    }

    #[test]
    fn deterministic_scenario() {
        test_deterministic_scenario::<LockFreeList>();
    }

    #[test]
    fn sequential() {
        test_sequential_operations::<LockFreeList>();
    }

    #[test]
    fn sorted_snapshot() {
        test_sorted_snapshot::<LockFreeList>();
    }

    #[test]
    fn concurrent_inserts() {
        test_concurrent_operations::<LockFreeList>();
    }

    #[test]
    fn concurrent_mixed() {
        test_concurrent_mixed_operations::<LockFreeList>();
    }

    #[test]
    fn high_contention() {
        test_high_contention::<LockFreeList>();
    }

    #[test]
    fn empty_transitions() {
        test_is_empty::<LockFreeList>();
    }

    #[test]
    fn exactly_once_insertion() {
        test_exactly_once_insertion::<LockFreeList>();
    }

    #[test]
    fn exactly_once_removal() {
        test_exactly_once_removal::<LockFreeList>();
    }

    #[test]
    fn disjoint_random_blocks() {
        test_disjoint_block_inserts::<LockFreeList>(super::random_disjoint_blocks());
    }

    #[test]
    fn churn() {
        test_insert_remove_churn::<LockFreeList>();
    }

    #[test]
    fn reads_during_modifications() {
        test_reads_during_modifications::<LockFreeList>();
    }

    #[test]
    fn memory_ordering() {
        test_memory_ordering::<LockFreeList>();
    }
}
