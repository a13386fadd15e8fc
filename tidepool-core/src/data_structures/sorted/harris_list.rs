use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::data_structures::{MarkedPtr, OrderedSet};
use crate::guard::Guard;

type NodePtr<T> = *mut Node<T>;

// =============================================================================
// LOCK-FREE LIST (Harris's two-phase deletion)
// =============================================================================
//
// No locks anywhere. The mark bit on a node's own successor reference says
// the NODE is logically deleted:
//
//   [HEAD]──►[ 10 ]──►[ 20 ]─╳─►[ 30 ]──►[TAIL]──►NULL
//                            │
//                         (marked: 20 is deleted, still reachable)
//
// Phase 1 - LOGICAL DELETE: CAS curr.next from succ to (succ | MARK).
// Phase 2 - PHYSICAL UNLINK: CAS pred.next from curr to succ.
//
// Phase 2 is performed by whichever thread notices the mark: every `search`
// snips marked nodes it passes, and `remove` itself loops until its victim
// is confirmed unlinked, because a node must be unreachable before it can
// be handed to the reclamation guard.
//
// CAS failures mean another thread changed the neighborhood; `search`
// restarts from the head. Insertion cannot accidentally link behind a
// deleted predecessor: the mark lives in the same atomic word the insert
// CAS covers, so a marked pred.next never equals the expected clean
// pointer.

struct Node<T> {
    /// `None` marks a sentinel (head, or tail reading as +inf).
    data: Option<T>,
    /// Successor reference; the low bit carries this node's deletion mark.
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn new(data: Option<T>, next: NodePtr<T>) -> NodePtr<T> {
        Box::into_raw(Box::new(Node {
            data,
            next: AtomicPtr::new(next),
        }))
    }

    /// # Safety
    /// `ptr` must come from `Node::new`, be unmasked, and not be freed
    /// twice.
    unsafe fn dealloc(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    fn key(&self) -> &T {
        self.data
            .as_ref()
            .expect("Cannot get key from sentinel node")
    }

    /// Load next pointer (Acquire ordering)
    #[inline]
    fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    /// Store next pointer (Release ordering)
    #[inline]
    fn set_next(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::Release)
    }

    /// CAS next pointer (Release/Relaxed ordering)
    #[inline]
    fn cas_next(&self, expected: NodePtr<T>, new: NodePtr<T>) -> Result<NodePtr<T>, NodePtr<T>> {
        self.next
            .compare_exchange(expected, new, Ordering::Release, Ordering::Relaxed)
    }

    /// Weak CAS next pointer, for call sites that retry in a loop anyway.
    #[inline]
    fn cas_next_weak(
        &self,
        expected: NodePtr<T>,
        new: NodePtr<T>,
    ) -> Result<NodePtr<T>, NodePtr<T>> {
        self.next
            .compare_exchange_weak(expected, new, Ordering::Release, Ordering::Relaxed)
    }
}

impl<T: Ord> Node<T> {
    fn precedes(&self, key: &T) -> bool {
        match &self.data {
            Some(k) => k < key,
            None => false,
        }
    }

    fn key_equals(&self, key: &T) -> bool {
        match &self.data {
            Some(k) => k == key,
            None => false,
        }
    }
}

/// Concurrent sorted list with lock-free synchronization.
///
/// All operations are lock-free: some thread always makes progress, though
/// an individual thread can retry indefinitely under adversarial
/// contention. Unlinked nodes are reclaimed through `G`.
pub struct HarrisList<T, G: Guard> {
    head: AtomicPtr<Node<T>>,
    /// Deferred destruction of unlinked nodes; freed when it drops.
    guard: G,
}

unsafe impl<T: Send, G: Guard> Send for HarrisList<T, G> {}
unsafe impl<T: Send + Sync, G: Guard> Sync for HarrisList<T, G> {}

impl<T, G: Guard> HarrisList<T, G> {
    /// Creates a list containing only the two sentinels.
    pub fn new() -> Self {
        let tail = Node::new(None, ptr::null_mut());
        let head = Node::new(None, tail);
        HarrisList {
            head: AtomicPtr::new(head),
            guard: G::default(),
        }
    }

    /// Visit every live (unmarked) key in order.
    fn for_each_key<F: FnMut(&T)>(&self, mut f: F) {
        let _guard = G::pin();
        unsafe {
            let head = self.head.load(Ordering::Acquire);
            let mut curr = (*head).get_next();
            loop {
                let node = MarkedPtr::unmask(curr);
                match (*node).data.as_ref() {
                    None => break, // tail
                    Some(k) => {
                        let next = (*node).get_next();
                        if !MarkedPtr::new(next).is_marked() {
                            f(k);
                        }
                        curr = next;
                    }
                }
            }
        }
    }
}

impl<T: Ord, G: Guard> HarrisList<T, G> {
    /// Traverse to the (predecessor, current) pair bracketing `key`.
    ///
    /// `current` is the first unmarked node whose key is >= `key`
    /// (possibly the tail). Marked nodes encountered on the way are
    /// physically unlinked; if that snip CAS fails the whole search
    /// restarts from the head, because the predecessor's neighborhood
    /// changed under us.
    fn search(&self, key: &T) -> (NodePtr<T>, NodePtr<T>) {
        'retry: loop {
            let mut pred = self.head.load(Ordering::Acquire);
            let mut curr = unsafe { (*pred).get_next() };

            loop {
                let next = unsafe { (*curr).get_next() };
                let next_marked = MarkedPtr::new(next);

                if next_marked.is_marked() {
                    // curr is logically deleted - snip it out.
                    let snip = unsafe { (*pred).cas_next(curr, next_marked.as_ptr()) };
                    if snip.is_err() {
                        continue 'retry;
                    }
                    curr = next_marked.as_ptr();
                } else {
                    unsafe {
                        if !(*curr).precedes(key) {
                            return (pred, curr);
                        }
                    }
                    pred = curr;
                    curr = next;
                }
            }
        }
    }

    /// Physically unlink the marked `victim`, looping until it is
    /// confirmed unreachable.
    ///
    /// Required before the victim can be deferred for reclamation: a node
    /// that is still reachable could be handed out by a later traversal
    /// after it was freed.
    ///
    /// # Safety
    /// - `victim` must be a valid, marked, non-sentinel node
    /// - `replacement` must be `victim`'s unmasked successor
    /// - `pred` must be a valid node that pointed at `victim` when the
    ///   caller last looked
    unsafe fn unlink_marked(
        &self,
        mut pred: NodePtr<T>,
        victim: NodePtr<T>,
        replacement: NodePtr<T>,
    ) {
        loop {
            if unsafe { (*pred).cas_next(victim, replacement) }.is_ok() {
                return;
            }

            // pred no longer points at victim: either another thread
            // already unlinked it, or the neighborhood changed. Rescan
            // from the head to find victim's current predecessor.
            pred = self.head.load(Ordering::Acquire);
            let mut curr = unsafe { (*pred).get_next() };

            loop {
                let node = MarkedPtr::unmask(curr);
                if node == victim {
                    break; // retry the unlink CAS with this pred
                }

                unsafe {
                    match (*node).data.as_ref() {
                        // Reached the tail, or walked past victim's slot:
                        // another thread finished the unlink.
                        None => return,
                        Some(k) if k > (*victim).key() => return,
                        // An equal key belongs to a concurrently inserted
                        // node; keep walking.
                        _ => {}
                    }

                    let next = (*node).get_next();
                    let next_marked = MarkedPtr::new(next);

                    if next_marked.is_marked() {
                        // curr is itself deleted; snip it so pred stays
                        // usable for the unlink CAS.
                        if (*pred).cas_next(node, next_marked.as_ptr()).is_err() {
                            pred = self.head.load(Ordering::Acquire);
                            curr = (*pred).get_next();
                            continue;
                        }
                        curr = next_marked.as_ptr();
                        continue;
                    }

                    pred = node;
                    curr = next;
                }
            }
        }
    }
}

impl<T: Ord, G: Guard> OrderedSet<T> for HarrisList<T, G> {
    fn contains(&self, key: &T) -> bool {
        let _guard = G::pin();
        let (_pred, curr) = self.search(key);
        unsafe { (*curr).key_equals(key) && !MarkedPtr::new((*curr).get_next()).is_marked() }
    }

    fn add(&self, key: T) -> bool {
        let _guard = G::pin();
        let new_node = Node::new(Some(key), ptr::null_mut());

        loop {
            let key = unsafe { (*new_node).key() };
            let (pred, curr) = self.search(key);

            unsafe {
                if (*curr).key_equals(key) {
                    Node::dealloc(new_node);
                    return false;
                }

                (*new_node).set_next(curr);

                // Linearization point on success. Fails if anything was
                // inserted, deleted, or marked in the window - retry.
                if (*pred).cas_next_weak(curr, new_node).is_ok() {
                    return true;
                }
            }
        }
    }

    fn remove(&self, key: &T) -> bool {
        let _guard = G::pin();
        loop {
            let (pred, curr) = self.search(key);

            unsafe {
                if !(*curr).key_equals(key) {
                    return false;
                }

                let next = (*curr).get_next();
                let next_marked = MarkedPtr::new(next);
                if next_marked.is_marked() {
                    // Another thread won the logical delete; retry until
                    // the key reads as absent.
                    continue;
                }

                // Phase 1, the linearization point: mark curr's own
                // successor reference.
                if (*curr)
                    .cas_next_weak(next, next_marked.with_mark().as_raw())
                    .is_err()
                {
                    continue;
                }

                // Phase 2: guarantee the unlink, then hand the node to
                // the guard.
                self.unlink_marked(pred, curr, next_marked.as_ptr());
                self.guard.defer_destroy(curr, Node::dealloc);
                return true;
            }
        }
    }

    fn len(&self) -> usize {
        let mut count = 0;
        self.for_each_key(|_| count += 1);
        count
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut keys = Vec::new();
        self.for_each_key(|k| keys.push(k.clone()));
        keys
    }
}

impl<T, G: Guard> Default for HarrisList<T, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G: Guard> Drop for HarrisList<T, G> {
    fn drop(&mut self) {
        let mut curr = self.head.load(Ordering::Acquire);
        while !curr.is_null() {
            unsafe {
                let node = MarkedPtr::unmask(curr);
                let next = (*node).get_next();

                // Every removal completes its physical unlink before
                // returning, so a reachable marked node at drop time means
                // the protocol was violated somewhere.
                if MarkedPtr::new(next).is_marked() {
                    panic!(
                        "INVARIANT VIOLATION: delete-marked node still reachable at drop time"
                    );
                }

                Node::dealloc(node);
                curr = next;
            }
        }
    }
}

impl<T: fmt::Debug, G: Guard> fmt::Debug for HarrisList<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.for_each_key(|k| {
            list.entry(k);
        });
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::DeferredGuard;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    type TestList = HarrisList<i32, DeferredGuard>;

    #[test]
    fn test_single_thread_scenario() {
        let list = TestList::new();

        assert!(list.add(5));
        assert!(!list.add(5));
        assert!(list.contains(&5));
        assert!(list.remove(&5));
        assert!(!list.contains(&5));
        assert!(!list.remove(&5));
    }

    #[test]
    fn test_keeps_sorted_order() {
        let list = TestList::new();

        for key in [42, 7, 19, 3, 25] {
            assert!(list.add(key));
        }
        assert!(list.remove(&7));

        assert_eq!(list.to_vec(), vec![3, 19, 25, 42]);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_removed_key_never_reappears() {
        let list = TestList::new();

        for i in 0..100 {
            list.add(i);
        }
        for i in (0..100).step_by(2) {
            assert!(list.remove(&i));
        }
        for i in 0..100 {
            assert_eq!(list.contains(&i), i % 2 == 1, "key {}", i);
        }
    }

    #[test]
    fn test_concurrent_remove_same_key() {
        let list: Arc<TestList> = Arc::new(HarrisList::new());
        list.add(42);

        let wins = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let list = Arc::clone(&list);
                let wins = Arc::clone(&wins);
                thread::spawn(move || {
                    if list.remove(&42) {
                        wins.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::Relaxed), 1);
        assert!(!list.contains(&42));
    }

    #[test]
    fn test_concurrent_delete_insert() {
        let list: Arc<TestList> = Arc::new(HarrisList::new());
        let num_threads = 4;
        let operations_per_thread = 100;

        let handles: Vec<_> = (0..num_threads)
            .map(|thread_id| {
                let list = Arc::clone(&list);
                thread::spawn(move || {
                    for i in 0..operations_per_thread {
                        let key = thread_id * operations_per_thread + i;
                        list.add(key);

                        if i % 10 == 0 && key > 0 {
                            list.remove(&(key - 1));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let keys = list.to_vec();
        for window in keys.windows(2) {
            assert!(window[0] < window[1], "list must stay strictly sorted");
        }
    }

    #[test]
    fn test_search_excises_marked_nodes() {
        let list = TestList::new();

        for i in 0..100 {
            list.add(i);
        }
        assert!(list.remove(&50));

        // Any later operation traversing the region must not see 50 and
        // must still find its neighbors.
        assert!(!list.contains(&50));
        assert!(list.contains(&49));
        assert!(list.contains(&51));
        assert_eq!(list.len(), 99);
    }
}
