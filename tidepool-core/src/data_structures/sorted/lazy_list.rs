use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use crate::data_structures::OrderedSet;
use crate::guard::Guard;
use crate::lock::{RawLock, SpinLock};

type NodePtr<T, L> = *mut Node<T, L>;

// =============================================================================
// LAZY (OPTIMISTIC) LIST
// =============================================================================
//
// Readers never lock: `contains` walks raw successor loads and decides
// presence from (key match, not marked). Mutators traverse the same way,
// then lock only the two nodes bracketing the affected position and
// VALIDATE before committing:
//
//   validate(pred, curr) := !pred.marked && !curr.marked && pred.next == curr
//
// Validation failing means another thread mutated the window between the
// lock-free traversal and the lock acquisition; the operation releases both
// locks and restarts from the head.
//
// Removal is two-step inside one critical section: set `marked` first, then
// unlink. A lock-free reader that already reached the node sees the mark
// and reports it absent; a later locked mutator sees it during validation
// and restarts instead of operating on a doomed node.
//
// An unlinked node may still be referenced by in-flight lock-free readers,
// so it is handed to the guard rather than freed in place.

struct Node<T, L: RawLock> {
    /// `None` marks a sentinel (head, or tail reading as +inf).
    data: Option<T>,
    next: AtomicPtr<Node<T, L>>,
    /// True once logically removed. Written only while holding `lock`.
    marked: AtomicBool,
    lock: L,
}

impl<T, L: RawLock> Node<T, L> {
    fn new(data: Option<T>, next: NodePtr<T, L>) -> NodePtr<T, L> {
        Box::into_raw(Box::new(Node {
            data,
            next: AtomicPtr::new(next),
            marked: AtomicBool::new(false),
            lock: L::default(),
        }))
    }

    /// # Safety
    /// `ptr` must come from `Node::new` and not be freed twice.
    unsafe fn dealloc(ptr: *mut Self) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    fn key(&self) -> &T {
        self.data
            .as_ref()
            .expect("Cannot get key from sentinel node")
    }
}

impl<T: Ord, L: RawLock> Node<T, L> {
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

/// Concurrent sorted list using lazy synchronization.
///
/// `contains` is wait-free; `add`/`remove` are optimistic and may retry
/// under contention, but every retry means another operation committed.
/// Unlinked nodes are reclaimed through `G`.
pub struct LazyList<T, G: Guard, L: RawLock = SpinLock> {
    head: NodePtr<T, L>,
    /// Deferred destruction of unlinked nodes; freed when it drops.
    guard: G,
}

unsafe impl<T: Send, G: Guard, L: RawLock> Send for LazyList<T, G, L> {}
unsafe impl<T: Send + Sync, G: Guard, L: RawLock> Sync for LazyList<T, G, L> {}

impl<T, G: Guard, L: RawLock> LazyList<T, G, L> {
    /// Creates a list containing only the two sentinels.
    pub fn new() -> Self {
        let tail = Node::new(None, ptr::null_mut());
        let head = Node::new(None, tail);
        LazyList {
            head,
            guard: G::default(),
        }
    }

    /// Visit every live (unmarked) key in order, without locking.
    fn for_each_key<F: FnMut(&T)>(&self, mut f: F) {
        let _guard = G::pin();
        unsafe {
            let mut curr = (*self.head).next.load(Ordering::Acquire);
            while let Some(k) = (*curr).data.as_ref() {
                if !(*curr).marked.load(Ordering::Acquire) {
                    f(k);
                }
                curr = (*curr).next.load(Ordering::Acquire);
            }
        }
    }
}

impl<T: Ord, G: Guard, L: RawLock> LazyList<T, G, L> {
    /// Lock-free traversal to the (predecessor, current) pair bracketing
    /// `key`: `current` is the first node whose key is >= `key` (possibly
    /// the tail). Neither node is locked and either may be stale by the
    /// time the caller looks at it - mutators must validate under locks.
    fn search(&self, key: &T) -> (NodePtr<T, L>, NodePtr<T, L>) {
        unsafe {
            let mut pred = self.head;
            let mut curr = (*pred).next.load(Ordering::Acquire);
            while (*curr).precedes(key) {
                pred = curr;
                curr = (*pred).next.load(Ordering::Acquire);
            }
            (pred, curr)
        }
    }

    /// Check that the locked window still reflects the traversal result.
    ///
    /// # Safety
    /// Both pointers must be valid and locked by the caller, `pred` first.
    unsafe fn validate(pred: NodePtr<T, L>, curr: NodePtr<T, L>) -> bool {
        unsafe {
            !(*pred).marked.load(Ordering::Acquire)
                && !(*curr).marked.load(Ordering::Acquire)
                && (*pred).next.load(Ordering::Acquire) == curr
        }
    }
}

impl<T: Ord, G: Guard, L: RawLock> OrderedSet<T> for LazyList<T, G, L> {
    fn contains(&self, key: &T) -> bool {
        let _guard = G::pin();
        let (_pred, curr) = self.search(key);
        unsafe { (*curr).key_equals(key) && !(*curr).marked.load(Ordering::Acquire) }
    }

    fn add(&self, key: T) -> bool {
        let _guard = G::pin();
        let new_node = Node::new(Some(key), ptr::null_mut());

        loop {
            let key = unsafe { (*new_node).key() };
            let (pred, curr) = self.search(key);
            unsafe {
                // Fixed pred-then-curr order keeps lock acquisition
                // left-to-right along the chain.
                (*pred).lock.lock();
                (*curr).lock.lock();

                if Self::validate(pred, curr) {
                    if (*curr).key_equals(key) {
                        (*pred).lock.unlock();
                        (*curr).lock.unlock();
                        Node::dealloc(new_node);
                        return false;
                    }

                    (*new_node).next.store(curr, Ordering::Relaxed);
                    (*pred).next.store(new_node, Ordering::Release);

                    (*pred).lock.unlock();
                    (*curr).lock.unlock();
                    return true;
                }

                (*pred).lock.unlock();
                (*curr).lock.unlock();
                // Window changed mid-traversal, restart.
            }
        }
    }

    fn remove(&self, key: &T) -> bool {
        let _guard = G::pin();
        loop {
            let (pred, curr) = self.search(key);
            unsafe {
                (*pred).lock.lock();
                (*curr).lock.lock();

                if Self::validate(pred, curr) {
                    if !(*curr).key_equals(key) {
                        (*pred).lock.unlock();
                        (*curr).lock.unlock();
                        return false;
                    }

                    // Mark before unlinking: readers that already captured
                    // `curr` must see it as removed.
                    (*curr).marked.store(true, Ordering::Release);
                    let succ = (*curr).next.load(Ordering::Acquire);
                    (*pred).next.store(succ, Ordering::Release);

                    (*pred).lock.unlock();
                    (*curr).lock.unlock();

                    // In-flight lock-free readers may still hold `curr`.
                    self.guard.defer_destroy(curr, Node::dealloc);
                    return true;
                }

                (*pred).lock.unlock();
                (*curr).lock.unlock();
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

impl<T, G: Guard, L: RawLock> Default for LazyList<T, G, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G: Guard, L: RawLock> Drop for LazyList<T, G, L> {
    fn drop(&mut self) {
        // Only live nodes and sentinels remain reachable - removed nodes
        // were unlinked under locks and belong to the guard, which drops
        // after this body.
        let mut curr = self.head;
        while !curr.is_null() {
            unsafe {
                let next = (*curr).next.load(Ordering::Acquire);
                drop(Box::from_raw(curr));
                curr = next;
            }
        }
    }
}

impl<T: fmt::Debug, G: Guard, L: RawLock> fmt::Debug for LazyList<T, G, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.for_each_key(|k| {
            list.entry(k);
        });
        list.finish()
    }
}
