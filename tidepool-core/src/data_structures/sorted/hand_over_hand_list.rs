use std::cell::UnsafeCell;
use std::fmt;
use std::ptr;

use crate::data_structures::OrderedSet;
use crate::lock::{RawLock, SpinLock};

type NodePtr<T, L> = *mut Node<T, L>;

// =============================================================================
// HAND-OVER-HAND (LOCK-COUPLING) LIST
// =============================================================================
//
// Traversal always holds the locks of two adjacent nodes and releases the
// trailing lock only after acquiring the next one:
//
//   [HEAD]──►[ 10 ]──►[ 20 ]──►[ 30 ]──►[TAIL]──►NULL
//            ▲lock    ▲lock
//            pred     curr
//
// No other thread can mutate the (pred, curr) window while it is held, so
// insertion and unlinking need no validation and no retries. Locks are only
// ever acquired left-to-right along the chain, which rules out deadlock
// cycles.
//
// A removed node can be freed immediately: reaching a node requires holding
// its predecessor's lock first, and both the predecessor and the victim were
// locked for the whole operation, so no other thread holds or is waiting on
// a reference into the victim.

struct Node<T, L: RawLock> {
    /// `None` marks a sentinel. The head is never a comparison target and
    /// the tail's `None` reads as greater than every key.
    data: Option<T>,
    /// Protected by this node's `lock` (Drop has exclusive access and may
    /// read it unlocked).
    next: UnsafeCell<NodePtr<T, L>>,
    lock: L,
}

impl<T, L: RawLock> Node<T, L> {
    fn new(data: Option<T>, next: NodePtr<T, L>) -> NodePtr<T, L> {
        Box::into_raw(Box::new(Node {
            data,
            next: UnsafeCell::new(next),
            lock: L::default(),
        }))
    }
}

impl<T: Ord, L: RawLock> Node<T, L> {
    /// Whether this node's key sorts strictly before `key`.
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

/// Concurrent sorted list using fine-grained lock-coupling.
///
/// Each node embeds its own [`RawLock`]; mutating operations hold the locks
/// of the two nodes bracketing the affected position. Blocking: a thread
/// can be delayed by whichever thread holds an overlapping lock pair, with
/// whatever fairness `L` provides.
pub struct HandOverHandList<T, L: RawLock = SpinLock> {
    head: NodePtr<T, L>,
}

unsafe impl<T: Send, L: RawLock> Send for HandOverHandList<T, L> {}
unsafe impl<T: Send + Sync, L: RawLock> Sync for HandOverHandList<T, L> {}

impl<T, L: RawLock> HandOverHandList<T, L> {
    /// Creates a list containing only the two sentinels.
    pub fn new() -> Self {
        let tail = Node::new(None, ptr::null_mut());
        let head = Node::new(None, tail);
        HandOverHandList { head }
    }

    /// Visit every live key in order, lock-coupling along the chain.
    fn for_each_key<F: FnMut(&T)>(&self, mut f: F) {
        unsafe {
            let mut pred = self.head;
            (*pred).lock.lock();
            let mut curr = *(*pred).next.get();
            (*curr).lock.lock();

            loop {
                match &(*curr).data {
                    Some(k) => f(k),
                    None => break, // tail
                }
                (*pred).lock.unlock();
                pred = curr;
                curr = *(*pred).next.get();
                (*curr).lock.lock();
            }

            (*pred).lock.unlock();
            (*curr).lock.unlock();
        }
    }
}

impl<T: Ord, L: RawLock> HandOverHandList<T, L> {
    /// Moves to the (predecessor, current) pair bracketing `key`.
    ///
    /// On return both nodes are locked and `current` is the first node
    /// whose key is >= `key` (possibly the tail). The caller must unlock
    /// both. Acquisition is strictly left-to-right, preserving the
    /// deadlock-freedom argument.
    fn locate(&self, key: &T) -> (NodePtr<T, L>, NodePtr<T, L>) {
        unsafe {
            let mut pred = self.head;
            (*pred).lock.lock();
            let mut curr = *(*pred).next.get();
            (*curr).lock.lock();

            while (*curr).precedes(key) {
                (*pred).lock.unlock();
                pred = curr;
                curr = *(*pred).next.get();
                (*curr).lock.lock();
            }

            (pred, curr)
        }
    }
}

impl<T: Ord, L: RawLock> OrderedSet<T> for HandOverHandList<T, L> {
    fn contains(&self, key: &T) -> bool {
        let (pred, curr) = self.locate(key);
        unsafe {
            let found = (*curr).key_equals(key);
            (*pred).lock.unlock();
            (*curr).lock.unlock();
            found
        }
    }

    fn add(&self, key: T) -> bool {
        let (pred, curr) = self.locate(&key);
        unsafe {
            if (*curr).key_equals(&key) {
                (*pred).lock.unlock();
                (*curr).lock.unlock();
                return false;
            }

            let new_node = Node::new(Some(key), curr);
            *(*pred).next.get() = new_node;

            (*pred).lock.unlock();
            (*curr).lock.unlock();
            true
        }
    }

    fn remove(&self, key: &T) -> bool {
        let (pred, curr) = self.locate(key);
        unsafe {
            if !(*curr).key_equals(key) {
                (*pred).lock.unlock();
                (*curr).lock.unlock();
                return false;
            }

            *(*pred).next.get() = *(*curr).next.get();

            (*pred).lock.unlock();
            (*curr).lock.unlock();
            // Both neighbors were locked throughout, so no other thread
            // holds a reference into the unlinked node.
            drop(Box::from_raw(curr));
            true
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

impl<T, L: RawLock> Default for HandOverHandList<T, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, L: RawLock> Drop for HandOverHandList<T, L> {
    fn drop(&mut self) {
        // Exclusive access: free the whole chain, sentinels included.
        let mut curr = self.head;
        while !curr.is_null() {
            unsafe {
                let next = *(*curr).next.get();
                drop(Box::from_raw(curr));
                curr = next;
            }
        }
    }
}

impl<T: fmt::Debug, L: RawLock> fmt::Debug for HandOverHandList<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.for_each_key(|k| {
            list.entry(k);
        });
        list.finish()
    }
}
