use std::fmt;
use std::mem;
use std::ptr::{self, NonNull};

/// A node in the recency list.
///
/// Sentinel nodes leave `val` uninitialized; every other node owns a value.
pub struct Node<T> {
    val: mem::MaybeUninit<T>,
    prev: *mut Node<T>,
    next: *mut Node<T>,
}

impl<T> Node<T> {
    fn new(val: T) -> Self {
        Node {
            val: mem::MaybeUninit::new(val),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    fn new_sentinel() -> Self {
        Node {
            val: mem::MaybeUninit::uninit(),
            prev: ptr::null_mut(),
            next: ptr::null_mut(),
        }
    }

    /// Consumes a detached node and returns its value.
    ///
    /// # Safety
    ///
    /// The node must not be a sentinel.
    pub unsafe fn into_value(self: Box<Self>) -> T {
        // SAFETY: caller guarantees the value was initialized
        unsafe { self.val.assume_init() }
    }
}

/// An unbounded doubly linked list ordered from most recent (front) to least
/// recent (back).
///
/// Nodes are heap allocated and addressed by raw pointer so that an external
/// map can reach any node in O(1). Sentinels at both ends remove the empty-list
/// special cases from linking and unlinking.
pub struct List<T> {
    len: usize,
    head: *mut Node<T>,
    tail: *mut Node<T>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        let head = Box::into_raw(Box::new(Node::new_sentinel()));
        let tail = Box::into_raw(Box::new(Node::new_sentinel()));

        // SAFETY: head and tail were just allocated and are valid
        unsafe {
            (*head).next = tail;
            (*tail).prev = head;
        }

        List { len: 0, head, tail }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocates a node for `val` at the front and returns its address.
    pub fn push_front(&mut self, val: T) -> *mut Node<T> {
        // SAFETY: Box::into_raw never returns null
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(Node::new(val)))) };
        // SAFETY: node is freshly allocated and not linked anywhere
        unsafe { self.link_front(node.as_ptr()) };
        self.len += 1;
        node.as_ptr()
    }

    /// Unlinks the back node (the least recent) and hands ownership to the caller.
    pub fn pop_back(&mut self) -> Option<Box<Node<T>>> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: tail is valid and the list is non-empty, so tail.prev is a value node
        let last = unsafe { (*self.tail).prev };
        if last == self.head {
            return None;
        }
        // SAFETY: last is a linked value node
        unsafe { self.unlink(last) };
        self.len -= 1;
        // SAFETY: last was allocated via Box::into_raw and is no longer linked
        Some(unsafe { Box::from_raw(last) })
    }

    /// Unlinks `node` and hands ownership to the caller.
    ///
    /// # Safety
    ///
    /// `node` must be a value node currently linked into this list.
    pub unsafe fn remove(&mut self, node: *mut Node<T>) -> Option<Box<Node<T>>> {
        if self.is_empty() || node.is_null() || node == self.head || node == self.tail {
            return None;
        }
        // SAFETY: caller guarantees node belongs to this list
        unsafe { self.unlink(node) };
        self.len -= 1;
        // SAFETY: node was allocated via Box::into_raw and is no longer linked
        Some(unsafe { Box::from_raw(node) })
    }

    /// Moves a linked node to the front.
    ///
    /// # Safety
    ///
    /// `node` must be a value node currently linked into this list.
    pub unsafe fn move_to_front(&mut self, node: *mut Node<T>) {
        if node.is_null() || node == self.head || node == self.tail {
            return;
        }
        // SAFETY: head is valid for the lifetime of the list
        if unsafe { (*self.head).next } == node {
            return;
        }
        // SAFETY: caller guarantees node belongs to this list
        unsafe {
            self.unlink(node);
            self.link_front(node);
        }
    }

    /// Returns a reference to the value held by `node`.
    ///
    /// # Safety
    ///
    /// `node` must be a value node currently linked into this list.
    pub unsafe fn value(&self, node: *mut Node<T>) -> &T {
        // SAFETY: caller guarantees node is a live value node owned by self
        unsafe { (*node).val.assume_init_ref() }
    }

    /// Iterates values from the back (least recent) to the front.
    pub fn iter_oldest_first(&self) -> IterOldestFirst<'_, T> {
        // SAFETY: tail is valid for the lifetime of the list
        let cursor = unsafe { (*self.tail).prev };
        IterOldestFirst { list: self, cursor }
    }

    pub fn clear(&mut self) {
        while let Some(node) = self.pop_back() {
            // SAFETY: pop_back only returns value nodes
            drop(unsafe { node.into_value() });
        }
    }

    unsafe fn unlink(&mut self, node: *mut Node<T>) {
        // SAFETY: a linked node always has valid neighbours (possibly sentinels)
        unsafe {
            (*(*node).prev).next = (*node).next;
            (*(*node).next).prev = (*node).prev;
        }
    }

    unsafe fn link_front(&mut self, node: *mut Node<T>) {
        // SAFETY: head is valid and node is not currently linked
        unsafe {
            (*node).next = (*self.head).next;
            (*node).prev = self.head;
            (*self.head).next = node;
            (*(*node).next).prev = node;
        }
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: sentinels were allocated in `new` and are freed exactly once here
        unsafe {
            drop(Box::from_raw(self.head));
            drop(Box::from_raw(self.tail));
        }
    }
}

impl<T> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("len", &self.len).finish()
    }
}

/// Back-to-front iterator returned by [`List::iter_oldest_first`].
pub struct IterOldestFirst<'a, T> {
    list: &'a List<T>,
    cursor: *mut Node<T>,
}

impl<'a, T> Iterator for IterOldestFirst<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cursor == self.list.head {
            return None;
        }
        let node = self.cursor;
        // SAFETY: cursor walks linked value nodes while the list is borrowed
        unsafe {
            self.cursor = (*node).prev;
            Some((*node).val.assume_init_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_back(list: &mut List<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(node) = list.pop_back() {
            out.push(unsafe { node.into_value() });
        }
        out
    }

    #[test]
    fn test_push_and_pop_back_order() {
        let mut list = List::new();
        assert!(list.pop_back().is_none());

        list.push_front(1);
        list.push_front(2);
        list.push_front(3);
        assert_eq!(list.len(), 3);

        // oldest insertion comes out first
        assert_eq!(drain_back(&mut list), vec![1, 2, 3]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_move_to_front() {
        let mut list = List::new();
        let one = list.push_front(1);
        let _two = list.push_front(2);
        let three = list.push_front(3);

        unsafe {
            list.move_to_front(one);
            // already at the front
            list.move_to_front(one);
        }
        assert_eq!(list.len(), 3);

        unsafe { list.move_to_front(three) };
        assert_eq!(drain_back(&mut list), vec![2, 1, 3]);
    }

    #[test]
    fn test_remove_middle() {
        let mut list = List::new();
        let _one = list.push_front(1);
        let two = list.push_front(2);
        let _three = list.push_front(3);

        let removed = unsafe { list.remove(two) }.unwrap();
        assert_eq!(unsafe { removed.into_value() }, 2);
        assert_eq!(list.len(), 2);
        assert_eq!(drain_back(&mut list), vec![1, 3]);
    }

    #[test]
    fn test_iter_oldest_first() {
        let mut list = List::new();
        for i in 0..5u32 {
            list.push_front(i);
        }
        let seen: Vec<u32> = list.iter_oldest_first().copied().collect();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_clear_drops_values() {
        let mut list = List::new();
        list.push_front(String::from("a"));
        list.push_front(String::from("b"));
        list.clear();
        assert!(list.is_empty());
        list.push_front(String::from("c"));
        assert_eq!(list.len(), 1);
    }
}
