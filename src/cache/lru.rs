//! LRU List Module
//!
//! Slab-backed doubly linked list giving O(1) recency updates for the bounded cache.

// == Slot ==
/// Stable handle to a key inside an [`LruList`].
///
/// A slot stays valid until its key is removed or evicted; freed slots are reused.
pub type Slot = usize;

#[derive(Debug)]
struct Node<K> {
    key: K,
    /// Neighbour towards the front (more recently used)
    prev: Option<Slot>,
    /// Neighbour towards the back (less recently used)
    next: Option<Slot>,
}

// == LRU List ==
/// Tracks access order for LRU eviction.
///
/// Keys are linked through a slab of nodes where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug)]
pub struct LruList<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<Slot>,
    front: Option<Slot>,
    back: Option<Slot>,
    len: usize,
}

impl<K> LruList<K> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` keys before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            front: None,
            back: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a key as the most recently used and returns its slot.
    pub fn push_front(&mut self, key: K) -> Slot {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.link_front(slot);
        self.len += 1;
        slot
    }

    // == Touch ==
    /// Marks the key at `slot` as most recently used.
    pub fn touch(&mut self, slot: Slot) {
        if self.front == Some(slot) || !self.is_occupied(slot) {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    // == Remove ==
    /// Unlinks the key at `slot` and frees the slot.
    pub fn remove(&mut self, slot: Slot) -> Option<K> {
        if !self.is_occupied(slot) {
            return None;
        }
        self.unlink(slot);
        let node = self.nodes[slot].take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(node.key)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the list is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let slot = self.back?;
        self.remove(slot)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.back.and_then(|slot| self.key(slot))
    }

    /// Returns the key stored at `slot`.
    pub fn key(&self, slot: Slot) -> Option<&K> {
        self.nodes
            .get(slot)
            .and_then(Option::as_ref)
            .map(|node| &node.key)
    }

    /// Drops every key and releases all slots.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.front = None;
        self.back = None;
        self.len = 0;
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            cursor: self.back,
        }
    }

    fn is_occupied(&self, slot: Slot) -> bool {
        matches!(self.nodes.get(slot), Some(Some(_)))
    }

    fn node_mut(&mut self, slot: Slot) -> Option<&mut Node<K>> {
        self.nodes.get_mut(slot).and_then(Option::as_mut)
    }

    fn unlink(&mut self, slot: Slot) {
        let Some(node) = self.node_mut(slot) else {
            return;
        };
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.front = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.back = prev,
        }
    }

    fn link_front(&mut self, slot: Slot) {
        let old_front = self.front;
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_front;
        }
        match old_front {
            Some(old) => {
                if let Some(node) = self.node_mut(old) {
                    node.prev = Some(slot);
                }
            }
            None => self.back = Some(slot),
        }
        self.front = Some(slot);
    }
}

impl<K> Default for LruList<K> {
    fn default() -> Self {
        Self::new()
    }
}

// == Iterator ==
/// Iterator over keys, least recently used first.
pub struct Iter<'a, K> {
    list: &'a LruList<K>,
    cursor: Option<Slot>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.nodes.get(slot)?.as_ref()?;
        self.cursor = node.prev;
        Some(&node.key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &LruList<&'static str>) -> Vec<&'static str> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_list_new() {
        let list: LruList<String> = LruList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert!(list.peek_oldest().is_none());
    }

    #[test]
    fn test_push_front_orders_oldest_first() {
        let mut list = LruList::new();
        list.push_front("asset-1");
        list.push_front("asset-2");
        list.push_front("asset-3");

        assert_eq!(list.len(), 3);
        assert_eq!(list.peek_oldest(), Some(&"asset-1"));
        assert_eq!(keys(&list), vec!["asset-1", "asset-2", "asset-3"]);
    }

    #[test]
    fn test_touch_moves_to_front() {
        let mut list = LruList::new();
        let a = list.push_front("a");
        list.push_front("b");
        list.push_front("c");

        list.touch(a);

        assert_eq!(list.len(), 3);
        assert_eq!(list.peek_oldest(), Some(&"b"));
        assert_eq!(keys(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_touch_front_is_noop() {
        let mut list = LruList::new();
        list.push_front("a");
        let b = list.push_front("b");

        list.touch(b);
        assert_eq!(keys(&list), vec!["a", "b"]);
    }

    #[test]
    fn test_touch_middle_keeps_links() {
        let mut list = LruList::new();
        list.push_front("a");
        let b = list.push_front("b");
        list.push_front("c");
        list.push_front("d");

        list.touch(b);
        assert_eq!(keys(&list), vec!["a", "c", "d", "b"]);

        assert_eq!(list.evict_oldest(), Some("a"));
        assert_eq!(list.evict_oldest(), Some("c"));
        assert_eq!(list.evict_oldest(), Some("d"));
        assert_eq!(list.evict_oldest(), Some("b"));
        assert_eq!(list.evict_oldest(), None);
    }

    #[test]
    fn test_evict_empty() {
        let mut list: LruList<&str> = LruList::new();
        assert_eq!(list.evict_oldest(), None);
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut list = LruList::new();
        let a = list.push_front("a");
        let b = list.push_front("b");
        let c = list.push_front("c");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(keys(&list), vec!["a", "c"]);

        assert_eq!(list.remove(c), Some("c"));
        assert_eq!(keys(&list), vec!["a"]);

        assert_eq!(list.remove(a), Some("a"));
        assert!(list.is_empty());
        assert!(list.peek_oldest().is_none());
    }

    #[test]
    fn test_remove_freed_slot_twice() {
        let mut list = LruList::new();
        let a = list.push_front("a");
        list.push_front("b");

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.remove(a), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut list = LruList::new();
        let a = list.push_front("a");
        list.push_front("b");
        list.remove(a);

        let c = list.push_front("c");
        assert_eq!(c, a);
        assert_eq!(list.key(c), Some(&"c"));
        assert_eq!(keys(&list), vec!["b", "c"]);
    }

    #[test]
    fn test_clear() {
        let mut list = LruList::new();
        list.push_front("a");
        list.push_front("b");

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);

        list.push_front("c");
        assert_eq!(keys(&list), vec!["c"]);
    }
}
