//! Intrusive doubly linked list backed by `SlotArena`.
//!
//! Stores list nodes in a `SlotArena` and links them by `SlotId`, enabling
//! stable handles and O(1) splice/move operations without pointer chasing.
//! The glyph caches thread every node they own through one of these lists:
//! the head is the most recently used node and the tail is the next eviction
//! candidate.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Link<T>>)
//!   ┌────────┬─────────────────────────────────────────────┐
//!   │ SlotId │ Link { value, prev, next }                  │
//!   ├────────┼─────────────────────────────────────────────┤
//!   │ id_1   │ { value: A, prev: None, next: Some(id_2) }  │
//!   │ id_2   │ { value: B, prev: Some(id_1), next: id_3 }  │
//!   │ id_3   │ { value: C, prev: Some(id_2), next: None }  │
//!   └────────┴─────────────────────────────────────────────┘
//!
//!   head ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail
//!   (MRU)                                      (LRU)
//! ```
//!
//! ## Performance
//! - `push_front`, `remove`, `move_to_front`: O(1)
//! - `prev_id` / `next_id`: O(1), used to sweep from the tail while removing
//! - `iter_entries`: O(n)
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Link<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
/// Intrusive list that stores nodes in a `SlotArena` and links them via `SlotId`.
pub struct IntrusiveList<T> {
    arena: SlotArena<Link<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of nodes in the list.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns the SlotId at the front (MRU) of the list.
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the SlotId at the back (LRU) of the list.
    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    /// Returns the neighbour of `id` towards the front.
    pub fn prev_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|link| link.prev)
    }

    /// Returns the neighbour of `id` towards the back.
    pub fn next_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|link| link.next)
    }

    /// Returns the value for a node id, if present.
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|link| &link.value)
    }

    /// Returns a mutable reference to a node value, if present.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|link| &mut link.value)
    }

    /// Returns an iterator of `(SlotId, &T)` from front to back.
    pub fn iter_entries(&self) -> IntrusiveListEntryIter<'_, T> {
        IntrusiveListEntryIter {
            list: self,
            current: self.head,
        }
    }

    /// Inserts a new node at the front and returns its `SlotId`.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.arena.insert(Link {
            value,
            prev: None,
            next: self.head,
        });
        if let Some(head) = self.head {
            if let Some(link) = self.arena.get_mut(head) {
                link.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        id
    }

    /// Removes the node `id` from the list and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        self.detach(id)?;
        self.arena.remove(id).map(|link| link.value)
    }

    /// Moves an existing node to the front; returns `false` if `id` is not present.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.arena.contains(id) {
            return false;
        }
        if Some(id) == self.head {
            return true;
        }
        self.detach(id);
        self.attach_front(id);
        true
    }

    fn detach(&mut self, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let link = self.arena.get(id)?;
            (link.prev, link.next)
        };

        if let Some(prev_id) = prev {
            if let Some(prev_link) = self.arena.get_mut(prev_id) {
                prev_link.next = next;
            }
        } else {
            self.head = next;
        }

        if let Some(next_id) = next {
            if let Some(next_link) = self.arena.get_mut(next_id) {
                next_link.prev = prev;
            }
        } else {
            self.tail = prev;
        }

        if let Some(link) = self.arena.get_mut(id) {
            link.prev = None;
            link.next = None;
        }

        Some(())
    }

    fn attach_front(&mut self, id: SlotId) -> Option<()> {
        let old_head = self.head;
        let link = self.arena.get_mut(id)?;
        link.prev = None;
        link.next = old_head;
        if let Some(old_head) = old_head {
            if let Some(head_link) = self.arena.get_mut(old_head) {
                head_link.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        Some(())
    }

    /// Walks the list front to back and checks every back-link, the tail
    /// pointer and the node count.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() || self.tail.is_none() {
            if self.head.is_some() || self.tail.is_some() || !self.is_empty() {
                return Err(InvariantError::new(format!(
                    "list has head {:?} / tail {:?} with {} nodes",
                    self.head,
                    self.tail,
                    self.len()
                )));
            }
            return Ok(());
        }

        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;

        while let Some(id) = current {
            let link = self
                .arena
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("list: stale SlotId {:?}", id)))?;
            if link.prev != prev {
                return Err(InvariantError::new(format!(
                    "list: node {:?} has prev {:?}, expected {:?}",
                    id, link.prev, prev
                )));
            }
            if link.next.is_none() && self.tail != Some(id) {
                return Err(InvariantError::new(format!(
                    "list: last node {:?} is not the tail {:?}",
                    id, self.tail
                )));
            }

            prev = Some(id);
            current = link.next;
            count += 1;
            if count > self.len() {
                return Err(InvariantError::new("list: cycle detected"));
            }
        }

        if count != self.len() {
            return Err(InvariantError::new(format!(
                "list: walked {} nodes, arena holds {}",
                count,
                self.len()
            )));
        }
        Ok(())
    }
}

/// Iterator over `(SlotId, &T)` pairs from front to back.
pub struct IntrusiveListEntryIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListEntryIter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let link = self.list.arena.get(id)?;
        self.current = link.next;
        Some((id, &link.value))
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<T: Copy>(list: &IntrusiveList<T>) -> Vec<T> {
        list.iter_entries().map(|(_, v)| *v).collect()
    }

    #[test]
    fn intrusive_list_basic_ops() {
        let mut list = IntrusiveList::new();
        let c = list.push_front("c");
        let b = list.push_front("b");
        let a = list.push_front("a");

        assert_eq!(list.front_id(), Some(a));
        assert_eq!(list.back_id(), Some(c));
        assert_eq!(list.len(), 3);

        assert!(list.move_to_front(c));
        assert_eq!(values(&list), vec!["c", "a", "b"]);
        assert_eq!(list.back_id(), Some(b));

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(b), None);
        assert!(!list.move_to_front(b));
        list.check_invariants().unwrap();
    }

    #[test]
    fn intrusive_list_neighbours() {
        let mut list = IntrusiveList::new();
        let c = list.push_front(3);
        let b = list.push_front(2);
        let a = list.push_front(1);

        assert_eq!(list.prev_id(a), None);
        assert_eq!(list.next_id(a), Some(b));
        assert_eq!(list.prev_id(c), Some(b));
        assert_eq!(list.next_id(c), None);

        // Sweep from the tail, removing while walking.
        let mut cursor = list.back_id();
        let mut seen = Vec::new();
        while let Some(id) = cursor {
            cursor = list.prev_id(id);
            seen.push(list.remove(id).unwrap());
        }
        assert_eq!(seen, vec![3, 2, 1]);
        assert!(list.is_empty());
        list.check_invariants().unwrap();
    }

    #[test]
    fn intrusive_list_remove_middle_and_ends() {
        let mut list = IntrusiveList::new();
        let c = list.push_front("c");
        let b = list.push_front("b");
        let a = list.push_front("a");

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(values(&list), vec!["a", "c"]);

        assert_eq!(list.remove(a), Some("a"));
        assert_eq!(list.front_id(), Some(c));
        assert_eq!(list.back_id(), Some(c));

        assert_eq!(list.remove(c), Some("c"));
        assert!(list.is_empty());
        assert_eq!(list.front_id(), None);
        assert_eq!(list.back_id(), None);
        assert_eq!(list.remove(c), None);
    }

    #[test]
    fn intrusive_list_get_mut_updates_value() {
        let mut list = IntrusiveList::new();
        let id = list.push_front(10);
        if let Some(value) = list.get_mut(id) {
            *value = 20;
        }
        assert_eq!(list.get(id), Some(&20));
    }
}
