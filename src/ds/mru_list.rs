//! Bounded most-recently-used list over a circular ring of arena slots.
//!
//! `MruList` is the small linear index the glyph caches use for their
//! rendering configurations. Entries live in a [`SlotArena`] and are linked
//! into a circular ring by `SlotId`, so the least recently used entry is
//! always `head.prev` and every splice is O(1).
//!
//! ## Architecture
//!
//! ```text
//!          head (MRU)
//!            │
//!            ▼
//!   ┌──────► [A] ◄──► [B] ◄──► [C] ◄──┐
//!   │                                 │
//!   └──────────── next / prev ────────┘
//!                  (C == head.prev == LRU)
//! ```
//!
//! ## Capabilities
//!
//! What an entry is, and how it is built and torn down, is supplied by the
//! entry type through two traits:
//!
//! - [`MruNode`]: `compare(entry, key)`, used by [`MruList::find`].
//! - [`MruLifecycle<D>`]: `init`, optional `reset` and optional `done`, each
//!   handed the caller-provided context `D`.
//!
//! ## Operations
//!
//! | Operation          | Description                                        | Cost |
//! |--------------------|----------------------------------------------------|------|
//! | `prepend`          | link a new entry at the head                       | O(1) |
//! | `up`               | move an entry to the head                          | O(1) |
//! | `take` / `remove`  | unlink an entry (`remove` also runs `done`)        | O(1) |
//! | `find`             | scan from the head, promote the first match        | O(n) |
//! | `new_node`         | create, or recycle the LRU entry when full         | O(1) |
//! | `lookup`           | `find`, then `new_node` on a miss                  | O(n) |
//! | `remove_selection` | purge every entry matching a predicate             | O(n) |
//! | `reset`            | remove every entry, running `done` for each        | O(n) |

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::{CacheError, InvariantError};

/// Key comparison for [`MruList::find`].
pub trait MruNode {
    type Key: ?Sized;

    /// Returns `true` if this entry answers for `key`.
    fn compare(&self, key: &Self::Key) -> bool;
}

/// Construction and teardown hooks, parameterised by the context `D` the
/// owning list is driven with.
pub trait MruLifecycle<D>: MruNode + Sized {
    /// Builds a fresh entry for `key`.
    fn init(key: &Self::Key, data: &mut D) -> Result<Self, CacheError>;

    /// Reinitialises a recycled entry in place for `key`.
    ///
    /// Returns `false` when in-place reuse is unsupported; the entry must
    /// then be left untouched.
    fn reset(&mut self, _id: SlotId, _key: &Self::Key, _data: &mut D) -> bool {
        false
    }

    /// Releases whatever the entry holds in `data` before it is dropped.
    fn done(&mut self, _id: SlotId, _data: &mut D) {}
}

#[derive(Debug)]
struct Entry<N> {
    node: N,
    prev: SlotId,
    next: SlotId,
}

/// Circular MRU list holding at most `max_nodes` entries (0 = unbounded).
#[derive(Debug)]
pub struct MruList<N> {
    arena: SlotArena<Entry<N>>,
    head: Option<SlotId>,
    max_nodes: usize,
}

impl<N> MruList<N> {
    /// Creates an empty list. `max_nodes == 0` leaves it unbounded.
    pub fn new(max_nodes: usize) -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            max_nodes,
        }
    }

    /// Number of entries currently linked.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Most recently used entry.
    pub fn head_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Least recently used entry, the next one to be recycled.
    pub fn tail_id(&self) -> Option<SlotId> {
        self.head
            .and_then(|head| self.arena.get(head))
            .map(|entry| entry.prev)
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    pub fn get(&self, id: SlotId) -> Option<&N> {
        self.arena.get(id).map(|entry| &entry.node)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut N> {
        self.arena.get_mut(id).map(|entry| &mut entry.node)
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> MruIter<'_, N> {
        MruIter {
            list: self,
            current: self.head,
            remaining: self.len(),
        }
    }

    /// Links `node` at the head and returns its id. Capacity is not checked;
    /// use [`new_node`](Self::new_node) for bounded insertion.
    pub fn prepend(&mut self, node: N) -> SlotId {
        let id = self.arena.insert_with(|id| Entry {
            node,
            prev: id,
            next: id,
        });
        self.link_front(id);
        id
    }

    /// Moves `id` to the head. Returns `false` if `id` is not in the list.
    pub fn up(&mut self, id: SlotId) -> bool {
        let Some(first) = self.head else {
            return false;
        };
        if !self.arena.contains(id) {
            return false;
        }
        if first == id {
            return true;
        }

        self.unlink(id);
        self.link_front(id);
        true
    }

    /// Unlinks `id` and hands its entry back without running `done`.
    pub fn take(&mut self, id: SlotId) -> Option<N> {
        if !self.arena.contains(id) {
            return None;
        }
        self.unlink(id);
        self.arena.remove(id).map(|entry| entry.node)
    }

    /// Scans from the head for the first entry matching `key` and promotes it.
    pub fn find(&mut self, key: &N::Key) -> Option<SlotId>
    where
        N: MruNode,
    {
        let first = self.head?;
        let mut current = first;
        loop {
            let entry = self.arena.get(current)?;
            if entry.node.compare(key) {
                if current != first {
                    self.up(current);
                }
                return Some(current);
            }
            current = entry.next;
            if current == first {
                return None;
            }
        }
    }

    /// Creates an entry for `key` and links it at the head.
    ///
    /// When the list is full, the least recently used entry is offered to
    /// [`MruLifecycle::reset`] and reused in place if it accepts. Otherwise a
    /// fresh entry is built first and the old tail is removed only once that
    /// succeeded, so a failing `init` leaves the list exactly as it was.
    pub fn new_node<D>(&mut self, key: &N::Key, data: &mut D) -> Result<SlotId, CacheError>
    where
        N: MruLifecycle<D>,
    {
        if self.max_nodes > 0 && self.len() >= self.max_nodes {
            if let Some(tail) = self.tail_id() {
                let reused = match self.arena.get_mut(tail) {
                    Some(entry) => entry.node.reset(tail, key, data),
                    None => false,
                };
                if reused {
                    self.up(tail);
                    return Ok(tail);
                }

                let node = N::init(key, data)?;
                self.remove(tail, data);
                return Ok(self.prepend(node));
            }
        }

        let node = N::init(key, data)?;
        Ok(self.prepend(node))
    }

    /// Finds the entry for `key`, creating it on a miss.
    pub fn lookup<D>(&mut self, key: &N::Key, data: &mut D) -> Result<SlotId, CacheError>
    where
        N: MruLifecycle<D>,
    {
        match self.find(key) {
            Some(id) => Ok(id),
            None => self.new_node(key, data),
        }
    }

    /// Unlinks `id`, runs its `done` hook and drops it.
    pub fn remove<D>(&mut self, id: SlotId, data: &mut D) -> bool
    where
        N: MruLifecycle<D>,
    {
        match self.take(id) {
            Some(mut node) => {
                node.done(id, data);
                true
            },
            None => false,
        }
    }

    /// Removes every entry for which `selection` holds, keeping the relative
    /// order of the survivors. Returns the number of entries removed.
    pub fn remove_selection<D, F>(&mut self, mut selection: F, data: &mut D) -> usize
    where
        N: MruLifecycle<D>,
        F: FnMut(&N) -> bool,
    {
        let mut removed = 0;

        // Strip matching heads first so `first` below is a stable sentinel.
        while let Some(first) = self.head {
            let matches = self.get(first).is_some_and(&mut selection);
            if !matches {
                break;
            }
            self.remove(first, data);
            removed += 1;
        }

        let Some(first) = self.head else {
            return removed;
        };
        let mut current = self.arena.get(first).map(|entry| entry.next);
        while let Some(id) = current {
            if id == first {
                break;
            }
            let Some(entry) = self.arena.get(id) else {
                break;
            };
            let next = entry.next;
            if selection(&entry.node) {
                self.remove(id, data);
                removed += 1;
            }
            current = Some(next);
        }
        removed
    }

    /// Removes every entry, head first, running `done` for each.
    pub fn reset<D>(&mut self, data: &mut D)
    where
        N: MruLifecycle<D>,
    {
        while let Some(head) = self.head {
            self.remove(head, data);
        }
        debug_assert!(self.arena.is_empty());
    }

    /// Checks that walking `next` and `prev` from the head both return to the
    /// head after exactly `len()` steps, with mirrored links throughout.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let Some(first) = self.head else {
            if self.arena.is_empty() {
                return Ok(());
            }
            return Err(InvariantError::new(format!(
                "mru list: no head but {} entries",
                self.arena.len()
            )));
        };

        let mut steps = 0usize;
        let mut current = first;
        loop {
            let entry = self
                .arena
                .get(current)
                .ok_or_else(|| InvariantError::new(format!("mru list: stale SlotId {:?}", current)))?;
            let next = self
                .arena
                .get(entry.next)
                .ok_or_else(|| InvariantError::new(format!("mru list: dangling next {:?}", entry.next)))?;
            if next.prev != current {
                return Err(InvariantError::new(format!(
                    "mru list: {:?}.next.prev is {:?}",
                    current, next.prev
                )));
            }
            steps += 1;
            current = entry.next;
            if current == first {
                break;
            }
            if steps > self.arena.len() {
                return Err(InvariantError::new("mru list: ring does not close"));
            }
        }
        if steps != self.arena.len() {
            return Err(InvariantError::new(format!(
                "mru list: ring holds {} entries, arena holds {}",
                steps,
                self.arena.len()
            )));
        }

        let mut back_steps = 0usize;
        let mut current = first;
        loop {
            let entry = self
                .arena
                .get(current)
                .ok_or_else(|| InvariantError::new(format!("mru list: stale SlotId {:?}", current)))?;
            back_steps += 1;
            current = entry.prev;
            if current == first || back_steps > steps {
                break;
            }
        }
        if back_steps != steps {
            return Err(InvariantError::new(format!(
                "mru list: {} steps forward but {} back",
                steps, back_steps
            )));
        }
        if self.max_nodes > 0 && steps > self.max_nodes {
            return Err(InvariantError::new(format!(
                "mru list: {} entries exceed max_nodes {}",
                steps, self.max_nodes
            )));
        }
        Ok(())
    }

    fn link_front(&mut self, id: SlotId) {
        #[cfg(debug_assertions)]
        if let Some(first) = self.head {
            let mut current = first;
            loop {
                assert_ne!(current, id, "MruList::prepend: entry already linked");
                match self.arena.get(current) {
                    Some(entry) if entry.next != first => current = entry.next,
                    _ => break,
                }
            }
        }

        match self.head {
            Some(first) => {
                let last = match self.arena.get_mut(first) {
                    Some(head) => {
                        let last = head.prev;
                        head.prev = id;
                        last
                    },
                    None => return,
                };
                if let Some(tail) = self.arena.get_mut(last) {
                    tail.next = id;
                }
                if let Some(entry) = self.arena.get_mut(id) {
                    entry.next = first;
                    entry.prev = last;
                }
            },
            None => {
                if let Some(entry) = self.arena.get_mut(id) {
                    entry.next = id;
                    entry.prev = id;
                }
            },
        }
        self.head = Some(id);
    }

    fn unlink(&mut self, id: SlotId) {
        let Some((prev, next)) = self.arena.get(id).map(|entry| (entry.prev, entry.next)) else {
            return;
        };

        if let Some(entry) = self.arena.get_mut(prev) {
            entry.next = next;
        }
        if let Some(entry) = self.arena.get_mut(next) {
            entry.prev = prev;
        }
        if let Some(entry) = self.arena.get_mut(id) {
            entry.next = id;
            entry.prev = id;
        }

        if next == id {
            debug_assert_eq!(self.head, Some(id));
            self.head = None;
        } else if self.head == Some(id) {
            self.head = Some(next);
        }
    }
}

impl<N> Default for MruList<N> {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Iterator over `(SlotId, &N)` from most to least recently used.
pub struct MruIter<'a, N> {
    list: &'a MruList<N>,
    current: Option<SlotId>,
    remaining: usize,
}

impl<'a, N> Iterator for MruIter<'a, N> {
    type Item = (SlotId, &'a N);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        let entry = self.list.arena.get(id)?;
        self.remaining -= 1;
        self.current = Some(entry.next);
        Some((id, &entry.node))
    }
}
