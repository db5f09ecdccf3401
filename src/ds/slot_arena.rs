//! Generation-checked slot arena.
//!
//! Backs every list in the crate. Slots freed by `remove` are recycled, and
//! each recycle bumps the slot generation, so a `SlotId` kept past the removal
//! of its entry (for example by a bucket chain that was not yet unlinked)
//! resolves to `None` instead of aliasing whatever reuses the slot.

/// Stable handle to an arena entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: u32,
    generation: u32,
}

impl SlotId {
    /// Position of the slot in the arena.
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Number of times the slot had been recycled when this id was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> SlotId {
        let index = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.value = Some(value);
            index
        } else {
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            (self.slots.len() - 1) as u32
        };
        self.len += 1;
        SlotId {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Inserts the value built by `f`, which receives the id the value will
    /// live under. Lets self-referencing entries (ring links) start out
    /// pointing at themselves.
    pub fn insert_with(&mut self, f: impl FnOnce(SlotId) -> T) -> SlotId {
        let id = match self.free_list.last() {
            Some(&index) => SlotId {
                index,
                generation: self.slots[index as usize].generation.wrapping_add(1),
            },
            None => SlotId {
                index: self.slots.len() as u32,
                generation: 0,
            },
        };
        let inserted = self.insert(f(id));
        debug_assert_eq!(inserted, id);
        inserted
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free_list.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arena_insert_remove_reuse() {
        let mut arena = SlotArena::new();
        let id1 = arena.insert("a");
        let id2 = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id1), Some(&"a"));
        assert_eq!(arena.get(id2), Some(&"b"));

        assert_eq!(arena.remove(id1), Some("a"));
        assert_eq!(arena.len(), 1);

        let id3 = arena.insert("c");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(id3), Some(&"c"));
        assert_eq!(id1.index(), id3.index());
        assert_ne!(id1.generation(), id3.generation());
    }

    #[test]
    fn stale_id_does_not_alias_recycled_slot() {
        let mut arena = SlotArena::new();
        let old = arena.insert(1);
        arena.remove(old);
        let new = arena.insert(2);

        assert_eq!(old.index(), new.index());
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.get_mut(old), None);
        assert_eq!(arena.remove(old), None);
        assert!(!arena.contains(old));
        assert_eq!(arena.get(new), Some(&2));
    }

    #[test]
    fn insert_with_sees_final_id() {
        let mut arena = SlotArena::new();
        let first = arena.insert_with(|id| id);
        assert_eq!(arena.get(first), Some(&first));

        arena.remove(first);
        let second = arena.insert_with(|id| id);
        assert_eq!(arena.get(second), Some(&second));
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), first.generation() + 1);
    }
}
