use std::{marker::PhantomData, num::NonZeroU64};

/// Stable handle to a value stored in an [`Arena`].
///
/// The handle packs a slot index with the generation of that slot at the time
/// of insertion. Removing the value bumps the generation, so a stale handle is
/// rejected even after the slot has been reused.
pub struct Handle<T>(NonZeroU64, PhantomData<fn() -> T>);

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        debug_assert_ne!(generation, 0);
        let packed = u64::from(generation) << 32 | u64::from(index);
        // Generations start at 1 and skip 0 on wrap-around.
        Self(
            NonZeroU64::new(packed).unwrap_or(NonZeroU64::MIN),
            PhantomData,
        )
    }

    #[must_use]
    pub fn index(self) -> u32 {
        self.0.get() as u32
    }

    #[must_use]
    pub fn generation(self) -> u32 {
        (self.0.get() >> 32) as u32
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index())
            .field("generation", &self.generation())
            .finish()
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Free { generation: u32, next: Option<u32> },
}

impl<T> Slot<T> {
    fn generation(&self) -> u32 {
        match self {
            Slot::Occupied { generation, .. } | Slot::Free { generation, .. } => *generation,
        }
    }
}

/// Object storage with generational handles.
///
/// Freed slots are threaded into a free list and reused by later inserts.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a value and returns a handle to it.
    ///
    /// ## Panics
    ///
    /// Panics if more than `u32::MAX` slots are live at once.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;

        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let Slot::Free { generation, next } = *slot else {
                unreachable!("free list points at an occupied slot");
            };

            self.free_head = next;
            *slot = Slot::Occupied { generation, value };
            Handle::new(index, generation)
        } else {
            let index = u32::try_from(self.slots.len()).expect("arena slot count exceeds u32");
            self.slots.push(Slot::Occupied {
                generation: 1,
                value,
            });
            Handle::new(index, 1)
        }
    }

    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        match self.slots.get(handle.index() as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation() => {
                Some(value)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        match self.slots.get_mut(handle.index() as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation() => {
                Some(value)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Removes the value identified by the handle, if it is still live.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let index = handle.index();
        let slot = self.slots.get_mut(index as usize)?;

        match slot {
            Slot::Occupied { generation, .. } if *generation == handle.generation() => {}
            _ => return None,
        }

        let next_generation = match slot.generation().wrapping_add(1) {
            0 => 1,
            g => g,
        };

        let old = std::mem::replace(
            slot,
            Slot::Free {
                generation: next_generation,
                next: self.free_head,
            },
        );

        self.free_head = Some(index);
        self.len -= 1;

        match old {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Free { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove_one() {
        let mut arena = Arena::<u32>::new();

        let handle = arena.insert(42);
        assert_eq!(handle.index(), 0);
        assert_eq!(handle.generation(), 1);
        assert_eq!(arena.len(), 1);

        assert_eq!(arena.get(handle), Some(&42));
        assert_eq!(arena.get_mut(handle), Some(&mut 42));

        assert_eq!(arena.remove(handle), Some(42));
        assert_eq!(arena.get(handle), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn handles() {
        let mut arena = Arena::<u32>::new();
        let handle = arena.insert(42);
        let copy = handle;

        assert_eq!(handle, copy);
        assert_eq!(
            format!("{:?}", handle),
            "Handle { index: 0, generation: 1 }"
        );
    }

    #[test]
    fn remove_twice() {
        let mut arena = Arena::<u32>::new();
        let handle = arena.insert(42);

        assert_eq!(arena.remove(handle), Some(42));
        assert_eq!(arena.remove(handle), None);

        let _ = arena.insert(43);
        assert_eq!(arena.remove(handle), None);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn stale_handle_after_reuse() {
        let mut arena = Arena::<u32>::new();

        let a = arena.insert(42);
        assert_eq!(arena.remove(a), Some(42));

        let b = arena.insert(43);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&43));
    }

    #[test]
    fn many() {
        const COUNT: u32 = 10;

        let mut arena = Arena::<u32>::new();
        let handles: Vec<_> = (0..COUNT).map(|i| arena.insert(i)).collect();

        for (i, h) in handles.iter().enumerate() {
            assert_eq!(arena.get(*h), Some(&(i as u32)));
        }

        for h in handles.iter().step_by(2) {
            arena.remove(*h);
        }

        let live: Vec<u32> = handles.iter().filter_map(|h| arena.get(*h)).copied().collect();
        assert_eq!(live, vec![1, 3, 5, 7, 9]);
        assert_eq!(arena.len(), 5);
    }

    #[test]
    fn drops_once() {
        use std::rc::Rc;

        let tracker = Rc::new(());
        let mut arena = Arena::new();

        let handle = arena.insert(tracker.clone());
        assert_eq!(Rc::strong_count(&tracker), 2);

        drop(arena.remove(handle));
        assert_eq!(Rc::strong_count(&tracker), 1);

        arena.insert(tracker.clone());
        drop(arena);
        assert_eq!(Rc::strong_count(&tracker), 1);
    }
}
