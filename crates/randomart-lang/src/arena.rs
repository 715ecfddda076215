use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::Index,
};

/// A type-safe position of an element stored in an [`Arena`].
///
/// Uses phantom data to ensure type safety - an `ArenaId<A>` cannot be used
/// to access elements from an `Arena<B>`. Because it is a position and not a
/// reference, it stays valid when the arena relocates its buffer.
pub struct ArenaId<T> {
    id: u32,
    _phantom_data: PhantomData<T>,
}

impl<T> Copy for ArenaId<T> {}

impl<T> Clone for ArenaId<T> {
    #[inline(always)]
    fn clone(&self) -> ArenaId<T> {
        *self
    }
}

impl<T> PartialEq for ArenaId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ArenaId<T> {}

impl<T> PartialOrd for ArenaId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ArenaId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for ArenaId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ArenaId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

impl<T> From<u32> for ArenaId<T> {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl<T> From<usize> for ArenaId<T> {
    fn from(id: usize) -> Self {
        Self::new(id as u32)
    }
}

impl<T> ArenaId<T> {
    /// Creates a new arena identifier from a raw `u32` index.
    pub const fn new(id: u32) -> ArenaId<T> {
        Self {
            id,
            _phantom_data: PhantomData,
        }
    }

    /// Returns the position of the element inside the arena buffer.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.id as usize
    }
}

/// An append-only arena that stores its elements in one contiguous buffer.
///
/// Capacity is managed explicitly: when an allocation would exceed it, the
/// buffer is reallocated to twice its size. Elements are addressed by
/// [`ArenaId`], so growth never has to repair references between elements.
#[derive(Debug, Clone, Default)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    /// Creates a new arena with the specified initial capacity.
    pub fn new(capacity: usize) -> Self {
        let mut items = Vec::new();
        reserve_or_abort(&mut items, capacity);
        Arena { items }
    }

    /// Allocates a value in the arena and returns its identifier.
    pub fn alloc(&mut self, value: T) -> ArenaId<T> {
        if self.items.len() >= self.items.capacity() {
            self.grow();
        }

        let arena_id = self.items.len() as u32;
        self.items.push(value);
        ArenaId::new(arena_id)
    }

    /// Makes sure the arena can hold `total` elements without growing again.
    pub fn reserve_total(&mut self, total: usize) {
        let additional = total.saturating_sub(self.items.len());
        if self.items.capacity() < total {
            reserve_or_abort(&mut self.items, additional);
        }
    }

    /// Drops every element at or after `len`. Capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Removes every element. Capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the number of elements in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots allocated for the arena.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Returns a reference to the element at the given `ArenaId`, or `None` if out of bounds.
    pub fn get(&self, id: ArenaId<T>) -> Option<&T> {
        self.items.get(id.index())
    }

    /// Iterates over the elements together with their identifiers, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaId<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ArenaId::from(i), item))
    }

    fn grow(&mut self) {
        let additional = self.items.capacity().max(1);
        reserve_or_abort(&mut self.items, additional);
        log::debug!("Arena grown to {} slots", self.items.capacity());
    }
}

impl<T> Index<ArenaId<T>> for Arena<T> {
    type Output = T;

    fn index(&self, index: ArenaId<T>) -> &Self::Output {
        &self.items[index.index()]
    }
}

fn reserve_or_abort<T>(items: &mut Vec<T>, additional: usize) {
    if let Err(e) = items.try_reserve_exact(additional) {
        panic!(
            "Memory allocation of {} elements failed: {e}",
            items.len() + additional
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![1, 2, 3], 1, 2)]
    #[case(vec![1, 2, 3], 0, 1)]
    #[case(vec![1, 2, 3], 2, 3)]
    fn test_get(#[case] values: Vec<i32>, #[case] index: u32, #[case] expected: i32) {
        let mut arena = Arena::new(values.len());
        for v in values {
            arena.alloc(v);
        }
        let id = ArenaId::new(index);
        assert_eq!(arena[id], expected);
        assert_eq!(arena.get(id), Some(&expected));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let arena: Arena<i32> = Arena::new(4);
        assert_eq!(arena.get(ArenaId::new(0)), None);
    }

    #[rstest]
    #[case(vec![1, 2, 3], 3)]
    #[case(Vec::new(), 0)]
    fn test_len(#[case] values: Vec<i32>, #[case] expected: usize) {
        let mut arena = Arena::new(values.len().max(1));
        for v in values {
            arena.alloc(v);
        }
        assert_eq!(arena.len(), expected);
        assert_eq!(arena.is_empty(), expected == 0);
    }

    #[rstest]
    #[case::one(1, 1, 1)]
    #[case::exact(4, 4, 4)]
    #[case::doubles_once(4, 5, 8)]
    #[case::doubles_twice(4, 9, 16)]
    fn test_alloc_doubles_capacity(
        #[case] initial: usize,
        #[case] count: usize,
        #[case] expected: usize,
    ) {
        let mut arena = Arena::new(initial);
        for v in 0..count {
            arena.alloc(v);
        }
        assert_eq!(arena.capacity(), expected);
    }

    #[test]
    fn test_ids_survive_growth() {
        let mut arena = Arena::new(1);
        let ids = (0..100).map(|v| (arena.alloc(v * 3), v * 3)).collect::<Vec<_>>();

        for (id, value) in ids {
            assert_eq!(arena[id], value);
        }
    }

    #[test]
    fn test_truncate_keeps_capacity() {
        let mut arena = Arena::new(2);
        for v in 0..8 {
            arena.alloc(v);
        }
        let capacity = arena.capacity();
        arena.truncate(3);

        assert_eq!(arena.len(), 3);
        assert_eq!(arena.capacity(), capacity);
        assert_eq!(arena.alloc(42), ArenaId::new(3));
    }

    #[test]
    fn test_reserve_total() {
        let mut arena: Arena<u8> = Arena::new(2);
        arena.reserve_total(50);
        assert!(arena.capacity() >= 50);
    }

    #[test]
    fn test_from() {
        let id_u32: ArenaId<i32> = 5u32.into();
        assert_eq!(id_u32.index(), 5);

        let id_usize: ArenaId<i32> = 10usize.into();
        assert_eq!(id_usize.index(), 10);
    }
}
