use rand::Rng;

/// Source of uniform indexes, swappable so selections can be pinned in tests.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn index(&self, len: usize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always returns the same index, clamped to the slice length.
#[derive(Debug, Clone, Copy)]
pub struct FixedIndex(pub usize);

impl RandomSource for FixedIndex {
    fn index(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Picks one element of `items` using `random`; `None` when empty.
pub fn choose<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(random.index(items.len()))
}
