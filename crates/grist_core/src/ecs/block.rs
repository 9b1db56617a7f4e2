// block.rs - Growable typed storage block
//
// Blocks are the single backing array type for fields, entity sets and the
// registry. Growth is geometric: doubling while small, +25% once large, so
// repeated single-slot growth stays amortized O(1).

/// A contiguously stored, exclusively owned, growable typed array.
///
/// The logical length only ever grows; every slot below it is initialized,
/// either to the fill value supplied at growth time or by a later write.
/// Allocation failure aborts (not caught anywhere in the core).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<T> {
    data: Vec<T>,
}

/// Below this length, growth doubles; at or above it, growth adds 25%.
const DOUBLING_LIMIT: usize = 64;

impl<T: Clone> Block<T> {
    /// Create an empty block.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a block of `len` slots, each set to `fill`.
    pub fn with_len(len: usize, fill: T) -> Self {
        Self {
            data: vec![fill; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resize so that at least `min_len` slots exist, with extra headroom
    /// for further growth. Existing slots are preserved unchanged; newly
    /// exposed slots are set to `fill`. Never shrinks.
    pub fn grow(&mut self, min_len: usize, fill: T) {
        if self.data.len() < min_len {
            let target = if min_len < DOUBLING_LIMIT {
                (min_len * 2).max(4)
            } else {
                min_len * 5 / 4
            };
            self.data.resize(target, fill);
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Clone> Default for Block<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> std::ops::Index<usize> for Block<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T: Clone> std::ops::IndexMut<usize> for Block<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}
