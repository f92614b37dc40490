/// A vector of single-bit flags.
///
/// This is used over a `Vec<bool>` because the latter wastes 7 bits per flag.
/// Clearing the vector keeps its storage, so a flag set that is rebuilt every
/// frame does not reallocate once it has reached its working size.
pub struct FlagVec {
    data: Vec<u64>,
    length: usize,
}

impl Default for FlagVec {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagVec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            length: 0,
        }
    }

    /// Returns the index of the highest set bit + 1. This value is 'sticky' and
    /// will never decrease, even if that bit is later cleared, until
    /// [`FlagVec::clear`] is called.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if no flag has been set since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Sets the flag at the given index to the given value, and returns the old
    /// value.
    ///
    /// The vector will grow as needed to accommodate the given index.
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        let int_index = index / 64;
        let bit_index = index % 64;

        if int_index >= self.data.len() {
            self.data.resize(int_index + 1, 0);
        }

        self.length = self.length.max(index + 1);

        let old_value = self.data[int_index] & (1 << bit_index) != 0;

        self.data[int_index] =
            (self.data[int_index] & !(1 << bit_index)) | u64::from(value) << bit_index;

        old_value
    }

    /// Returns the value of the flag at the given index, or false if the index
    /// is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        let int_index = index / 64;
        let bit_index = index % 64;

        self.data
            .get(int_index)
            .map_or(false, |word| word & (1 << bit_index) != 0)
    }

    /// Unsets every flag without releasing storage.
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|word| *word = 0);
        self.length = 0;
    }

    /// Returns the number of set flags.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Iterates over the indices of all set flags in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.data
            .iter()
            .enumerate()
            .flat_map(|(int_index, &word)| {
                let mut remaining = word;
                std::iter::from_fn(move || {
                    if remaining == 0 {
                        None
                    } else {
                        let bit = remaining.trailing_zeros() as usize;
                        remaining &= remaining - 1;
                        Some(int_index * 64 + bit)
                    }
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanity() {
        let mut vec = FlagVec::new();

        assert_eq!(vec.len(), 0);
        assert!(!vec.get(0));
        assert!(!vec.get(1_000_000));

        vec.set(0, true);
        assert_eq!(vec.len(), 1);

        vec.set(1_000_000, true);
        assert_eq!(vec.len(), 1_000_001);
        assert_eq!(vec.data.len(), 1_000_000 / 64 + 1);

        vec.set(1_000_000, false);
        assert!(!vec.get(1_000_000));
        assert_eq!(vec.len(), 1_000_001);
    }

    #[test]
    fn length_does_not_shrink_on_lower_set() {
        let mut vec = FlagVec::new();
        vec.set(100, true);
        vec.set(3, true);
        assert_eq!(vec.len(), 101);
    }

    #[test]
    fn clear_keeps_storage() {
        let mut vec = FlagVec::new();
        vec.set(130, true);
        let words = vec.data.len();

        vec.clear();
        assert!(vec.is_empty());
        assert!(!vec.get(130));
        assert_eq!(vec.data.len(), words);
    }

    #[test]
    fn ones() {
        let mut vec = FlagVec::new();
        for index in [0, 5, 63, 64, 200] {
            vec.set(index, true);
        }
        vec.set(5, false);

        assert_eq!(vec.count_ones(), 4);
        assert_eq!(vec.iter_ones().collect::<Vec<_>>(), vec![0, 63, 64, 200]);
    }
}
