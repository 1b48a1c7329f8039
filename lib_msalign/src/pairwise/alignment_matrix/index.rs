use std::ops::{Index, IndexMut};

use ndarray::Array2;

/// A cell of the alignment matrix, i.e. the amount of consumed characters of `a` and `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentMatrixIndex {
    pub(in crate::pairwise) a_index: usize,
    pub(in crate::pairwise) b_index: usize,
}

impl AlignmentMatrixIndex {
    pub fn new(a_index: usize, b_index: usize) -> Self {
        Self { a_index, b_index }
    }

    /// The cells that consume a character of both `a` and `b`, up to and including `last`.
    ///
    /// The cells are visited column by column, so every cell comes after all of its predecessors.
    pub fn inner_cells(last: Self) -> impl Iterator<Item = Self> {
        (1..=last.b_index).flat_map(move |b_index| {
            (1..=last.a_index).map(move |a_index| Self::new(a_index, b_index))
        })
    }

    /// The predecessor when consuming a character of `b` only.
    pub fn insertion_predecessor(&self) -> Self {
        debug_assert!(self.b_index > 0);

        Self {
            a_index: self.a_index,
            b_index: self.b_index - 1,
        }
    }

    /// The predecessor when consuming a character of `a` only.
    pub fn deletion_predecessor(&self) -> Self {
        debug_assert!(self.a_index > 0);

        Self {
            a_index: self.a_index - 1,
            b_index: self.b_index,
        }
    }

    /// The predecessor when consuming `length` characters of both `a` and `b`.
    pub fn match_predecessor(&self, length: usize) -> Self {
        debug_assert!(self.a_index >= length);
        debug_assert!(self.b_index >= length);

        Self {
            a_index: self.a_index - length,
            b_index: self.b_index - length,
        }
    }
}

impl<T> Index<AlignmentMatrixIndex> for Array2<T> {
    type Output = <Array2<T> as Index<[usize; 2]>>::Output;

    fn index(&self, index: AlignmentMatrixIndex) -> &Self::Output {
        &self[[index.a_index, index.b_index]]
    }
}

impl<T> IndexMut<AlignmentMatrixIndex> for Array2<T> {
    fn index_mut(&mut self, index: AlignmentMatrixIndex) -> &mut Self::Output {
        &mut self[[index.a_index, index.b_index]]
    }
}

#[cfg(test)]
mod tests {
    use super::AlignmentMatrixIndex;

    #[test]
    fn inner_cells_follow_their_predecessors() {
        let cells: Vec<_> = AlignmentMatrixIndex::inner_cells(AlignmentMatrixIndex::new(2, 3))
            .map(|index| (index.a_index, index.b_index))
            .collect();
        assert_eq!(cells, [(1, 1), (2, 1), (1, 2), (2, 2), (1, 3), (2, 3)]);

        for (position, &(a_index, b_index)) in cells.iter().enumerate() {
            let index = AlignmentMatrixIndex::new(a_index, b_index);
            for predecessor in [
                index.insertion_predecessor(),
                index.deletion_predecessor(),
                index.match_predecessor(1),
            ] {
                let predecessor = (predecessor.a_index, predecessor.b_index);
                if predecessor.0 > 0 && predecessor.1 > 0 {
                    assert!(cells[..position].contains(&predecessor));
                }
            }
        }
    }

    #[test]
    fn empty_sequences_have_no_inner_cells() {
        let last = AlignmentMatrixIndex::new(3, 0);
        assert_eq!(AlignmentMatrixIndex::inner_cells(last).count(), 0);
        let last = AlignmentMatrixIndex::new(0, 0);
        assert_eq!(AlignmentMatrixIndex::inner_cells(last).count(), 0);
    }
}
