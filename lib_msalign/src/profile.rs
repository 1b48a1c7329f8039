use std::fmt::Display;

use log::trace;
use ndarray::{Array2, ArrayView1, Axis};

use crate::{
    error::{Error, Result},
    metrics::profile_score,
    pairwise::{AlignmentParameters, PairwiseAligner},
    prosody::{Annotation, consensus_sonority},
    residue::{ResidueId, Token},
    scorer::ScoreTable,
};

/// A rectangular matrix of tokens, one row per sequence and one column per alignment position.
///
/// Profiles are the partial alignments that are merged during progressive alignment,
/// and the final alignment is a profile as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    cells: Array2<Token>,
}

/// Aligns profiles against each other, treating each column as a single residue.
pub struct ProfileAligner<'a> {
    pub aligner: &'a dyn PairwiseAligner,
    pub scorer: &'a ScoreTable,
    /// The sonority values of the residues, indexed like the rows of `scorer`.
    pub sonority: &'a [Vec<u8>],
    pub parameters: &'a AlignmentParameters,
    /// The weight of pairs involving a gap in the column scores.
    pub gap_weight: f64,
}

impl Profile {
    /// A profile of a single unaligned sequence.
    pub fn from_residues(row: usize, length: usize) -> Self {
        Self {
            cells: Array2::from_shape_fn((1, length), |(_, position)| {
                Token::Residue(ResidueId::new(row, position))
            }),
        }
    }

    pub fn from_rows(rows: Vec<Vec<Token>>) -> Result<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        for (row, tokens) in rows.iter().enumerate() {
            if tokens.len() != width {
                return Err(Error::RaggedAlignment {
                    row,
                    expected: width,
                    actual: tokens.len(),
                });
            }
        }

        Ok(Self {
            cells: Array2::from_shape_fn((rows.len(), width), |(row, column)| rows[row][column]),
        })
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn get(&self, row: usize, column: usize) -> Token {
        self.cells[[row, column]]
    }

    pub fn set(&mut self, row: usize, column: usize, token: Token) {
        self.cells[[row, column]] = token;
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, Token> {
        self.cells.row(row)
    }

    pub fn column(&self, column: usize) -> ArrayView1<'_, Token> {
        self.cells.column(column)
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, Token>> {
        self.cells.rows().into_iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = ArrayView1<'_, Token>> {
        self.cells.columns().into_iter()
    }

    /// The residues of a row in alignment order.
    pub fn residues(&self, row: usize) -> impl Iterator<Item = ResidueId> + '_ {
        self.row(row).into_iter().filter_map(Token::residue)
    }

    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            cells: self.cells.select(Axis(0), rows),
        }
    }

    /// Removes all columns that contain no residue.
    pub fn without_gap_columns(&self) -> Self {
        let columns: Vec<_> = (0..self.width())
            .filter(|&column| self.column(column).iter().any(Token::is_residue))
            .collect();
        Self {
            cells: self.cells.select(Axis(1), &columns),
        }
    }

    /// Rearranges the columns such that column `i` of the result is `layout[i]` of `self`,
    /// or a gap column if `layout[i]` is `None`.
    pub fn expand(&self, layout: &[Option<usize>]) -> Self {
        Self {
            cells: Array2::from_shape_fn((self.height(), layout.len()), |(row, column)| {
                layout[column]
                    .map(|column| self.cells[[row, column]])
                    .unwrap_or(Token::Gap)
            }),
        }
    }

    /// Places the rows of `other` below the rows of `self`.
    pub fn stack(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width(), other.width());
        let height = self.height();
        Self {
            cells: Array2::from_shape_fn(
                (height + other.height(), self.width()),
                |(row, column)| {
                    if row < height {
                        self.cells[[row, column]]
                    } else {
                        other.cells[[row - height, column]]
                    }
                },
            ),
        }
    }

    /// Splits the profile into the given rows and the remaining rows, both without gap columns.
    ///
    /// Returns both parts and the row indices of the remaining rows.
    pub fn split(&self, rows: &[usize]) -> (Self, Self, Vec<usize>) {
        let remaining: Vec<_> = (0..self.height()).filter(|row| !rows.contains(row)).collect();
        (
            self.select_rows(rows).without_gap_columns(),
            self.select_rows(&remaining).without_gap_columns(),
            remaining,
        )
    }

    /// Interleaves the rows of two profiles of equal width, such that row `i` of `a` becomes row `rows_a[i]`
    /// and row `i` of `b` becomes row `rows_b[i]`.
    pub fn join(a: &Self, rows_a: &[usize], b: &Self, rows_b: &[usize]) -> Self {
        debug_assert_eq!(a.width(), b.width());
        debug_assert_eq!(a.height(), rows_a.len());
        debug_assert_eq!(b.height(), rows_b.len());

        let mut cells = Array2::default((rows_a.len() + rows_b.len(), a.width()));
        for (source, &target) in rows_a.iter().enumerate() {
            cells.row_mut(target).assign(&a.row(source));
        }
        for (source, &target) in rows_b.iter().enumerate() {
            cells.row_mut(target).assign(&b.row(source));
        }
        Self { cells }
    }
}

impl ProfileAligner<'_> {
    /// The annotation of the consensus sonority of each column.
    pub fn consensus_annotation(&self, profile: &Profile) -> Annotation {
        let consensus: Vec<u8> = profile
            .columns()
            .map(|column| {
                consensus_sonority(column.iter().map(|token| match token.residue() {
                    Some(residue) => self.sonority[residue.row][residue.position],
                    None => 0,
                }))
            })
            .collect();
        self.parameters.annotate(&consensus)
    }

    /// Aligns two profiles and returns both with gap columns inserted where they were aligned against a gap.
    pub fn align(&self, a: &Profile, b: &Profile) -> (Profile, Profile) {
        let annotation_a = self.consensus_annotation(a);
        let annotation_b = self.consensus_annotation(b);
        let alignment = self.aligner.align(
            &annotation_a,
            &annotation_b,
            &|i, j| profile_score(a.column(i), b.column(j), self.scorer, self.gap_weight),
            self.parameters,
        );
        trace!(
            "Aligned profiles of {} and {} rows with similarity {}",
            a.height(),
            b.height(),
            alignment.similarity
        );

        (a.expand(&alignment.a), b.expand(&alignment.b))
    }

    /// Aligns two profiles and stacks the result.
    pub fn merge(&self, a: &Profile, b: &Profile) -> Profile {
        let (a, b) = self.align(a, b);
        a.stack(&b)
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let mut once = true;
            for token in row {
                if once {
                    once = false;
                } else {
                    write!(f, "\t")?;
                }
                write!(f, "{token}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::AlignmentMode,
        model::ClassModel,
        pairwise::{AlignmentParameters, DynamicProgrammingAligner},
        residue::{ResidueId, ResidueIndex, Token},
        scorer::ScoreTable,
    };

    use super::{Profile, ProfileAligner};

    fn residue(row: usize, position: usize) -> Token {
        Token::Residue(ResidueId::new(row, position))
    }

    #[test]
    fn expand_and_strip() {
        let profile = Profile::from_residues(0, 2);
        let expanded = profile.expand(&[None, Some(0), None, Some(1)]);
        assert_eq!(expanded.width(), 4);
        assert_eq!(expanded.get(0, 0), Token::Gap);
        assert_eq!(expanded.get(0, 3), residue(0, 1));
        assert_eq!(expanded.without_gap_columns(), profile);
        assert_eq!(expanded.to_string(), "-\t1.1\t-\t1.2\n");
    }

    #[test]
    fn split_and_join() {
        let profile = Profile::from_rows(vec![
            vec![residue(0, 0), residue(0, 1), Token::Gap],
            vec![residue(1, 0), Token::Gap, Token::Gap],
            vec![Token::Gap, residue(2, 0), residue(2, 1)],
        ])
        .unwrap();

        let (a, b, remaining) = profile.split(&[1]);
        assert_eq!(remaining, vec![0, 2]);
        assert_eq!(a.width(), 1);
        assert_eq!(b.width(), 3);

        let joined = Profile::join(&a.expand(&[Some(0), None, None]), &[1], &b, &remaining);
        assert_eq!(joined, profile);
    }

    #[test]
    fn ragged_rows() {
        assert!(Profile::from_rows(vec![vec![Token::Gap], vec![]]).is_err());
        assert_eq!(Profile::from_rows(Vec::new()).unwrap().height(), 0);
    }

    #[test]
    fn merge_is_rectangular() {
        // T V T / T V - against T V
        let model = ClassModel::by_name("dolgo").unwrap();
        let rows: [&[char]; 3] = [&['T', 'V', 'T'], &['T', 'V'], &['T', 'V']];
        let scorer = ScoreTable::from_classes(ResidueIndex::new([3, 2, 2]), &rows, &model);
        let sonority = vec![vec![1, 7, 1], vec![1, 7], vec![1, 7]];
        let parameters = AlignmentParameters {
            mode: AlignmentMode::Global,
            gop: -3.0,
            gep_scale: 0.5,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            restricted: Vec::new(),
        };
        let profile_aligner = ProfileAligner {
            aligner: &DynamicProgrammingAligner,
            scorer: &scorer,
            sonority: &sonority,
            parameters: &parameters,
            gap_weight: 0.5,
        };

        let a = profile_aligner.merge(&Profile::from_residues(0, 3), &Profile::from_residues(1, 2));
        assert_eq!((a.height(), a.width()), (2, 3));
        let merged = profile_aligner.merge(&a, &Profile::from_residues(2, 2));

        assert_eq!(merged.height(), 3);
        assert!(merged.width() >= 3);
        for row in 0..3 {
            assert_eq!(
                merged.residues(row).collect::<Vec<_>>(),
                scorer.index().residues(row).collect::<Vec<_>>()
            );
        }
        assert_eq!(merged.get(2, 0), residue(2, 0));
        assert_eq!(merged.get(2, 1), residue(2, 1));
        assert_eq!(merged.get(2, 2), Token::Gap);
    }
}
