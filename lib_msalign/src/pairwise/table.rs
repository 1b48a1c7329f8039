use log::trace;
use ndarray::Array2;

use crate::{
    error::{Error, Result},
    residue::{ResidueId, Token},
    scorer::ScoreTable,
};

use super::{AlignmentParameters, PairwiseAligner, PairwiseAlignment};

/// Two aligned rows of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub a: Vec<Token>,
    pub b: Vec<Token>,
    pub similarity: f64,
}

/// The pairwise alignments of all pairs of unique rows.
///
/// Cell `(i, j)` with `i != j` holds the alignment of row `i` against row `j`,
/// and cell `(j, i)` holds the same alignment with both sides exchanged.
/// The diagonal holds each row against itself, scored by the sum of its self-scores.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignmentTable {
    height: usize,
    cells: Vec<AlignedPair>,
}

/// Symmetric normalised distances between unique rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix(Array2<f64>);

impl AlignedPair {
    fn from_positions(alignment: PairwiseAlignment, row_a: usize, row_b: usize) -> Self {
        let tokens = |positions: Vec<Option<usize>>, row| {
            positions
                .into_iter()
                .map(|position| Token::from(position.map(|position| ResidueId::new(row, position))))
                .collect()
        };

        Self {
            a: tokens(alignment.a, row_a),
            b: tokens(alignment.b, row_b),
            similarity: alignment.similarity,
        }
    }

    fn mirrored(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.a.clone(),
            similarity: self.similarity,
        }
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

impl PairwiseAlignmentTable {
    /// Aligns all pairs of rows.
    ///
    /// `sonority` holds the sonority values of each row, and the scores of `scorer` are addressed by row index.
    pub fn compute(
        aligner: &dyn PairwiseAligner,
        sonority: &[Vec<u8>],
        scorer: &ScoreTable,
        parameters: &AlignmentParameters,
    ) -> Result<Self> {
        let height = sonority.len();
        let annotations: Vec<_> = sonority
            .iter()
            .map(|sonority| parameters.annotate(sonority))
            .collect();
        let alignments = aligner.align_all(&annotations, &|a, b| scorer.get(a, b), parameters);
        let expected = height * height.saturating_sub(1) / 2;
        if alignments.len() != expected {
            return Err(Error::PairwiseAlignmentCount {
                expected,
                actual: alignments.len(),
            });
        }
        let upper: Vec<_> = upper_triangle_pairs(height)
            .zip(alignments)
            .map(|((i, j), alignment)| AlignedPair::from_positions(alignment, i, j))
            .collect();

        let mut cells = Vec::with_capacity(height * height);
        for i in 0..height {
            for j in 0..height {
                let cell = match i.cmp(&j) {
                    std::cmp::Ordering::Less => upper[upper_triangle_index(height, i, j)].clone(),
                    std::cmp::Ordering::Greater => {
                        upper[upper_triangle_index(height, j, i)].mirrored()
                    }
                    std::cmp::Ordering::Equal => {
                        let tokens: Vec<_> = scorer.index().residues(i).map(Token::Residue).collect();
                        let similarity = scorer
                            .index()
                            .residues(i)
                            .map(|residue| scorer.get(residue, residue))
                            .sum();
                        AlignedPair {
                            a: tokens.clone(),
                            b: tokens,
                            similarity,
                        }
                    }
                };
                trace!("Similarity of rows {i} and {j}: {}", cell.similarity);
                cells.push(cell);
            }
        }

        Ok(Self { height, cells })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, i: usize, j: usize) -> &AlignedPair {
        &self.cells[i * self.height + j]
    }

    pub fn similarity(&self, i: usize, j: usize) -> f64 {
        self.get(i, j).similarity
    }

    /// The normalised distance `1 - 2 s(i, j) / (s(i, i) + s(j, j))`.
    ///
    /// Rows whose self-similarities do not sum to a positive value are maximally distant from all other rows.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }

        let denominator = self.similarity(i, i) + self.similarity(j, j);
        if denominator <= 0.0 {
            1.0
        } else {
            1.0 - 2.0 * self.similarity(i, j) / denominator
        }
    }

    pub fn distance_matrix(&self) -> DistanceMatrix {
        DistanceMatrix(Array2::from_shape_fn(
            (self.height, self.height),
            |(i, j)| self.distance(i, j),
        ))
    }
}

impl DistanceMatrix {
    pub fn new(distances: Array2<f64>) -> Self {
        debug_assert_eq!(distances.nrows(), distances.ncols());
        Self(distances)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0[[i, j]]
    }

    pub fn len(&self) -> usize {
        self.0.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The mean over row `i`, including the zero distance to itself.
    pub fn row_mean(&self, i: usize) -> f64 {
        self.0.row(i).mean().unwrap_or(0.0)
    }

    pub fn mean(&self) -> f64 {
        self.0.mean().unwrap_or(0.0)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.0
    }
}

/// The index of pair `(i, j)` with `i < j` in the row-major enumeration of the upper triangle.
fn upper_triangle_index(height: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < height);
    i * height - i * (i + 1) / 2 + (j - i - 1)
}

/// The pairs `(i, j)` with `i < j` in the order of [`PairwiseAligner::align_all`].
fn upper_triangle_pairs(height: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..height).flat_map(move |i| (i + 1..height).map(move |j| (i, j)))
}

#[cfg(test)]
mod tests {
    use crate::{
        config::AlignmentMode,
        error::Error,
        model::ClassModel,
        pairwise::{AlignmentParameters, DynamicProgrammingAligner, PairwiseAligner, PairwiseAlignment},
        prosody::Annotation,
        residue::{ResidueId, ResidueIndex, Token},
        scorer::ScoreTable,
    };

    use super::{PairwiseAlignmentTable, upper_triangle_index, upper_triangle_pairs};

    #[test]
    fn upper_triangle_enumeration() {
        for (k, (i, j)) in upper_triangle_pairs(5).enumerate() {
            assert!(i < j);
            assert_eq!(upper_triangle_index(5, i, j), k);
        }
        assert_eq!(upper_triangle_pairs(5).count(), 10);
        assert_eq!(upper_triangle_pairs(1).count(), 0);
    }

    /// Drops the last alignment of each batch.
    struct IncompleteAligner;

    impl PairwiseAligner for IncompleteAligner {
        fn align(
            &self,
            a: &Annotation,
            b: &Annotation,
            score: &dyn Fn(usize, usize) -> f64,
            parameters: &AlignmentParameters,
        ) -> PairwiseAlignment {
            DynamicProgrammingAligner.align(a, b, score, parameters)
        }

        fn align_all(
            &self,
            annotations: &[Annotation],
            score: &dyn Fn(ResidueId, ResidueId) -> f64,
            parameters: &AlignmentParameters,
        ) -> Vec<PairwiseAlignment> {
            let mut alignments = DynamicProgrammingAligner.align_all(annotations, score, parameters);
            alignments.pop();
            alignments
        }
    }

    fn table(classes: &[&[char]]) -> PairwiseAlignmentTable {
        let model = ClassModel::by_name("dolgo").unwrap();
        let index = ResidueIndex::new(classes.iter().map(|row| row.len()));
        let scorer = ScoreTable::from_classes(index, classes, &model);
        let sonority: Vec<Vec<u8>> = classes
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&class| if class == 'V' { 7 } else { 1 })
                    .collect()
            })
            .collect();
        let parameters = AlignmentParameters {
            mode: AlignmentMode::Global,
            gop: -3.0,
            gep_scale: 0.5,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            restricted: Vec::new(),
        };

        PairwiseAlignmentTable::compute(&DynamicProgrammingAligner, &sonority, &scorer, &parameters)
            .unwrap()
    }

    #[test]
    fn missing_alignments_are_an_error() {
        let model = ClassModel::by_name("dolgo").unwrap();
        let rows: [&[char]; 3] = [&['T', 'V'], &['T', 'V'], &['K', 'V']];
        let scorer = ScoreTable::from_classes(ResidueIndex::new([2, 2, 2]), &rows, &model);
        let sonority = vec![vec![1, 7]; 3];
        let parameters = AlignmentParameters {
            mode: AlignmentMode::Global,
            gop: -3.0,
            gep_scale: 0.5,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            restricted: Vec::new(),
        };

        let result = PairwiseAlignmentTable::compute(&IncompleteAligner, &sonority, &scorer, &parameters);
        assert!(matches!(
            result,
            Err(Error::PairwiseAlignmentCount {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn diagonal_and_mirror() {
        let table = table(&[&['T', 'V', 'T'], &['T', 'V'], &['K', 'V', 'T']]);
        assert_eq!(table.height(), 3);

        // T T match 10, V V 5
        assert_eq!(table.similarity(0, 0), 25.0);
        assert_eq!(table.similarity(1, 1), 15.0);
        assert_eq!(
            table.get(1, 1).a,
            vec![
                Token::Residue(ResidueId::new(1, 0)),
                Token::Residue(ResidueId::new(1, 1))
            ]
        );

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(table.get(i, j).a, table.get(j, i).b);
                assert_eq!(table.similarity(i, j), table.similarity(j, i));
                assert_eq!(table.get(i, j).a.len(), table.get(i, j).b.len());
            }
        }
    }

    #[test]
    fn distances() {
        let table = table(&[&['T', 'V', 'T'], &['T', 'V', 'T'], &['P', 'V']]);
        let distances = table.distance_matrix();

        assert_eq!(distances.len(), 3);
        assert_eq!(distances.get(0, 1), 0.0);
        assert_eq!(distances.get(1, 1), 0.0);
        assert!(distances.get(0, 2) > 0.0);
        assert_eq!(distances.get(0, 2), distances.get(2, 0));
        assert!(distances.row_mean(2) > distances.mean());
    }
}
