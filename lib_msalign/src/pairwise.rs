use alignment_matrix::AlignmentMatrix;
use log::trace;

use crate::{
    config::{AlignmentMode, Scale},
    prosody::{Annotation, ProsodicClass},
    residue::ResidueId,
};

pub mod alignment_matrix;
pub mod table;

#[cfg(test)]
mod tests;

/// The parameters of a single pairwise alignment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentParameters {
    pub mode: AlignmentMode,
    /// The gap opening penalty, usually negative.
    pub gop: f64,
    /// Multiplied with the gap weight when a gap is extended.
    pub gep_scale: f64,
    pub scale: Scale,
    /// Bonus for matching segments of the same prosodic class.
    pub factor: f64,
    pub restricted: Vec<ProsodicClass>,
}

/// The result of aligning two sequences.
///
/// Both sides have the same length, and `None` marks a gap.
/// Every position of each input sequence appears exactly once and in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignment {
    pub a: Vec<Option<usize>>,
    pub b: Vec<Option<usize>>,
    pub similarity: f64,
}

/// Aligns two annotated sequences given a score function over their positions.
pub trait PairwiseAligner {
    fn align(
        &self,
        a: &Annotation,
        b: &Annotation,
        score: &dyn Fn(usize, usize) -> f64,
        parameters: &AlignmentParameters,
    ) -> PairwiseAlignment;

    /// Aligns all pairs `(i, j)` with `i < j` in row-major order.
    ///
    /// The score function receives residues whose rows are the indices in `annotations`.
    fn align_all(
        &self,
        annotations: &[Annotation],
        score: &dyn Fn(ResidueId, ResidueId) -> f64,
        parameters: &AlignmentParameters,
    ) -> Vec<PairwiseAlignment> {
        let mut result = Vec::new();
        for (i, a) in annotations.iter().enumerate() {
            for (j, b) in annotations.iter().enumerate().skip(i + 1) {
                result.push(self.align(
                    a,
                    b,
                    &|p, q| score(ResidueId::new(i, p), ResidueId::new(j, q)),
                    parameters,
                ));
            }
        }
        result
    }
}

/// A dynamic programming aligner supporting all [`AlignmentMode`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicProgrammingAligner;

impl AlignmentParameters {
    pub fn annotate(&self, sonority: &[u8]) -> Annotation {
        Annotation::new(
            sonority,
            self.gop,
            self.scale,
            self.factor,
            &self.restricted,
        )
    }
}

impl PairwiseAligner for DynamicProgrammingAligner {
    fn align(
        &self,
        a: &Annotation,
        b: &Annotation,
        score: &dyn Fn(usize, usize) -> f64,
        parameters: &AlignmentParameters,
    ) -> PairwiseAlignment {
        let mut matrix = AlignmentMatrix::new(a.len(), b.len());
        let alignment = matrix.align(a, b, score, parameters);
        trace!(
            "Aligned {} against {} in {} mode with similarity {}:\n{matrix}",
            a.prosodic_string, b.prosodic_string, parameters.mode, alignment.similarity
        );
        alignment
    }
}

impl PairwiseAlignment {
    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}
