use index::AlignmentMatrixIndex;
use ndarray::Array2;

use crate::{config::AlignmentMode, prosody::Annotation};

use super::{AlignmentParameters, PairwiseAlignment};

pub mod index;

/// The dynamic programming matrix of a pairwise alignment.
///
/// Cell `[i, j]` holds the best score of aligning the first `i` characters of `a`
/// with the first `j` characters of `b`, together with the step that reached it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentMatrix {
    matrix: Array2<AlignmentMatrixEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentMatrixEntry {
    pub score: f64,
    pub alignment_type: BaseAlignmentType,
    /// The amount of consumed diagonal steps, which is only larger than one for dialign segments.
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseAlignmentType {
    /// Marks the matrix origin at [0, 0], or the start of a local alignment.
    None,
    /// Consumes a character of `b` only.
    Insertion,
    /// Consumes a character of `a` only.
    Deletion,
    /// Consumes a character of both `a` and `b`.
    Match,
}

struct Scoring<'a> {
    a: &'a Annotation,
    b: &'a Annotation,
    score: &'a dyn Fn(usize, usize) -> f64,
    parameters: &'a AlignmentParameters,
}

impl AlignmentMatrix {
    pub fn new(a_length: usize, b_length: usize) -> Self {
        Self {
            matrix: Array2::default((a_length + 1, b_length + 1)),
        }
    }


    fn last(&self) -> AlignmentMatrixIndex {
        AlignmentMatrixIndex::new(self.matrix.dim().0 - 1, self.matrix.dim().1 - 1)
    }

    pub fn align(
        &mut self,
        a: &Annotation,
        b: &Annotation,
        score: &dyn Fn(usize, usize) -> f64,
        parameters: &AlignmentParameters,
    ) -> PairwiseAlignment {
        debug_assert_eq!(self.matrix.dim(), (a.len() + 1, b.len() + 1));
        let scoring = Scoring {
            a,
            b,
            score,
            parameters,
        };

        match parameters.mode {
            AlignmentMode::Global => self.align_global(&scoring, false),
            AlignmentMode::Overlap => self.align_global(&scoring, true),
            AlignmentMode::Local => self.align_local(&scoring),
            AlignmentMode::Dialign => self.align_dialign(&scoring),
        }
    }

    /// Needleman-Wunsch alignment, optionally without penalties for leading and trailing gaps.
    fn align_global(&mut self, scoring: &Scoring, free_end_gaps: bool) -> PairwiseAlignment {
        let last = self.last();
        self.matrix[[0, 0]] = AlignmentMatrixEntry::default();

        for a_index in 1..=last.a_index {
            let index = AlignmentMatrixIndex::new(a_index, 0);
            self.matrix[index] = self.compute_deletion_entry(index, scoring, free_end_gaps);
        }
        for b_index in 1..=last.b_index {
            let index = AlignmentMatrixIndex::new(0, b_index);
            self.matrix[index] = self.compute_insertion_entry(index, scoring, free_end_gaps);
        }

        for index in AlignmentMatrixIndex::inner_cells(last) {
            let entry = self.compute_best_entry(
                index,
                scoring,
                free_end_gaps && index.b_index == last.b_index,
                free_end_gaps && index.a_index == last.a_index,
            );
            self.matrix[index] = entry;
        }

        let (_, a, b) = self.traceback(last);
        PairwiseAlignment {
            a,
            b,
            similarity: self.matrix[last].score,
        }
    }

    /// Smith-Waterman alignment.
    ///
    /// The unaligned prefixes and suffixes are laid out against gaps, such that every character appears in the result.
    fn align_local(&mut self, scoring: &Scoring) -> PairwiseAlignment {
        let mut best = (AlignmentMatrixIndex::new(0, 0), 0.0);

        for index in AlignmentMatrixIndex::inner_cells(self.last()) {
            let mut entry = self.compute_best_entry(index, scoring, false, false);
            if entry.score <= 0.0 {
                entry = AlignmentMatrixEntry::default();
            }
            if entry.score > best.1 {
                best = (index, entry.score);
            }
            self.matrix[index] = entry;
        }

        let (end, similarity) = best;
        let (start, core_a, core_b) = self.traceback(end);
        let last = self.last();

        let mut a = Vec::with_capacity(last.a_index + last.b_index);
        let mut b = Vec::with_capacity(last.a_index + last.b_index);
        for position in 0..start.a_index {
            a.push(Some(position));
            b.push(None);
        }
        for position in 0..start.b_index {
            a.push(None);
            b.push(Some(position));
        }
        a.extend(core_a);
        b.extend(core_b);
        for position in end.a_index..last.a_index {
            a.push(Some(position));
            b.push(None);
        }
        for position in end.b_index..last.b_index {
            a.push(None);
            b.push(Some(position));
        }

        PairwiseAlignment { a, b, similarity }
    }

    /// Chains gap-free segments such that the sum of their scores is maximal.
    /// Gaps between segments are not penalised.
    fn align_dialign(&mut self, scoring: &Scoring) -> PairwiseAlignment {
        let last = self.last();
        self.matrix[[0, 0]] = AlignmentMatrixEntry::default();

        for a_index in 1..=last.a_index {
            self.matrix[[a_index, 0]] =
                AlignmentMatrixEntry::new(0.0, BaseAlignmentType::Deletion, 1);
        }
        for b_index in 1..=last.b_index {
            self.matrix[[0, b_index]] =
                AlignmentMatrixEntry::new(0.0, BaseAlignmentType::Insertion, 1);
        }

        for index in AlignmentMatrixIndex::inner_cells(last) {
            let mut entry = self.compute_deletion_entry(index, scoring, true);
            let insertion = self.compute_insertion_entry(index, scoring, true);
            if insertion.score > entry.score {
                entry = insertion;
            }

            let mut segment_score = 0.0;
            for length in 1..=index.a_index.min(index.b_index) {
                let Some(score) = scoring.match_score(index.a_index - length, index.b_index - length)
                else {
                    break;
                };
                segment_score += score;

                let candidate =
                    self.matrix[index.match_predecessor(length)].score + segment_score;
                if candidate > entry.score {
                    entry = AlignmentMatrixEntry::new(candidate, BaseAlignmentType::Match, length);
                }
            }

            self.matrix[index] = entry;
        }

        let (_, a, b) = self.traceback(last);
        PairwiseAlignment {
            a,
            b,
            similarity: self.matrix[last].score,
        }
    }

    /// Picks the best of match, deletion and insertion, preferring them in this order on ties.
    fn compute_best_entry(
        &self,
        index: AlignmentMatrixIndex,
        scoring: &Scoring,
        free_deletion: bool,
        free_insertion: bool,
    ) -> AlignmentMatrixEntry {
        let mut entry = self.compute_deletion_entry(index, scoring, free_deletion);

        let insertion_entry = self.compute_insertion_entry(index, scoring, free_insertion);
        if insertion_entry.score > entry.score {
            entry = insertion_entry;
        }

        if let Some(match_entry) = self.compute_match_entry(index, scoring) {
            if match_entry.score >= entry.score {
                entry = match_entry;
            }
        }

        entry
    }

    fn compute_insertion_entry(
        &self,
        index: AlignmentMatrixIndex,
        scoring: &Scoring,
        free: bool,
    ) -> AlignmentMatrixEntry {
        let alignment_type = BaseAlignmentType::Insertion;
        let predecessor = self.matrix[index.insertion_predecessor()];
        let gap_score = if free {
            0.0
        } else {
            scoring.gap_score(
                scoring.b.gap_weights[index.b_index - 1],
                predecessor.alignment_type == alignment_type,
            )
        };

        AlignmentMatrixEntry::new(predecessor.score + gap_score, alignment_type, 1)
    }

    fn compute_deletion_entry(
        &self,
        index: AlignmentMatrixIndex,
        scoring: &Scoring,
        free: bool,
    ) -> AlignmentMatrixEntry {
        let alignment_type = BaseAlignmentType::Deletion;
        let predecessor = self.matrix[index.deletion_predecessor()];
        let gap_score = if free {
            0.0
        } else {
            scoring.gap_score(
                scoring.a.gap_weights[index.a_index - 1],
                predecessor.alignment_type == alignment_type,
            )
        };

        AlignmentMatrixEntry::new(predecessor.score + gap_score, alignment_type, 1)
    }

    fn compute_match_entry(
        &self,
        index: AlignmentMatrixIndex,
        scoring: &Scoring,
    ) -> Option<AlignmentMatrixEntry> {
        let score = scoring.match_score(index.a_index - 1, index.b_index - 1)?;
        let predecessor = self.matrix[index.match_predecessor(1)];

        Some(AlignmentMatrixEntry::new(
            predecessor.score + score,
            BaseAlignmentType::Match,
            1,
        ))
    }

    /// Follows the alignment types from `index` back to an entry of type [`BaseAlignmentType::None`].
    ///
    /// Returns the index where the traceback stopped and the aligned positions of `a` and `b`.
    fn traceback(
        &self,
        mut index: AlignmentMatrixIndex,
    ) -> (AlignmentMatrixIndex, Vec<Option<usize>>, Vec<Option<usize>>) {
        let mut a = Vec::new();
        let mut b = Vec::new();

        loop {
            let entry = self.matrix[index];
            match entry.alignment_type {
                BaseAlignmentType::None => break,
                BaseAlignmentType::Match => {
                    for _ in 0..entry.length {
                        index = index.match_predecessor(1);
                        a.push(Some(index.a_index));
                        b.push(Some(index.b_index));
                    }
                }
                BaseAlignmentType::Deletion => {
                    index = index.deletion_predecessor();
                    a.push(Some(index.a_index));
                    b.push(None);
                }
                BaseAlignmentType::Insertion => {
                    index = index.insertion_predecessor();
                    a.push(None);
                    b.push(Some(index.b_index));
                }
            }
        }

        a.reverse();
        b.reverse();
        (index, a, b)
    }

    #[cfg(test)]
    fn manual_debug_fill(&mut self, entries: impl IntoIterator<Item = AlignmentMatrixEntry>) {
        let mut entries = entries.into_iter();
        for index in AlignmentMatrixIndex::inner_cells(self.last()) {
            self.matrix[index] = entries.next().unwrap();
        }
        assert!(entries.next().is_none());
    }
}

impl Scoring<'_> {
    /// The score of matching two positions, or `None` if their restrictions forbid it.
    fn match_score(&self, a_index: usize, b_index: usize) -> Option<f64> {
        let restricted_a = self.a.restrictions[a_index] < 0;
        let restricted_b = self.b.restrictions[b_index] < 0;
        if restricted_a != restricted_b {
            return None;
        }

        let score = (self.score)(a_index, b_index);
        if score > 0.0
            && self.a.prosodic_string.classes()[a_index]
                == self.b.prosodic_string.classes()[b_index]
        {
            Some(score * (1.0 + self.parameters.factor))
        } else {
            Some(score)
        }
    }

    fn gap_score(&self, weight: f64, extending: bool) -> f64 {
        if extending {
            weight * self.parameters.gep_scale
        } else {
            weight
        }
    }
}

impl AlignmentMatrixEntry {
    pub fn new(score: f64, alignment_type: BaseAlignmentType, length: usize) -> Self {
        Self {
            score,
            alignment_type,
            length,
        }
    }
}

impl Default for AlignmentMatrixEntry {
    fn default() -> Self {
        Self::new(0.0, BaseAlignmentType::None, 0)
    }
}

impl std::fmt::Display for AlignmentMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut score_column_widths = vec![0; self.matrix.dim().1];
        for a_index in 0..self.matrix.dim().0 {
            for (b_index, score_column_width) in score_column_widths.iter_mut().enumerate() {
                let width = format!("{:.1}", self.matrix[[a_index, b_index]].score).len();
                *score_column_width = width.max(*score_column_width);
            }
        }

        for a_index in 0..self.matrix.dim().0 {
            write!(f, "[ ")?;
            #[allow(clippy::needless_range_loop)]
            for b_index in 0..self.matrix.dim().1 {
                let entry = self.matrix[[a_index, b_index]];
                write!(
                    f,
                    "{: >width$.1}",
                    entry.score,
                    width = score_column_widths[b_index],
                )?;
                write!(
                    f,
                    "{} ",
                    match entry.alignment_type {
                        BaseAlignmentType::None => "N",
                        BaseAlignmentType::Insertion => "I",
                        BaseAlignmentType::Deletion => "D",
                        BaseAlignmentType::Match => "M",
                    }
                )?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
