//! Consistency libraries in the style of T-Coffee.
//!
//! A library scores pairs of residues by how well they are supported by a set of pairwise alignments,
//! both directly and via a third sequence.

use log::{debug, info};

use crate::{
    error::Result,
    pairwise::{
        AlignmentParameters, PairwiseAligner,
        table::{AlignedPair, PairwiseAlignmentTable},
    },
    residue::ResidueId,
    scorer::ScoreTable,
};

/// Builds a library from the pairwise alignments computed with each of the given parameter presets.
pub fn build_library(
    aligner: &dyn PairwiseAligner,
    sonority: &[Vec<u8>],
    classes: &ScoreTable,
    presets: &[AlignmentParameters],
) -> Result<ScoreTable> {
    let mut library = ScoreTable::zeros(classes.index().clone());

    for parameters in presets {
        let table = PairwiseAlignmentTable::compute(aligner, sonority, classes, parameters)?;
        extend_library(&mut library, &table, classes);
        debug!(
            "Extended the library with the {} alignments",
            parameters.mode
        );
    }

    info!(
        "Built a library over {} residues from {} presets",
        classes.index().len(),
        presets.len()
    );
    Ok(library)
}

/// Adds the residue pairs of all alignments in `table` to `library`.
///
/// Every pair of residues aligned directly adds the mean of its class score and the alignment's similarity per column.
/// Every pair of residues that is aligned to the same residue of a third sequence adds the mean of its class score
/// and the lower similarity of both alignments with the third sequence, divided by their mean length.
pub fn extend_library(library: &mut ScoreTable, table: &PairwiseAlignmentTable, classes: &ScoreTable) {
    let height = table.height();

    for i in 0..height {
        for j in i..height {
            let alignment = table.get(i, j);
            if alignment.is_empty() {
                continue;
            }
            let similarity = alignment.similarity / alignment.len() as f64;

            for (m, n) in alignment.a.iter().zip(&alignment.b) {
                if let (Some(m), Some(n)) = (m.residue(), n.residue()) {
                    library.add_symmetric(m, n, (similarity + classes.get(m, n)) / 2.0);
                }
            }
        }
    }

    for i in 0..height {
        for j in i..height {
            for k in (0..height).filter(|&k| k != i && k != j) {
                let alignment_ik = table.get(i, k);
                let alignment_jk = table.get(j, k);
                let partners_i = partners(alignment_ik, classes.index().row_length(k));
                let partners_j = partners(alignment_jk, classes.index().row_length(k));
                let similarity = alignment_ik.similarity.min(alignment_jk.similarity)
                    / ((alignment_ik.len() + alignment_jk.len()) as f64 / 2.0);

                for (value_i, value_j) in partners_i.into_iter().zip(partners_j) {
                    if let (Some(value_i), Some(value_j)) = (value_i, value_j) {
                        library.add_symmetric(
                            value_i,
                            value_j,
                            (similarity + classes.get(value_i, value_j)) / 2.0,
                        );
                    }
                }
            }
        }
    }
}

/// For each position of the `b` side, the residue it is aligned with on the `a` side.
fn partners(alignment: &AlignedPair, length: usize) -> Vec<Option<ResidueId>> {
    let mut partners = vec![None; length];
    for (a, b) in alignment.a.iter().zip(&alignment.b) {
        if let Some(b) = b.residue() {
            partners[b.position] = a.residue();
        }
    }
    partners
}

#[cfg(test)]
mod tests {
    use crate::{
        config::AlignmentMode,
        model::ClassModel,
        pairwise::{AlignmentParameters, DynamicProgrammingAligner},
        residue::{ResidueId, ResidueIndex},
        scorer::ScoreTable,
    };

    use super::build_library;

    fn preset(mode: AlignmentMode, gop: f64) -> AlignmentParameters {
        AlignmentParameters {
            mode,
            gop,
            gep_scale: 0.5,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            restricted: Vec::new(),
        }
    }

    #[test]
    fn library_is_symmetric() {
        let model = ClassModel::by_name("dolgo").unwrap();
        let rows: [&[char]; 3] = [&['T', 'V', 'R', 'T'], &['T', 'V', 'T'], &['W', 'V', 'R']];
        let index = ResidueIndex::new(rows.iter().map(|row| row.len()));
        let classes = ScoreTable::from_classes(index, &rows, &model);
        let sonority = vec![vec![1, 7, 5, 1], vec![1, 7, 1], vec![6, 7, 5]];

        let library = build_library(
            &DynamicProgrammingAligner,
            &sonority,
            &classes,
            &[
                preset(AlignmentMode::Global, -3.0),
                preset(AlignmentMode::Local, -1.0),
            ],
        )
        .unwrap();

        assert!(library.is_symmetric());
        // The initial consonants of the first two rows are aligned directly and via the third row.
        assert!(library.get(ResidueId::new(0, 0), ResidueId::new(1, 0)) > 0.0);
        assert_eq!(
            library.get(ResidueId::new(0, 0), ResidueId::new(1, 0)),
            library.get(ResidueId::new(1, 0), ResidueId::new(0, 0))
        );
    }

    #[test]
    fn single_row_library() {
        let model = ClassModel::by_name("dolgo").unwrap();
        let rows: [&[char]; 1] = [&['T', 'V']];
        let classes = ScoreTable::from_classes(ResidueIndex::new([2]), &rows, &model);

        let library = build_library(
            &DynamicProgrammingAligner,
            &[vec![1, 7]],
            &classes,
            &[preset(AlignmentMode::Global, -3.0)],
        )
        .unwrap();

        // The self-alignment contributes (15 / 2 + 10) / 2 to the first residue.
        assert_eq!(library.get(ResidueId::new(0, 0), ResidueId::new(0, 0)), 8.75);
        assert_eq!(library.get(ResidueId::new(0, 0), ResidueId::new(0, 1)), 0.0);
    }
}
