use crate::{
    config::AlignmentMode,
    prosody::{Annotation, ProsodicClass},
    residue::ResidueId,
};

use super::{AlignmentParameters, DynamicProgrammingAligner, PairwiseAligner};

fn parameters(mode: AlignmentMode) -> AlignmentParameters {
    AlignmentParameters {
        mode,
        gop: -2.0,
        gep_scale: 0.5,
        scale: (1.0, 1.0, 1.0),
        factor: 0.0,
        restricted: vec![ProsodicClass::Tone],
    }
}

/// Annotates a sequence of consonants.
fn plain(length: usize, parameters: &AlignmentParameters) -> Annotation {
    parameters.annotate(&vec![1; length])
}

fn identity<'a>(a: &'a str, b: &'a str) -> impl Fn(usize, usize) -> f64 + 'a {
    move |i, j| {
        if a.as_bytes()[i] == b.as_bytes()[j] {
            1.0
        } else {
            -1.0
        }
    }
}

#[test]
fn global_identical() {
    let parameters = parameters(AlignmentMode::Global);
    let annotation = plain(4, &parameters);
    let alignment = DynamicProgrammingAligner.align(
        &annotation,
        &annotation,
        &identity("abcd", "abcd"),
        &parameters,
    );

    assert_eq!(alignment.similarity, 4.0);
    assert_eq!(alignment.a, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(alignment.a, alignment.b);
}

#[test]
fn overlap_ignores_end_gaps() {
    let parameters = parameters(AlignmentMode::Overlap);
    let annotation = plain(3, &parameters);
    let alignment = DynamicProgrammingAligner.align(
        &annotation,
        &annotation,
        &identity("xyz", "yzw"),
        &parameters,
    );

    assert_eq!(alignment.similarity, 2.0);
    assert_eq!(alignment.a, vec![Some(0), Some(1), Some(2), None]);
    assert_eq!(alignment.b, vec![None, Some(0), Some(1), Some(2)]);
}

#[test]
fn local_keeps_all_residues() {
    let parameters = parameters(AlignmentMode::Local);
    let alignment = DynamicProgrammingAligner.align(
        &plain(3, &parameters),
        &plain(4, &parameters),
        &identity("xyz", "wyzv"),
        &parameters,
    );

    assert_eq!(alignment.similarity, 2.0);
    assert_eq!(alignment.a, vec![Some(0), None, Some(1), Some(2), None]);
    assert_eq!(alignment.b, vec![None, Some(0), Some(1), Some(2), Some(3)]);
}

#[test]
fn dialign_chains_segments() {
    let parameters = parameters(AlignmentMode::Dialign);
    let alignment = DynamicProgrammingAligner.align(
        &plain(4, &parameters),
        &plain(5, &parameters),
        &identity("abcd", "abxcd"),
        &parameters,
    );

    assert_eq!(alignment.similarity, 4.0);
    assert_eq!(alignment.a, vec![Some(0), Some(1), None, Some(2), Some(3)]);
    assert_eq!(alignment.b, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
}

#[test]
fn restricted_positions_are_not_matched() {
    let parameters = parameters(AlignmentMode::Global);
    // t a ³ against t a n
    let a = parameters.annotate(&[1, 7, 9]);
    let b = parameters.annotate(&[1, 7, 1]);
    let alignment = DynamicProgrammingAligner.align(&a, &b, &|_, _| 1.0, &parameters);

    assert_eq!(alignment.len(), 4);
    assert_eq!(alignment.similarity, -2.0);
    assert!(
        alignment
            .a
            .iter()
            .zip(&alignment.b)
            .all(|pair| pair != (&Some(2), &Some(2)))
    );
}

#[test]
fn factor_rewards_equal_prosodic_classes() {
    let parameters = AlignmentParameters {
        factor: 0.5,
        ..parameters(AlignmentMode::Global)
    };
    let a = parameters.annotate(&[1, 7]);
    let alignment = DynamicProgrammingAligner.align(&a, &a, &|_, _| 1.0, &parameters);

    assert_eq!(alignment.similarity, 3.0);
}

#[test]
fn every_position_appears_once() {
    for mode in [
        AlignmentMode::Global,
        AlignmentMode::Local,
        AlignmentMode::Overlap,
        AlignmentMode::Dialign,
    ] {
        let parameters = parameters(mode);
        let alignment = DynamicProgrammingAligner.align(
            &plain(7, &parameters),
            &plain(5, &parameters),
            &identity("woldemo", "vlado"),
            &parameters,
        );

        assert_eq!(alignment.a.len(), alignment.b.len());
        assert_eq!(
            alignment.a.iter().flatten().copied().collect::<Vec<_>>(),
            (0..7).collect::<Vec<_>>(),
            "{mode}"
        );
        assert_eq!(
            alignment.b.iter().flatten().copied().collect::<Vec<_>>(),
            (0..5).collect::<Vec<_>>(),
            "{mode}"
        );
        assert!(
            alignment
                .a
                .iter()
                .zip(&alignment.b)
                .all(|(a, b)| a.is_some() || b.is_some())
        );
    }
}

#[test]
fn empty_sequences() {
    let parameters = parameters(AlignmentMode::Global);
    let alignment = DynamicProgrammingAligner.align(
        &plain(0, &parameters),
        &plain(2, &parameters),
        &|_, _| 1.0,
        &parameters,
    );
    assert_eq!(alignment.a, vec![None, None]);
    assert_eq!(alignment.b, vec![Some(0), Some(1)]);
}

#[test]
fn align_all_pairs_in_row_major_order() {
    let parameters = parameters(AlignmentMode::Global);
    let annotations = vec![plain(1, &parameters); 3];
    let score = |x: ResidueId, y: ResidueId| {
        if x.row == 0 && y.row == 2 { 5.0 } else { 1.0 }
    };
    let alignments = DynamicProgrammingAligner.align_all(&annotations, &score, &parameters);

    assert_eq!(
        alignments
            .iter()
            .map(|alignment| alignment.similarity)
            .collect::<Vec<_>>(),
        vec![1.0, 5.0, 1.0]
    );
}
