//! Scores of alignment columns, whole alignments and pairs of aligned rows.

use ndarray::ArrayView1;

use crate::{config::PidMode, profile::Profile, residue::Token, scorer::ScoreTable};

/// The mean score of all pairs of residues between two columns.
///
/// Pairs involving a gap do not contribute a score, but count with `gap_weight` towards the number of pairs.
pub fn profile_score(
    a: ArrayView1<'_, Token>,
    b: ArrayView1<'_, Token>,
    scorer: &ScoreTable,
    gap_weight: f64,
) -> f64 {
    let mut score = 0.0;
    let mut counter = 0.0;

    for token_a in a {
        for token_b in b {
            match (token_a.residue(), token_b.residue()) {
                (Some(residue_a), Some(residue_b)) => {
                    score += scorer.get(residue_a, residue_b);
                    counter += 1.0;
                }
                _ => counter += gap_weight,
            }
        }
    }

    if counter == 0.0 { 0.0 } else { score / counter }
}

/// The score of a swap marker against a residue, which rules out any layout containing such a pair.
pub const FORBIDDEN_SWAP_SCORE: f64 = -10_000_000.0;

/// Like [`profile_score`], but swap markers score `swap_penalty` against gaps, nothing against other swap markers
/// and [`FORBIDDEN_SWAP_SCORE`] against residues.
pub fn swap_profile_score(
    a: ArrayView1<'_, Token>,
    b: ArrayView1<'_, Token>,
    scorer: &ScoreTable,
    gap_weight: f64,
    swap_penalty: f64,
) -> f64 {
    let mut score = 0.0;
    let mut counter = 0.0;

    for token_a in a {
        for token_b in b {
            match (token_a, token_b) {
                (Token::Residue(residue_a), Token::Residue(residue_b)) => {
                    score += scorer.get(*residue_a, *residue_b);
                    counter += 1.0;
                }
                (Token::Swapped, Token::Swapped) => counter += 1.0,
                (Token::Swapped, Token::Gap) | (Token::Gap, Token::Swapped) => {
                    score += swap_penalty;
                    counter += 1.0;
                }
                (Token::Swapped, Token::Residue(_)) | (Token::Residue(_), Token::Swapped) => {
                    score += FORBIDDEN_SWAP_SCORE;
                    counter += 1.0;
                }
                _ => counter += gap_weight,
            }
        }
    }

    if counter == 0.0 { 0.0 } else { score / counter }
}

/// The profile score of each column against itself.
pub fn peaks(profile: &Profile, scorer: &ScoreTable, gap_weight: f64) -> Vec<f64> {
    profile
        .columns()
        .map(|column| profile_score(column, column, scorer, gap_weight))
        .collect()
}

/// The mean profile score of all columns against themselves.
pub fn sum_of_pairs(profile: &Profile, scorer: &ScoreTable, gap_weight: f64) -> f64 {
    mean(peaks(profile, scorer, gap_weight))
}

/// The mean swap-aware profile score of all columns against themselves.
pub fn swap_sum_of_pairs(
    profile: &Profile,
    scorer: &ScoreTable,
    gap_weight: f64,
    swap_penalty: f64,
) -> f64 {
    mean(
        profile
            .columns()
            .map(|column| swap_profile_score(column, column, scorer, gap_weight, swap_penalty)),
    )
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// The percentage identity of two aligned rows, where `None` marks a gap.
///
/// Columns where both rows have a gap are ignored.
/// If the denominator of the chosen mode is zero, the identity is zero.
pub fn pid<T: PartialEq>(a: &[Option<T>], b: &[Option<T>], mode: PidMode) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let columns: Vec<_> = a
        .iter()
        .zip(b)
        .filter(|(a, b)| a.is_some() || b.is_some())
        .collect();

    let identical = columns
        .iter()
        .filter(|(a, b)| a.is_some() && a == b)
        .count();
    let aligned = columns
        .iter()
        .filter(|(a, b)| a.is_some() && b.is_some())
        .count();

    let span_a = span(columns.iter().map(|(a, _)| a.is_some()));
    let span_b = span(columns.iter().map(|(_, b)| b.is_some()));

    let denominator = match mode {
        PidMode::AlignedAndInternalGaps => {
            let internal_gaps = columns
                .iter()
                .enumerate()
                .filter(|(column, (a, b))| {
                    (a.is_none() && span_a.contains(column)) || (b.is_none() && span_b.contains(column))
                })
                .count();
            aligned + internal_gaps
        }
        PidMode::Aligned => aligned,
        PidMode::ShorterSequence => {
            let length_a = columns.iter().filter(|(a, _)| a.is_some()).count();
            let length_b = columns.iter().filter(|(_, b)| b.is_some()).count();
            length_a.min(length_b)
        }
        PidMode::ShorterSequenceWithInternalGaps => span_a.len().min(span_b.len()),
        PidMode::AlignedAndGaps => {
            let gap_runs = gap_runs(columns.iter().map(|(a, _)| a.is_some()))
                + gap_runs(columns.iter().map(|(_, b)| b.is_some()));
            aligned + 2 * gap_runs
        }
    };

    if denominator == 0 {
        0.0
    } else {
        identical as f64 / denominator as f64
    }
}

/// The range from the first to the last residue.
fn span(residues: impl Iterator<Item = bool> + Clone) -> std::ops::Range<usize> {
    let first = residues.clone().position(|residue| residue);
    let last = residues
        .enumerate()
        .filter(|(_, residue)| *residue)
        .map(|(column, _)| column)
        .last();
    match (first, last) {
        (Some(first), Some(last)) => first..last + 1,
        _ => 0..0,
    }
}

/// The number of maximal runs of gaps.
fn gap_runs(residues: impl Iterator<Item = bool>) -> usize {
    let mut runs = 0;
    let mut in_gap = false;
    for residue in residues {
        if !residue && !in_gap {
            runs += 1;
        }
        in_gap = !residue;
    }
    runs
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use crate::{
        config::PidMode,
        model::ClassModel,
        profile::Profile,
        residue::{ResidueId, ResidueIndex, Token},
        scorer::ScoreTable,
    };

    use super::{FORBIDDEN_SWAP_SCORE, pid, profile_score, sum_of_pairs, swap_profile_score};

    fn scorer() -> ScoreTable {
        let model = ClassModel::by_name("dolgo").unwrap();
        let rows: [&[char]; 3] = [&['T', 'V'], &['T', 'V'], &['K', 'V']];
        ScoreTable::from_classes(ResidueIndex::new([2, 2, 2]), &rows, &model)
    }

    fn residue(row: usize, position: usize) -> Token {
        Token::Residue(ResidueId::new(row, position))
    }

    #[test]
    fn column_scores() {
        let scorer = scorer();
        let column = array![residue(0, 0), residue(1, 0), Token::Gap];

        // Four residue pairs scoring 10 and five gap pairs.
        assert_eq!(profile_score(column.view(), column.view(), &scorer, 0.0), 10.0);
        assert_eq!(
            profile_score(column.view(), column.view(), &scorer, 0.5),
            40.0 / 6.5
        );

        let gaps = array![Token::Gap, Token::Swapped];
        assert_eq!(profile_score(gaps.view(), gaps.view(), &scorer, 0.0), 0.0);
    }

    #[test]
    fn swap_column_scores() {
        let scorer = scorer();
        let column = array![Token::Swapped, Token::Gap];

        // +/+ once, +/- twice with the penalty and -/- with gap weight.
        assert_eq!(
            swap_profile_score(column.view(), column.view(), &scorer, 1.0, -1.0),
            -2.0 / 4.0
        );
        let swapped = array![Token::Swapped, Token::Swapped];
        assert_eq!(
            swap_profile_score(swapped.view(), swapped.view(), &scorer, 1.0, -1.0),
            0.0
        );
    }

    #[test]
    fn swap_marker_against_residue_is_forbidden() {
        let scorer = scorer();
        let column = array![residue(0, 0), Token::Swapped, Token::Gap];

        // T/T 10, T/+ twice forbidden, +/+ once, +/- twice, T/- and -/- with gap weight.
        let score = swap_profile_score(column.view(), column.view(), &scorer, 1.0, -1.0);
        assert_eq!(score, (10.0 + 2.0 * FORBIDDEN_SWAP_SCORE - 2.0) / 9.0);
        assert!(score < -1_000_000.0);
    }

    #[test]
    fn sum_of_pairs_is_column_mean() {
        let scorer = scorer();
        let profile = Profile::from_rows(vec![
            vec![residue(0, 0), residue(0, 1)],
            vec![residue(2, 0), Token::Gap],
        ])
        .unwrap();

        // T/T and K/K score 10 and T/K 0, V/V 5 and three gap pairs.
        assert_eq!(sum_of_pairs(&profile, &scorer, 0.0), 5.0);
        assert_eq!(sum_of_pairs(&profile, &scorer, 1.0), (5.0 + 1.25) / 2.0);
        assert_eq!(sum_of_pairs(&Profile::from_rows(Vec::new()).unwrap(), &scorer, 0.0), 0.0);
    }

    #[test]
    fn pid_modes() {
        let a = [Some('x'), Some('y'), None, Some('z')];
        let b = [Some('x'), Some('w'), Some('v'), Some('z')];

        assert_eq!(pid(&a, &b, PidMode::AlignedAndInternalGaps), 0.5);
        assert_eq!(pid(&a, &b, PidMode::Aligned), 2.0 / 3.0);
        assert_eq!(pid(&a, &b, PidMode::ShorterSequence), 2.0 / 3.0);
        assert_eq!(pid(&a, &b, PidMode::ShorterSequenceWithInternalGaps), 0.5);
        assert_eq!(pid(&a, &b, PidMode::AlignedAndGaps), 0.4);
    }

    #[test]
    fn pid_ignores_end_gaps_and_double_gaps() {
        let a = [None, Some('x'), None, Some('y')];
        let b = [Some('u'), Some('x'), None, Some('y')];

        assert_eq!(pid(&a, &b, PidMode::AlignedAndInternalGaps), 1.0);
        assert_eq!(pid(&a, &b, PidMode::ShorterSequenceWithInternalGaps), 1.0);
        assert_eq!(pid(&a, &b, PidMode::AlignedAndGaps), 0.5);

        let empty: [Option<char>; 0] = [];
        assert_eq!(pid(&empty, &empty, PidMode::Aligned), 0.0);
    }
}
