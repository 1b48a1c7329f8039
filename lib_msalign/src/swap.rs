//! Detection of crossed alignments.
//!
//! A swap is a transposition of two residues that the alignment can only express by
//! gapping them against each other in a window of three columns, like `a b -` against `- b a`.

use log::{debug, info};

use crate::{
    config::SwapConfig,
    metrics::{sum_of_pairs, swap_sum_of_pairs},
    profile::Profile,
    refine::{GapProfile, group_by_gap_profile},
    residue::Token,
    scorer::ScoreTable,
};

/// Scores are compared as integers after multiplying with this factor.
pub const FIXED_POINT_SCALE: f64 = 1e6;

/// The first columns of all windows `i..=i + 2` such that no row has residues in both outer columns.
pub fn swap_candidates(profile: &Profile) -> Vec<usize> {
    let gap_profiles: Vec<_> = group_by_gap_profile(profile)
        .into_iter()
        .map(|rows| GapProfile::of_row(profile, rows[0]))
        .collect();

    (0..profile.width().saturating_sub(2))
        .filter(|&column| {
            gap_profiles
                .iter()
                .all(|gaps| gaps.is_gap(column) || gaps.is_gap(column + 2))
        })
        .collect()
}

/// Decides if the window starting at `column` is a swap.
///
/// Two alternative layouts of the window are built, one with the gaps of each row shifted to the other side
/// and one without shift. In both, a residue in the last column of a row that is gapped in the first column is moved
/// to the first column and replaced by a swap marker. The window is a swap if the mean swap-aware score
/// of both layouts is higher than the score of the alignment.
pub fn is_swap(profile: &Profile, column: usize, scorer: &ScoreTable, config: &SwapConfig) -> bool {
    let (first, middle, last) = (column, column + 1, column + 2);
    let mut shifted = profile.clone();
    let mut unshifted = profile.clone();

    for row in 0..profile.height() {
        let token = |layout: &Profile, column| layout.get(row, column);

        if token(&shifted, first).is_residue() && !token(&shifted, last).is_residue() {
            let (a, b) = (token(&shifted, first), token(&shifted, middle));
            shifted.set(row, last, b);
            shifted.set(row, middle, a);
            shifted.set(row, first, Token::Gap);
        } else if !token(&shifted, first).is_residue() {
            let (b, c) = (token(&shifted, middle), token(&shifted, last));
            shifted.set(row, first, b);
            shifted.set(row, middle, c);
            shifted.set(row, last, Token::Gap);
        }

        for layout in [&mut shifted, &mut unshifted] {
            let moved = token(&*layout, last);
            if !token(&*layout, first).is_residue() && moved.is_residue() {
                layout.set(row, first, moved);
                layout.set(row, last, Token::Swapped);
            }
        }
    }

    let original = sum_of_pairs(profile, scorer, config.gap_weight);
    let alternative = (swap_sum_of_pairs(&shifted, scorer, config.gap_weight, config.swap_penalty)
        + swap_sum_of_pairs(&unshifted, scorer, config.gap_weight, config.swap_penalty))
        * 0.5;
    debug!("Swap window at column {column}: {alternative} against {original}");

    (alternative * FIXED_POINT_SCALE) as i64 > (original * FIXED_POINT_SCALE) as i64
}

/// Keeps each column that is more than three columns after all previously kept ones.
fn non_overlapping(columns: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for column in columns {
        if kept.last().is_none_or(|&last| column - last > 3) {
            kept.push(column);
        }
    }
    kept
}

/// The first columns of all accepted swap windows in ascending order.
pub fn detect_swaps(profile: &Profile, scorer: &ScoreTable, config: &SwapConfig) -> Vec<usize> {
    let candidates = swap_candidates(profile);
    let swaps = non_overlapping(
        candidates
            .iter()
            .copied()
            .filter(|&column| is_swap(profile, column, scorer, config)),
    );
    info!(
        "Found {} swaps among {} candidate windows",
        swaps.len(),
        candidates.len()
    );
    swaps
}

/// Marks all gaps in the window starting at `column` as swapped.
pub fn apply_swap(profile: &mut Profile, first: usize) {
    for row in 0..profile.height() {
        for column in first..first + 3 {
            if profile.get(row, column).is_gap() {
                profile.set(row, column, Token::Swapped);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::SwapConfig,
        model::ClassModel,
        profile::Profile,
        residue::{ResidueId, ResidueIndex, Token},
        scorer::ScoreTable,
    };

    use super::{apply_swap, detect_swaps, is_swap, non_overlapping, swap_candidates};

    fn residue(row: usize, position: usize) -> Token {
        Token::Residue(ResidueId::new(row, position))
    }

    fn scorer() -> ScoreTable {
        let model = ClassModel::by_name("dolgo").unwrap();
        let rows: [&[char]; 2] = [&['W', 'V', 'R', 'T'], &['W', 'R', 'V', 'T']];
        ScoreTable::from_classes(ResidueIndex::new([4, 4]), &rows, &model)
    }

    /// `w o l - d` against `w - l a d`.
    fn crossed() -> Profile {
        Profile::from_rows(vec![
            vec![residue(0, 0), residue(0, 1), residue(0, 2), Token::Gap, residue(0, 3)],
            vec![residue(1, 0), Token::Gap, residue(1, 1), residue(1, 2), residue(1, 3)],
        ])
        .unwrap()
    }

    #[test]
    fn candidates() {
        assert_eq!(swap_candidates(&crossed()), vec![1]);
        assert!(swap_candidates(&Profile::from_residues(0, 4)).is_empty());
        assert!(swap_candidates(&Profile::from_residues(0, 1)).is_empty());
    }

    #[test]
    fn crossed_vowel_is_a_swap() {
        let scorer = scorer();
        let config = SwapConfig::default();
        let mut profile = crossed();

        // The alignment scores 6.5 and both alternatives 6.9.
        assert!(is_swap(&profile, 1, &scorer, &config));
        assert_eq!(detect_swaps(&profile, &scorer, &config), vec![1]);

        apply_swap(&mut profile, 1);
        assert_eq!(profile.get(0, 3), Token::Swapped);
        assert_eq!(profile.get(1, 1), Token::Swapped);
        assert_eq!(profile.residues(0).count(), 4);
        assert_eq!(profile.residues(1).count(), 4);
    }

    #[test]
    fn high_swap_penalty_rejects_swap() {
        let config = SwapConfig {
            swap_penalty: -20.0,
            ..Default::default()
        };
        assert!(!is_swap(&crossed(), 1, &scorer(), &config));
    }

    #[test]
    fn swaps_do_not_overlap() {
        assert_eq!(non_overlapping([1, 2, 4, 5, 9]), vec![1, 5, 9]);
        assert!(non_overlapping([]).is_empty());
    }
}
