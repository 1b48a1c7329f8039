//! Iterative refinement of an alignment by splitting off groups of rows and realigning them.

use std::{collections::HashMap, fmt::Display};

use log::{debug, info};

use crate::{
    config::Check,
    metrics::sum_of_pairs,
    pairwise::table::DistanceMatrix,
    profile::{Profile, ProfileAligner},
};

/// The gap pattern of an aligned row, where everything that is not a residue counts as a gap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GapProfile(Vec<bool>);

impl GapProfile {
    pub fn of_row(profile: &Profile, row: usize) -> Self {
        Self(profile.row(row).iter().map(|token| !token.is_residue()).collect())
    }

    pub fn is_gap(&self, column: usize) -> bool {
        self.0[column]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Groups the rows with identical gap profiles, in order of their first row.
pub fn group_by_gap_profile(profile: &Profile) -> Vec<Vec<usize>> {
    let mut group_of_profile = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for row in 0..profile.height() {
        let group = *group_of_profile
            .entry(GapProfile::of_row(profile, row))
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[group].push(row);
    }

    groups
}

/// The rows whose mean distance to all rows exceeds the mean over the whole matrix.
pub fn orphans(distances: &DistanceMatrix) -> Vec<usize> {
    let mean = distances.mean();
    (0..distances.len())
        .filter(|&row| distances.row_mean(row) > mean)
        .collect()
}

/// Every row on its own.
pub fn singletons(height: usize) -> Vec<Vec<usize>> {
    (0..height).map(|row| vec![row]).collect()
}

/// Splits each partition off the alignment, realigns it against the remaining rows and joins both again.
///
/// Partitions that are empty or contain all rows are skipped.
/// With [`Check::Immediate`], a realignment that lowers the sum-of-pairs score is undone right away.
/// With [`Check::Final`], all realignments are undone if the final score is lower than the initial one.
///
/// Returns `true` if the alignment was changed.
pub fn iterate(
    alignment: &mut Profile,
    partitions: &[Vec<usize>],
    profile_aligner: &ProfileAligner,
    check: Check,
) -> bool {
    if partitions.len() <= 1 {
        debug!("Skipping refinement over {} partitions", partitions.len());
        return false;
    }

    let score = |alignment: &Profile| {
        sum_of_pairs(alignment, profile_aligner.scorer, profile_aligner.gap_weight)
    };
    let snapshot = alignment.clone();
    let initial_score = score(alignment);
    let mut current_score = initial_score;

    for partition in partitions {
        if partition.is_empty() || partition.len() >= alignment.height() {
            continue;
        }

        let (selected, remaining, remaining_rows) = alignment.split(partition);
        let (selected, remaining) = profile_aligner.align(&selected, &remaining);
        let realigned = Profile::join(&selected, partition, &remaining, &remaining_rows);

        match check {
            Check::Immediate => {
                let new_score = score(&realigned);
                if new_score < current_score {
                    debug!("Rejected realignment of rows {partition:?} ({new_score} < {current_score})");
                } else {
                    debug!("Accepted realignment of rows {partition:?} ({new_score})");
                    current_score = new_score;
                    *alignment = realigned;
                }
            }
            Check::Final => *alignment = realigned,
        }
    }

    if check == Check::Final {
        current_score = score(alignment);
        if current_score < initial_score {
            info!("Refinement lowered the sum-of-pairs score to {current_score}, restoring {initial_score}");
            *alignment = snapshot;
            return false;
        }
    }

    info!("Refined the alignment over {} partitions from score {initial_score} to {current_score}", partitions.len());
    *alignment != snapshot
}

impl Display for GapProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &gap in &self.0 {
            write!(f, "{}", if gap { '1' } else { '0' })?;
        }
        Ok(())
    }
}
