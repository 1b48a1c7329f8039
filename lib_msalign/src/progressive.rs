use log::{debug, info};

use crate::{
    error::{Error, Result},
    guide_tree::GuideTree,
    profile::{Profile, ProfileAligner},
};

/// Merges the rows along the guide tree and returns their alignment in the original row order.
///
/// The rows are the rows of the profile aligner's scores, and each starts out as its own profile.
pub fn merge_alignments(profile_aligner: &ProfileAligner, tree: &GuideTree) -> Result<Profile> {
    let row_count = profile_aligner.sonority.len();
    if row_count == 0 {
        return Err(Error::EmptyInput);
    }

    let mut clusters: Vec<Option<(Profile, Vec<usize>)>> = profile_aligner
        .sonority
        .iter()
        .enumerate()
        .map(|(row, sonority)| Some((Profile::from_residues(row, sonority.len()), vec![row])))
        .collect();

    for (step, &(a, b)) in tree.merges().iter().enumerate() {
        let take = |clusters: &mut Vec<Option<(Profile, Vec<usize>)>>, cluster: usize| {
            clusters
                .get_mut(cluster)
                .and_then(Option::take)
                .ok_or(Error::InvalidGuideTree { step, cluster })
        };
        let (profile_a, mut rows) = take(&mut clusters, a)?;
        let (profile_b, rows_b) = take(&mut clusters, b)?;

        let merged = profile_aligner.merge(&profile_a, &profile_b);
        rows.extend(rows_b);
        debug!(
            "Merge {step}: clusters {a} and {b} into {} with {} rows and {} columns",
            clusters.len(),
            merged.height(),
            merged.width()
        );
        clusters.push(Some((merged, rows)));
    }

    let last = clusters.len() - 1;
    let (profile, order) = clusters
        .pop()
        .flatten()
        .filter(|(_, order)| order.len() == row_count)
        .ok_or(Error::InvalidGuideTree {
            step: tree.merges().len(),
            cluster: last,
        })?;

    let mut positions = vec![0; row_count];
    for (position, &row) in order.iter().enumerate() {
        positions[row] = position;
    }

    info!(
        "Merged {row_count} rows into an alignment of {} columns",
        profile.width()
    );
    Ok(profile.select_rows(&positions))
}
