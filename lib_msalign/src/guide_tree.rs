//! Hierarchical clustering of unique rows.

use log::{debug, info};
use ndarray::{Array2, s};
use noisy_float::types::r64;

use crate::{config::TreeMethod, pairwise::table::DistanceMatrix};

/// An ordered list of cluster merges.
///
/// The leaves are the clusters `0..leaves`, and merge `k` creates the cluster `leaves + k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideTree {
    merges: Vec<(usize, usize)>,
    leaves: usize,
}

/// Builds guide trees and flat clusterings from distance matrices.
pub trait GuideTreeBuilder {
    fn guide_tree(&self, distances: &DistanceMatrix, method: TreeMethod) -> GuideTree;

    /// Partitions the rows into clusters whose average-linkage distance does not exceed `threshold`.
    fn flat_clusters(&self, distances: &DistanceMatrix, threshold: f64) -> Vec<Vec<usize>>;
}

/// UPGMA and neighbor-joining clustering.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clustering;

impl GuideTree {
    pub fn new(merges: Vec<(usize, usize)>, leaves: usize) -> Self {
        Self { merges, leaves }
    }

    pub fn build(distances: &DistanceMatrix, method: TreeMethod) -> Self {
        let tree = match method {
            TreeMethod::Upgma => Self::upgma(distances),
            TreeMethod::Neighbor => Self::neighbor_joining(distances),
        };
        info!(
            "Built a guide tree over {} rows with {method}",
            distances.len()
        );
        tree
    }

    /// Average-linkage clustering, merging the closest pair of clusters first.
    pub fn upgma(distances: &DistanceMatrix) -> Self {
        let mut clustering = ClusterState::new(distances);
        while clustering.active.len() > 1 {
            let (x, y) = clustering.closest_pair(|clustering, a, b| clustering.distances[[a, b]]);
            clustering.merge_average(x, y);
        }

        Self::new(clustering.merges, distances.len())
    }

    /// Saitou-Nei neighbor-joining.
    ///
    /// The last two clusters are joined without further computation.
    pub fn neighbor_joining(distances: &DistanceMatrix) -> Self {
        let mut clustering = ClusterState::new(distances);

        while clustering.active.len() > 2 {
            let r = clustering.active.len() as f64;
            // Indexed by cluster id, only active clusters are filled in.
            let mut totals: Vec<f64> = vec![0.0; clustering.members.len()];
            for &a in &clustering.active {
                totals[a] = clustering
                    .active
                    .iter()
                    .map(|&k| clustering.distances[[a, k]])
                    .sum();
            }

            let (x, y) = clustering.closest_pair(|clustering, a, b| {
                (r - 2.0) * clustering.distances[[a, b]] - totals[a] - totals[b]
            });
            clustering.merge_neighbors(x, y);
        }

        if let &[a, b] = clustering.active.as_slice() {
            clustering.merges.push((a, b));
        }

        Self::new(clustering.merges, distances.len())
    }

    pub fn merges(&self) -> &[(usize, usize)] {
        &self.merges
    }

    pub fn leaves(&self) -> usize {
        self.leaves
    }
}

/// UPGMA clustering stopped once the closest pair of clusters is farther apart than `threshold`.
///
/// The clusters are returned with sorted members, ordered by their smallest member.
pub fn flat_upgma(distances: &DistanceMatrix, threshold: f64) -> Vec<Vec<usize>> {
    let mut clustering = ClusterState::new(distances);
    while clustering.active.len() > 1 {
        let (x, y) = clustering.closest_pair(|clustering, a, b| clustering.distances[[a, b]]);
        let (a, b) = (clustering.active[x], clustering.active[y]);
        if clustering.distances[[a, b]] > threshold {
            break;
        }
        clustering.merge_average(x, y);
    }

    let mut clusters: Vec<Vec<usize>> = clustering
        .active
        .iter()
        .map(|&cluster| {
            let mut members = clustering.members[cluster].clone();
            members.sort_unstable();
            members
        })
        .collect();
    clusters.sort_unstable_by_key(|members| members.first().copied());
    debug!(
        "Flat clustering at threshold {threshold} yields {} clusters",
        clusters.len()
    );
    clusters
}

impl GuideTreeBuilder for Clustering {
    fn guide_tree(&self, distances: &DistanceMatrix, method: TreeMethod) -> GuideTree {
        GuideTree::build(distances, method)
    }

    fn flat_clusters(&self, distances: &DistanceMatrix, threshold: f64) -> Vec<Vec<usize>> {
        flat_upgma(distances, threshold)
    }
}

struct ClusterState {
    /// Distances between all clusters created so far, indexed by cluster id.
    distances: Array2<f64>,
    members: Vec<Vec<usize>>,
    /// The ids of the clusters that have not been merged yet, in order of creation.
    active: Vec<usize>,
    merges: Vec<(usize, usize)>,
}

impl ClusterState {
    fn new(distances: &DistanceMatrix) -> Self {
        let leaves = distances.len();
        let capacity = (2 * leaves).saturating_sub(1);
        let mut matrix = Array2::zeros((capacity, capacity));
        matrix
            .slice_mut(s![..leaves, ..leaves])
            .assign(distances.as_array());

        Self {
            distances: matrix,
            members: (0..leaves).map(|leaf| vec![leaf]).collect(),
            active: (0..leaves).collect(),
            merges: Vec::new(),
        }
    }

    /// Returns the positions `x < y` in `active` of the pair of clusters with the lowest criterion.
    /// Ties are broken by the first pair in row-major order.
    fn closest_pair(&self, criterion: impl Fn(&Self, usize, usize) -> f64) -> (usize, usize) {
        (0..self.active.len())
            .flat_map(|x| (x + 1..self.active.len()).map(move |y| (x, y)))
            .min_by_key(|&(x, y)| r64(criterion(self, self.active[x], self.active[y])))
            .unwrap_or((0, 1))
    }

    /// Merges the clusters at positions `x < y` of `active` and returns the id of the new cluster.
    fn merge(&mut self, x: usize, y: usize, distance: impl Fn(&Self, usize) -> f64) -> usize {
        debug_assert!(x < y);
        let (a, b) = (self.active[x], self.active[y]);
        let cluster = self.members.len();

        for &k in &self.active {
            if k != a && k != b {
                let value = distance(self, k);
                self.distances[[cluster, k]] = value;
                self.distances[[k, cluster]] = value;
            }
        }

        let mut members = self.members[a].clone();
        members.extend_from_slice(&self.members[b]);
        self.members.push(members);
        self.active.remove(y);
        self.active.remove(x);
        self.active.push(cluster);
        self.merges.push((a, b));
        debug!("Merged clusters {a} and {b} into {cluster}");

        cluster
    }

    fn merge_average(&mut self, x: usize, y: usize) -> usize {
        let (a, b) = (self.active[x], self.active[y]);
        let size_a = self.members[a].len() as f64;
        let size_b = self.members[b].len() as f64;

        self.merge(x, y, |clustering, k| {
            (size_a * clustering.distances[[a, k]] + size_b * clustering.distances[[b, k]])
                / (size_a + size_b)
        })
    }

    fn merge_neighbors(&mut self, x: usize, y: usize) -> usize {
        let (a, b) = (self.active[x], self.active[y]);

        self.merge(x, y, |clustering, k| {
            (clustering.distances[[a, k]] + clustering.distances[[b, k]]
                - clustering.distances[[a, b]])
                / 2.0
        })
    }
}
