use std::{collections::HashMap, hash::Hash};

/// Groups the input sequences that share the same class-symbol sequence.
///
/// Only one representative per group takes part in the alignment.
/// Groups are numbered in the order of their first member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueSequenceIndex {
    groups: Vec<Vec<usize>>,
    internal_of: Vec<usize>,
}

impl UniqueSequenceIndex {
    pub fn new<Key: Eq + Hash>(keys: &[Key]) -> Self {
        let mut group_of_key = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut internal_of = Vec::with_capacity(keys.len());

        for (external, key) in keys.iter().enumerate() {
            let internal = *group_of_key.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[internal].push(external);
            internal_of.push(internal);
        }

        Self {
            groups,
            internal_of,
        }
    }

    /// The amount of unique rows.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The amount of original sequences.
    pub fn sequence_count(&self) -> usize {
        self.internal_of.len()
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// The original sequences that are represented by the given unique row.
    pub fn external(&self, internal: usize) -> &[usize] {
        &self.groups[internal]
    }

    pub fn internal(&self, external: usize) -> usize {
        self.internal_of[external]
    }

    pub fn representative(&self, internal: usize) -> usize {
        self.groups[internal][0]
    }
}

#[cfg(test)]
mod tests {
    use super::UniqueSequenceIndex;

    #[test]
    fn groups_in_order_of_first_occurrence() {
        let index = UniqueSequenceIndex::new(&["VP", "KV", "VP", "VP", "KV", "T"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.sequence_count(), 6);
        assert_eq!(index.external(0), &[0, 2, 3]);
        assert_eq!(index.external(1), &[1, 4]);
        assert_eq!(index.external(2), &[5]);
        assert_eq!(index.internal(4), 1);
        assert_eq!(index.representative(1), 1);
    }

    #[test]
    fn groups_partition_the_input() {
        let keys = ["a", "b", "a", "c", "b", "a", "d"];
        let index = UniqueSequenceIndex::new(&keys);

        let mut covered: Vec<_> = index.groups().iter().flatten().copied().collect();
        covered.sort_unstable();
        assert_eq!(covered, (0..keys.len()).collect::<Vec<_>>());

        for (internal, group) in index.groups().iter().enumerate() {
            assert!(!group.is_empty());
            for &external in group {
                assert_eq!(index.internal(external), internal);
                assert_eq!(keys[external], keys[group[0]]);
            }
        }
    }
}
