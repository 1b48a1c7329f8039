use std::{fmt::Display, str::FromStr};

use crate::error::{Error, Result};

/// Identifies a residue by the row of its sequence and its position within that sequence.
///
/// Both components are 0-based, but the textual form is 1-based (`row.position`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResidueId {
    pub row: usize,
    pub position: usize,
}

/// A single cell of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Token {
    Residue(ResidueId),
    #[default]
    Gap,
    /// Marks a cell that takes part in a detected crossed alignment.
    Swapped,
}

/// Maps the residues of a fixed set of rows to dense indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueIndex {
    offsets: Vec<usize>,
}

impl ResidueId {
    pub fn new(row: usize, position: usize) -> Self {
        Self { row, position }
    }
}

impl Token {
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap)
    }

    pub fn is_residue(&self) -> bool {
        matches!(self, Self::Residue(_))
    }

    pub fn residue(&self) -> Option<ResidueId> {
        match self {
            Self::Residue(id) => Some(*id),
            Self::Gap | Self::Swapped => None,
        }
    }
}

impl From<Option<ResidueId>> for Token {
    fn from(value: Option<ResidueId>) -> Self {
        value.map(Self::Residue).unwrap_or(Self::Gap)
    }
}

impl ResidueIndex {
    pub fn new(row_lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        for length in row_lengths {
            offsets.push(offsets.last().copied().unwrap_or(0) + length);
        }
        Self { offsets }
    }

    pub fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn row_length(&self, row: usize) -> usize {
        self.offsets[row + 1] - self.offsets[row]
    }

    /// The total amount of residues over all rows.
    pub fn len(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dense(&self, id: ResidueId) -> usize {
        debug_assert!(id.position < self.row_length(id.row));
        self.offsets[id.row] + id.position
    }

    pub fn residues(&self, row: usize) -> impl Iterator<Item = ResidueId> + use<> {
        (0..self.row_length(row)).map(move |position| ResidueId::new(row, position))
    }

    pub fn all_residues(&self) -> impl Iterator<Item = ResidueId> + '_ {
        (0..self.rows()).flat_map(|row| self.residues(row))
    }
}

impl Display for ResidueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.row + 1, self.position + 1)
    }
}

impl FromStr for ResidueId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidResidueId(s.to_string());
        let (row, position) = s.split_once('.').ok_or_else(invalid)?;
        let row: usize = row.parse().map_err(|_| invalid())?;
        let position: usize = position.parse().map_err(|_| invalid())?;

        if row == 0 || position == 0 {
            return Err(invalid());
        }

        Ok(Self::new(row - 1, position - 1))
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Residue(id) => write!(f, "{id}"),
            Self::Gap => write!(f, "-"),
            Self::Swapped => write!(f, "+"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ResidueId, ResidueIndex, Token};

    #[test]
    fn residue_id_text() {
        let id = ResidueId::new(2, 0);
        assert_eq!(id.to_string(), "3.1");
        assert_eq!("3.1".parse::<ResidueId>().unwrap(), id);
        assert!("0.1".parse::<ResidueId>().is_err());
        assert!("3".parse::<ResidueId>().is_err());
        assert!("a.b".parse::<ResidueId>().is_err());
    }

    #[test]
    fn dense_index() {
        let index = ResidueIndex::new([3, 0, 2]);
        assert_eq!(index.rows(), 3);
        assert_eq!(index.len(), 5);
        assert_eq!(index.dense(ResidueId::new(0, 2)), 2);
        assert_eq!(index.dense(ResidueId::new(2, 0)), 3);
        assert_eq!(index.residues(1).count(), 0);
        assert_eq!(
            index.all_residues().collect::<Vec<_>>(),
            vec![
                ResidueId::new(0, 0),
                ResidueId::new(0, 1),
                ResidueId::new(0, 2),
                ResidueId::new(2, 0),
                ResidueId::new(2, 1),
            ]
        );
    }

    #[test]
    fn token_kinds() {
        assert!(Token::Gap.is_gap());
        assert!(!Token::Swapped.is_gap());
        assert!(!Token::Swapped.is_residue());
        assert_eq!(Token::from(None), Token::Gap);
        assert_eq!(Token::Swapped.to_string(), "+");
    }
}
