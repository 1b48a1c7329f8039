//! Comparison of a test alignment against a gold standard alignment.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::{Error, Result};

/// The gap symbol of alignments given as token strings.
pub const GAP: &str = "-";

/// A gold standard alignment and a test alignment of the same sequences.
///
/// Both alignments are rows of token strings, where [`GAP`] marks a gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalMsa {
    gold: Vec<Vec<String>>,
    test: Vec<Vec<String>>,
}

/// Residue pair counts, weighted by the sizes of the groups of identical sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PairCounts {
    common: f64,
    test: f64,
    gold: f64,
    union: f64,
}

impl EvalMsa {
    pub fn new(gold: Vec<Vec<String>>, test: Vec<Vec<String>>) -> Result<Self> {
        check_rectangular(&gold)?;
        check_rectangular(&test)?;

        if gold.len() != test.len()
            || gold
                .iter()
                .zip(&test)
                .any(|(gold, test)| ungapped(gold) != ungapped(test))
        {
            return Err(Error::MismatchedAlignments);
        }

        Ok(Self { gold, test })
    }

    pub fn gold(&self) -> &[Vec<String>] {
        &self.gold
    }

    pub fn test(&self) -> &[Vec<String>] {
        &self.test
    }

    /// The column score.
    ///
    /// The modes divide the number of columns that appear in both alignments by
    /// 1. the number of test columns,
    /// 2. the number of gold columns,
    /// 3. the mean number of columns of both alignments,
    ///
    /// or 4. combine modes 1 and 2 into their F-score.
    pub fn c_score(&self, mode: u8) -> Result<f64> {
        let gold = columns(&self.gold);
        let test = columns(&self.test);
        let common = gold.iter().filter(|&column| test.contains(column)).count() as f64;

        let precision = ratio(common, test.len() as f64);
        let recall = ratio(common, gold.len() as f64);
        Ok(match mode {
            1 => precision,
            2 => recall,
            3 => ratio(2.0 * common, (test.len() + gold.len()) as f64),
            4 => ratio(2.0 * precision * recall, precision + recall),
            other => return Err(Error::UnknownEvaluationMode(other)),
        })
    }

    /// The fraction of rows that are identical in both alignments.
    pub fn pir_score(&self) -> f64 {
        let identical = self
            .gold
            .iter()
            .zip(&self.test)
            .filter(|(gold, test)| gold.concat() == test.concat())
            .count();
        ratio(identical as f64, self.gold.len() as f64)
    }

    /// The sum-of-pairs score.
    ///
    /// The modes divide the number of residue pairs that are aligned in both alignments by
    /// 1. the number of residue pairs of the gold alignment,
    /// 2. the number of residue pairs of the test alignment, or
    /// 3. the mean of both.
    pub fn sp_score(&self, mode: u8) -> Result<f64> {
        if !(1..=3).contains(&mode) {
            return Err(Error::UnknownEvaluationMode(mode));
        }
        let Some(counts) = self.pair_counts() else {
            return Ok(1.0);
        };

        Ok(match mode {
            1 => ratio(counts.common, counts.gold),
            2 => ratio(counts.common, counts.test),
            _ => ratio(2.0 * counts.common, counts.gold + counts.test),
        })
    }

    /// The number of residue pairs aligned in both alignments divided by the number aligned in any of them.
    pub fn jc_score(&self) -> f64 {
        self.pair_counts()
            .map(|counts| ratio(counts.common, counts.union))
            .unwrap_or(1.0)
    }

    /// Counts the residue pairs between all pairs of distinct sequences, or `None` if both alignments are equal.
    ///
    /// Identical sequences are only counted once, and each pair is weighted by
    /// the inverse sizes of both groups of identical sequences.
    fn pair_counts(&self) -> Option<PairCounts> {
        if self.gold == self.test {
            return None;
        }

        let mut group_of_sequence = HashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (row, tokens) in self.gold.iter().enumerate() {
            let group = *group_of_sequence.entry(ungapped(tokens)).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(row);
        }

        let mut counts = PairCounts::default();
        for (a, group_a) in groups.iter().enumerate() {
            for group_b in &groups[a + 1..] {
                let weight = 1.0 / (group_a.len() * group_b.len()) as f64;
                let (row_a, row_b) = (group_a[0], group_b[0]);
                let gold = residue_pairs(&self.gold[row_a], &self.gold[row_b]);
                let test = residue_pairs(&self.test[row_a], &self.test[row_b]);

                let common = gold.iter().filter(|&pair| test.contains(pair)).count();
                let union = gold.iter().chain(&test).collect::<HashSet<_>>().len();
                counts.common += common as f64 * weight;
                counts.gold += gold.len() as f64 * weight;
                counts.test += test.len() as f64 * weight;
                counts.union += union as f64 * weight;
            }
        }

        debug!("Residue pair counts: {counts:?}");
        Some(counts)
    }
}

/// Compares the swap decisions of a gold and a test alignment.
///
/// Returns 0 if neither has swaps, 1 if both have the same swaps and -1 if both have different swaps.
/// Returns 2 if only the gold alignment and -2 if only the test alignment has swaps.
pub fn check_swaps(gold: &[(usize, usize, usize)], test: &[(usize, usize, usize)]) -> i8 {
    match (gold.is_empty(), test.is_empty()) {
        (true, true) => 0,
        (false, true) => 2,
        (true, false) => -2,
        (false, false) if gold == test => 1,
        (false, false) => -1,
    }
}

fn check_rectangular(rows: &[Vec<String>]) -> Result<()> {
    let expected = rows.first().map(Vec::len).unwrap_or(0);
    match rows.iter().position(|row| row.len() != expected) {
        Some(row) => Err(Error::RaggedAlignment {
            row,
            expected,
            actual: rows[row].len(),
        }),
        None => Ok(()),
    }
}

fn ungapped(row: &[String]) -> Vec<&str> {
    row.iter()
        .map(String::as_str)
        .filter(|&token| token != GAP)
        .collect()
}

fn columns(rows: &[Vec<String>]) -> Vec<Vec<&str>> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    (0..width)
        .map(|column| rows.iter().map(|row| row[column].as_str()).collect())
        .collect()
}

/// The pairs of 1-based residue numbers that are aligned in the same column.
fn residue_pairs(a: &[String], b: &[String]) -> Vec<(usize, usize)> {
    let number = |row: &[String]| -> Vec<Option<usize>> {
        let mut next = 0;
        row.iter()
            .map(|token| {
                (token != GAP).then(|| {
                    next += 1;
                    next
                })
            })
            .collect()
    };

    number(a)
        .into_iter()
        .zip(number(b))
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .collect()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::{EvalMsa, check_swaps};

    fn rows(rows: &[&str]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.split(' ').map(str::to_string).collect())
            .collect()
    }

    fn eval(gold: &[&str], test: &[&str]) -> EvalMsa {
        EvalMsa::new(rows(gold), rows(test)).unwrap()
    }

    #[test]
    fn identical_alignments() {
        let alignment = ["w o l d e", "w a l d -", "v o l - -"];
        let eval = eval(&alignment, &alignment);

        for mode in 1..=4 {
            assert_eq!(eval.c_score(mode).unwrap(), 1.0);
        }
        for mode in 1..=3 {
            assert_eq!(eval.sp_score(mode).unwrap(), 1.0);
        }
        assert_eq!(eval.pir_score(), 1.0);
        assert_eq!(eval.jc_score(), 1.0);
    }

    #[test]
    fn shifted_gap() {
        let eval = eval(&["a b c", "a - c"], &["a b c -", "a - - c"]);

        // Columns a/a and b/- are shared, and no row keeps its gaps.
        assert_eq!(eval.c_score(1).unwrap(), 0.5);
        assert_eq!(eval.c_score(2).unwrap(), 2.0 / 3.0);
        assert_eq!(eval.c_score(3).unwrap(), 4.0 / 7.0);
        assert_eq!(eval.pir_score(), 0.0);

        // Gold pairs (1,1) and (3,2), test pairs (1,1).
        assert_eq!(eval.sp_score(1).unwrap(), 0.5);
        assert_eq!(eval.sp_score(2).unwrap(), 1.0);
        assert_eq!(eval.sp_score(3).unwrap(), 2.0 / 3.0);
        assert_eq!(eval.jc_score(), 0.5);
    }

    #[test]
    fn duplicate_sequences_are_weighted() {
        let gold = ["a b", "a b", "a -"];
        let test = ["a b", "a b", "- a"];
        let eval = eval(&gold, &test);

        // Only the pair of both groups counts, with weight 1/2.
        assert_eq!(eval.sp_score(1).unwrap(), 0.0);
        assert_eq!(eval.sp_score(2).unwrap(), 0.0);
        assert_eq!(eval.jc_score(), 0.0);
        assert_eq!(eval.pir_score(), 2.0 / 3.0);
    }

    #[test]
    fn invalid_alignments() {
        assert!(EvalMsa::new(rows(&["a b", "a"]), rows(&["a b", "a -"])).is_err());
        assert!(EvalMsa::new(rows(&["a b", "a -"]), rows(&["a b", "b -"])).is_err());
        assert!(EvalMsa::new(rows(&["a b"]), rows(&["a b", "a b"])).is_err());
        assert!(eval(&["a"], &["a"]).c_score(5).is_err());
        assert!(eval(&["a"], &["a"]).sp_score(0).is_err());
    }

    #[test]
    fn swap_decisions() {
        assert_eq!(check_swaps(&[], &[]), 0);
        assert_eq!(check_swaps(&[(1, 2, 3)], &[]), 2);
        assert_eq!(check_swaps(&[], &[(1, 2, 3)]), -2);
        assert_eq!(check_swaps(&[(1, 2, 3)], &[(1, 2, 3)]), 1);
        assert_eq!(check_swaps(&[(1, 2, 3)], &[(2, 3, 4)]), -1);
    }
}
