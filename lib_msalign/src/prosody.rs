use std::{fmt::Display, str::FromStr};

use crate::{
    config::Scale,
    error::{Error, Result},
};

/// The sonority value of tone tokens.
pub const TONE_SONORITY: u8 = 9;
/// Sonority values from this value upwards (excluding tones) are vowels.
pub const VOWEL_SONORITY: u8 = 7;

/// The position of a segment within the sonority profile of its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProsodicClass {
    /// A consonant at the start of the sequence.
    Initial,
    /// A consonant followed by a more sonorous segment.
    Ascending,
    Vowel,
    /// A consonant followed by a segment that is not more sonorous.
    Descending,
    /// A consonant at the end of the sequence.
    Final,
    Tone,
}

/// The prosodic class of each segment of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProsodicString(Vec<ProsodicClass>);

/// Everything the pairwise aligner needs to know about one sequence besides its residue scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub prosodic_string: ProsodicString,
    /// The score of aligning a residue against a gap, already multiplied with the gap opening penalty.
    pub gap_weights: Vec<f64>,
    /// Residues with restrictions of different sign must not be matched.
    pub restrictions: Vec<isize>,
}

impl ProsodicClass {
    pub fn as_char(self) -> char {
        match self {
            Self::Initial => '#',
            Self::Ascending => 'C',
            Self::Vowel => 'V',
            Self::Descending => 'c',
            Self::Final => '$',
            Self::Tone => 'T',
        }
    }

    /// Parses a string of prosodic class characters, e.g. the restricted classes of a configuration.
    pub fn parse_all(classes: &str) -> Result<Vec<Self>> {
        classes.chars().map(Self::try_from).collect()
    }
}

impl TryFrom<char> for ProsodicClass {
    type Error = Error;

    fn try_from(value: char) -> Result<Self> {
        Ok(match value {
            '#' => Self::Initial,
            'C' => Self::Ascending,
            'V' => Self::Vowel,
            'c' => Self::Descending,
            '$' => Self::Final,
            'T' => Self::Tone,
            other => return Err(Error::UnknownProsodicClass(other)),
        })
    }
}

impl ProsodicString {
    pub fn from_sonority(sonority: &[u8]) -> Self {
        let is_segment = |value: &&u8| **value != TONE_SONORITY;

        Self(
            sonority
                .iter()
                .enumerate()
                .map(|(index, &value)| {
                    if value == TONE_SONORITY {
                        return ProsodicClass::Tone;
                    }
                    if value >= VOWEL_SONORITY {
                        return ProsodicClass::Vowel;
                    }

                    let previous = sonority[..index].iter().rev().find(is_segment);
                    let next = sonority[index + 1..].iter().find(is_segment);
                    match (previous, next) {
                        (None, _) => ProsodicClass::Initial,
                        (_, None) => ProsodicClass::Final,
                        (Some(_), Some(&next)) if value < next => ProsodicClass::Ascending,
                        _ => ProsodicClass::Descending,
                    }
                })
                .collect(),
        )
    }

    pub fn classes(&self) -> &[ProsodicClass] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The relative cost of placing a gap next to each segment.
    ///
    /// The scale triple weighs (consonant onsets, vowels and tones, consonant codas),
    /// and the factor strengthens the sequence start and weakens the sequence end.
    pub fn weights(&self, scale: Scale, factor: f64) -> Vec<f64> {
        let (onset, nucleus, coda) = scale;
        self.0
            .iter()
            .map(|class| match class {
                ProsodicClass::Initial => onset * (1.0 + factor),
                ProsodicClass::Ascending => onset,
                ProsodicClass::Vowel | ProsodicClass::Tone => nucleus,
                ProsodicClass::Descending => coda,
                ProsodicClass::Final => (coda * (1.0 - factor)).max(0.0),
            })
            .collect()
    }

    /// Position-derived restriction values: negative for restricted classes, positive otherwise.
    pub fn restrictions(&self, restricted: &[ProsodicClass]) -> Vec<isize> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, class)| {
                let value = index as isize + 1;
                if restricted.contains(class) {
                    -value
                } else {
                    value
                }
            })
            .collect()
    }
}

impl Annotation {
    pub fn new(
        sonority: &[u8],
        gop: f64,
        scale: Scale,
        factor: f64,
        restricted: &[ProsodicClass],
    ) -> Self {
        let prosodic_string = ProsodicString::from_sonority(sonority);
        let gap_weights = prosodic_string
            .weights(scale, factor)
            .into_iter()
            .map(|weight| weight * gop)
            .collect();
        let restrictions = prosodic_string.restrictions(restricted);

        Self {
            prosodic_string,
            gap_weights,
            restrictions,
        }
    }

    pub fn len(&self) -> usize {
        self.gap_weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gap_weights.is_empty()
    }
}

/// The consensus sonority of a profile column: the rounded mean of its non-zero values, or zero.
pub fn consensus_sonority(values: impl IntoIterator<Item = u8>) -> u8 {
    let (sum, count) = values
        .into_iter()
        .filter(|&value| value != 0)
        .fold((0u32, 0u32), |(sum, count), value| {
            (sum + u32::from(value), count + 1)
        });

    if count == 0 {
        0
    } else {
        (f64::from(sum) / f64::from(count)).round_ties_even() as u8
    }
}

impl Display for ProsodicClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Display for ProsodicString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for class in &self.0 {
            write!(f, "{class}")?;
        }
        Ok(())
    }
}

impl FromStr for ProsodicString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ProsodicClass::parse_all(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Annotation, ProsodicClass, ProsodicString, consensus_sonority};

    #[test]
    fn prosodic_string_from_sonority() {
        // w o l d e m o r t
        let string = ProsodicString::from_sonority(&[6, 7, 5, 1, 7, 4, 7, 5, 1]);
        assert_eq!(string.to_string(), "#VcCVCVc$");

        // t a ³⁵
        let string = ProsodicString::from_sonority(&[1, 7, 9]);
        assert_eq!(string.to_string(), "#VT");

        // a p
        let string = ProsodicString::from_sonority(&[7, 1]);
        assert_eq!(string.to_string(), "V$");

        let string = ProsodicString::from_sonority(&[1]);
        assert_eq!(string.to_string(), "#");
    }

    #[test]
    fn weights_and_restrictions() {
        let string: ProsodicString = "#CVc$T".parse().unwrap();
        assert_eq!(
            string.weights((2.0, 1.0, 0.5), 0.5),
            vec![3.0, 2.0, 1.0, 0.5, 0.25, 1.0]
        );
        assert_eq!(
            string.restrictions(&[ProsodicClass::Tone]),
            vec![1, 2, 3, 4, 5, -6]
        );
        assert!("#x".parse::<ProsodicString>().is_err());
    }

    #[test]
    fn final_weight_is_not_negative() {
        let string: ProsodicString = "V$".parse().unwrap();
        assert_eq!(string.weights((1.0, 1.0, 1.0), 2.0), vec![1.0, 0.0]);
    }

    #[test]
    fn annotation_scales_with_gap_opening() {
        let annotation = Annotation::new(&[1, 7, 1], -2.0, (1.0, 1.0, 1.0), 0.0, &[]);
        assert_eq!(annotation.gap_weights, vec![-2.0, -2.0, -2.0]);
        assert_eq!(annotation.restrictions, vec![1, 2, 3]);
        assert_eq!(annotation.prosodic_string.to_string(), "#V$");
    }

    #[test]
    fn consensus() {
        assert_eq!(consensus_sonority([0, 0]), 0);
        assert_eq!(consensus_sonority([7, 0, 5]), 6);
        assert_eq!(consensus_sonority([1, 2]), 2);
        assert_eq!(consensus_sonority([2, 3]), 2);
        assert_eq!(consensus_sonority([4, 4, 5]), 4);
    }
}
