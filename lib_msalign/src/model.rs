use std::collections::HashMap;

use crate::error::{Error, Result};

pub mod io;

/// The class of characters that are not part of a model.
pub const FALLBACK_CLASS: char = '0';
/// The sonority of characters that are not part of a model.
pub const FALLBACK_SONORITY: u8 = 1;

const DOLGO: &str = include_str!("../models/dolgo.model");
const SCA: &str = include_str!("../models/sca.model");
const ASJP: &str = include_str!("../models/asjp.model");

/// A sound-class model.
///
/// It reduces tokens to class symbols, assigns a sonority to each token,
/// and scores pairs of class symbols.
/// Tokens are looked up by their first character, so diacritics do not change a token's class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassModel {
    name: String,
    classes: HashMap<char, char>,
    sonority: HashMap<char, u8>,
    scores: HashMap<(char, char), f64>,
    match_score: f64,
    mismatch_score: f64,
}

impl ClassModel {
    /// The names of the built-in models.
    pub const AVAILABLE: [&'static str; 3] = ["dolgo", "sca", "asjp"];

    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "dolgo" => Self::parse_plain(DOLGO),
            "sca" => Self::parse_plain(SCA),
            "asjp" => Self::parse_plain(ASJP),
            other => Err(Error::UnknownModel(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self, token: &str) -> char {
        token
            .chars()
            .next()
            .and_then(|c| self.classes.get(&c))
            .copied()
            .unwrap_or(FALLBACK_CLASS)
    }

    pub fn classes(&self, tokens: &[impl AsRef<str>]) -> Vec<char> {
        tokens
            .iter()
            .map(|token| self.class(token.as_ref()))
            .collect()
    }

    pub fn sonority(&self, token: &str) -> u8 {
        token
            .chars()
            .next()
            .and_then(|c| self.sonority.get(&c))
            .copied()
            .unwrap_or(FALLBACK_SONORITY)
    }

    pub fn sonorities(&self, tokens: &[impl AsRef<str>]) -> Vec<u8> {
        tokens
            .iter()
            .map(|token| self.sonority(token.as_ref()))
            .collect()
    }

    pub fn score(&self, a: char, b: char) -> f64 {
        self.scores
            .get(&(a, b))
            .copied()
            .unwrap_or(if a == b {
                self.match_score
            } else {
                self.mismatch_score
            })
    }
}
