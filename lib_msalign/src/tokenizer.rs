//! Segmentation of raw phonetic strings into tokens.

/// Splits a raw sequence string into its tokens.
pub trait Tokenizer {
    fn tokenize(&self, raw: &str) -> Vec<String>;
}

/// A tokenizer for IPA-like transcriptions.
///
/// Combining diacritics and modifier letters attach to the preceding token,
/// tone markers form tokens of their own, and consecutive vowels may be merged into a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpaTokenizer {
    pub merge_vowels: bool,
}

const VOWELS: &str = "aeiouyɑɐɒæɛɜɞəɘɵɤɔøœɶɪʊʏʉɨɯʌ";
const TONES: &str = "0123456789⁰¹²³⁴⁵⁶⁷⁸⁹˥˦˧˨˩";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Consonant,
    Vowel,
    Tone,
}

impl Default for IpaTokenizer {
    fn default() -> Self {
        Self { merge_vowels: true }
    }
}

impl Tokenizer for IpaTokenizer {
    fn tokenize(&self, raw: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        let mut previous: Option<Kind> = None;
        let mut tied = false;

        for c in raw.chars() {
            if c.is_whitespace() {
                previous = None;
                tied = false;
                continue;
            }

            if tied {
                if let Some(token) = tokens.last_mut() {
                    token.push(c);
                }
                tied = false;
            } else if is_tie_bar(c) {
                match tokens.last_mut() {
                    Some(token) if previous.is_some() => {
                        token.push(c);
                        tied = true;
                    }
                    _ => {
                        tokens.push(c.to_string());
                        previous = Some(Kind::Consonant);
                    }
                }
            } else if is_tone(c) {
                match (previous, tokens.last_mut()) {
                    (Some(Kind::Tone), Some(token)) => token.push(c),
                    _ => tokens.push(c.to_string()),
                }
                previous = Some(Kind::Tone);
            } else if is_diacritic(c) {
                match (previous, tokens.last_mut()) {
                    (Some(_), Some(token)) => token.push(c),
                    _ => {
                        tokens.push(c.to_string());
                        previous = Some(Kind::Consonant);
                    }
                }
            } else if is_vowel(c) {
                match (previous, tokens.last_mut()) {
                    (Some(Kind::Vowel), Some(token)) if self.merge_vowels => token.push(c),
                    _ => tokens.push(c.to_string()),
                }
                previous = Some(Kind::Vowel);
            } else {
                tokens.push(c.to_string());
                previous = Some(Kind::Consonant);
            }
        }

        tokens
    }
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(c)
}

fn is_tone(c: char) -> bool {
    TONES.contains(c)
}

fn is_tie_bar(c: char) -> bool {
    c == '\u{0361}' || c == '\u{035C}'
}

/// Combining diacritics and spacing modifier letters.
fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{02B0}'..='\u{02FF}' | '\u{1DC0}'..='\u{1DFF}')
        && !is_tone(c)
}
