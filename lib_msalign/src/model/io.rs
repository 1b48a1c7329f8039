use std::{collections::HashMap, io::Read, path::Path};

use log::debug;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, satisfy, space1},
    combinator::map,
    multi::{many0, many1},
    number::complete::double,
    sequence::{preceded, tuple},
};

use crate::{
    error::{Error, Result},
    io::{
        expect_end, expect_section, is_any_whitespace, parse_line, parse_title,
        skip_any_whitespace, skip_whitespace, translate_nom_error,
    },
};

use super::ClassModel;

const DEFAULT_MATCH_SCORE: f64 = 10.0;
const DEFAULT_MISMATCH_SCORE: f64 = 0.0;

enum ScoreLine {
    Match(f64),
    Mismatch(f64),
    Pair(char, char, f64),
}

impl ClassModel {
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading class model file {path:?}");
        Self::read_plain(std::fs::File::open(path)?)
    }

    pub fn read_plain(mut reader: impl Read) -> Result<Self> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Self::parse_plain(&input)
    }

    /// Parses a model in plain text format.
    ///
    /// The format consists of a `# name` title followed by the sections `Classes`, `Sonority` and `Scores`.
    /// The first two sections contain lines of the form `K: a b c`, assigning the characters `a`, `b` and `c` to the key `K`.
    /// Sonority keys are single decimal digits.
    /// The score section contains `match <score>`, `mismatch <score>` and `<class> <class> <score>` lines,
    /// where the latter are mirrored automatically.
    pub fn parse_plain(input: &str) -> Result<Self> {
        let (input, name) = parse_title(input).map_err(translate_nom_error)?;
        let name = name.to_string();

        let input = expect_section(input, "Classes")?;
        let (input, class_lines) = many1(parse_assignment)
            .parse(input)
            .map_err(translate_nom_error)?;
        let input = expect_section(input, "Sonority")?;
        let (input, sonority_lines) = many1(parse_assignment)
            .parse(input)
            .map_err(translate_nom_error)?;
        let input = expect_section(input, "Scores")?;
        let (input, score_lines) = many0(parse_score_line)
            .parse(input)
            .map_err(translate_nom_error)?;
        expect_end(input)?;

        let mut classes = HashMap::new();
        for (class, members) in class_lines {
            for member in members {
                if classes.insert(member, class).is_some() {
                    return Err(Error::DuplicateModelEntry {
                        model: name,
                        section: "Classes",
                        character: member,
                    });
                }
            }
        }

        let mut sonority = HashMap::new();
        for (key, members) in sonority_lines {
            let value = key
                .to_digit(10)
                .ok_or(Error::InvalidSonority(key))? as u8;
            for member in members {
                if sonority.insert(member, value).is_some() {
                    return Err(Error::DuplicateModelEntry {
                        model: name,
                        section: "Sonority",
                        character: member,
                    });
                }
            }
        }

        let mut match_score = DEFAULT_MATCH_SCORE;
        let mut mismatch_score = DEFAULT_MISMATCH_SCORE;
        let mut scores = HashMap::new();
        for line in score_lines {
            match line {
                ScoreLine::Match(score) => match_score = score,
                ScoreLine::Mismatch(score) => mismatch_score = score,
                ScoreLine::Pair(first, second, score) => {
                    for key in [(first, second), (second, first)] {
                        if let Some(previous) = scores.insert(key, score) {
                            if previous != score {
                                return Err(Error::ConflictingScore {
                                    model: name,
                                    first,
                                    second,
                                });
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "Parsed class model '{name}' with {} characters and {} score overrides",
            classes.len(),
            scores.len()
        );

        Ok(Self {
            name,
            classes,
            sonority,
            scores,
            match_score,
            mismatch_score,
        })
    }
}

/// Parses a line `K: a b c`.
fn parse_assignment(input: &str) -> IResult<&str, (char, Vec<char>)> {
    let input = skip_any_whitespace(input)?;
    let (input, key) = satisfy(|c| !is_any_whitespace(c) && c != ':')(input)?;
    let input = skip_whitespace(input)?;
    let (input, _) = char(':')(input)?;
    let (input, members) = parse_line(input)?;

    Ok((
        input,
        (key, members.chars().filter(|c| !c.is_whitespace()).collect()),
    ))
}

fn parse_score_line(input: &str) -> IResult<&str, ScoreLine> {
    let input = skip_any_whitespace(input)?;
    let is_symbol = |c: char| !is_any_whitespace(c);

    alt((
        map(preceded(tuple((tag("mismatch"), space1)), double), ScoreLine::Mismatch),
        map(preceded(tuple((tag("match"), space1)), double), ScoreLine::Match),
        map(
            tuple((satisfy(is_symbol), space1, satisfy(is_symbol), space1, double)),
            |(first, _, second, _, score)| ScoreLine::Pair(first, second, score),
        ),
    ))(input)
}
