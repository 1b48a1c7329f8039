//! Configuration of the alignment operations.
//!
//! All configuration types implement [`Default`] with the conventional parameter values,
//! and can be deserialised when the `serde` feature is enabled.
//! Missing fields then fall back to their defaults.

use std::{fmt::Display, str::FromStr};

use crate::{
    error::{Error, Result},
    pairwise::AlignmentParameters,
    prosody::ProsodicClass,
};

/// Gap weights for (consonant onsets, vowels and tones, consonant codas).
pub type Scale = (f64, f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlignmentMode {
    Global,
    Local,
    /// Global alignment with free end gaps.
    Overlap,
    /// Chaining of gap-free segments without gap penalties.
    Dialign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TreeMethod {
    Upgma,
    Neighbor,
}

/// When to compare the sum-of-pairs score during iterative refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Check {
    /// After every single realignment, reverting that realignment if it lowered the score.
    Immediate,
    /// Once after all realignments, reverting all of them if the score was lowered.
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScoreMode {
    Classes,
    Library,
}

/// The denominator used when computing the percentage identity of two aligned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidMode {
    /// Aligned positions plus internal gap positions.
    AlignedAndInternalGaps = 1,
    /// Aligned positions.
    Aligned = 2,
    /// The length of the shorter sequence.
    ShorterSequence = 3,
    /// The length of the shorter sequence including its internal gaps.
    ShorterSequenceWithInternalGaps = 4,
    /// Aligned positions plus twice the amount of gaps.
    AlignedAndGaps = 5,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProgressiveConfig {
    pub model: String,
    pub mode: AlignmentMode,
    pub gop: f64,
    /// Multiplied with the gap weight when a gap is extended.
    pub gep_scale: f64,
    pub scale: Scale,
    pub factor: f64,
    pub tree_method: TreeMethod,
    pub gap_weight: f64,
    /// Prosodic classes that must not be matched with unrestricted classes.
    pub restricted_chars: String,
}

/// One pairwise alignment pass that contributes to the consistency library.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryPreset {
    pub mode: AlignmentMode,
    pub gop: f64,
    pub gep_scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LibraryConfig {
    pub model: String,
    /// The mode of the final alignment passes on the library scores.
    pub mode: AlignmentMode,
    pub presets: Vec<LibraryPreset>,
    pub scale: Scale,
    pub factor: f64,
    pub tree_method: TreeMethod,
    pub gap_weight: f64,
    pub restricted_chars: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RefinementConfig {
    pub check: Check,
    pub mode: AlignmentMode,
    pub gop: f64,
    pub gep_scale: f64,
    pub scale: Scale,
    pub factor: f64,
    pub gap_weight: f64,
    pub restricted_chars: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SwapConfig {
    /// The score of a swap marker aligned against anything but another swap marker.
    pub swap_penalty: f64,
    pub score_mode: ScoreMode,
    pub gap_weight: f64,
}

impl ProgressiveConfig {
    pub fn alignment_parameters(&self) -> Result<AlignmentParameters> {
        Ok(AlignmentParameters {
            mode: self.mode,
            gop: self.gop,
            gep_scale: self.gep_scale,
            scale: self.scale,
            factor: self.factor,
            restricted: ProsodicClass::parse_all(&self.restricted_chars)?,
        })
    }

    /// A compact description of the parameters, e.g. `prog_sca_global_-3_0.5_1.0x1.0x1.0_0.0_neighbor_0.5_T`.
    pub fn params(&self) -> String {
        format!(
            "prog_{}_{}_{}_{:.1}_{}_{:.1}_{}_{:.1}_{}",
            self.model,
            self.mode,
            self.gop,
            self.gep_scale,
            format_scale(self.scale),
            self.factor,
            self.tree_method,
            self.gap_weight,
            self.restricted_chars,
        )
    }
}

impl LibraryConfig {
    pub fn preset_parameters(&self) -> Result<Vec<AlignmentParameters>> {
        let restricted = ProsodicClass::parse_all(&self.restricted_chars)?;
        Ok(self
            .presets
            .iter()
            .map(|preset| AlignmentParameters {
                mode: preset.mode,
                gop: preset.gop,
                gep_scale: preset.gep_scale,
                scale: self.scale,
                factor: self.factor,
                restricted: restricted.clone(),
            })
            .collect())
    }

    /// The parameters of the alignments that operate on the library scores.
    ///
    /// The library already encodes all gap and prosody information, so these passes are neutral.
    pub fn library_parameters(&self) -> Result<AlignmentParameters> {
        Ok(AlignmentParameters {
            mode: self.mode,
            gop: 0.0,
            gep_scale: 0.0,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            restricted: ProsodicClass::parse_all(&self.restricted_chars)?,
        })
    }

    pub fn params(&self) -> String {
        let presets = self
            .presets
            .iter()
            .map(|preset| format!("{}x{}x{:.2}", preset.mode, preset.gop, preset.gep_scale))
            .collect::<Vec<_>>()
            .join("y");
        format!(
            "lib_{}_{}_{}_{}_{:.1}_{}_{:.1}_{}",
            self.model,
            self.mode,
            presets,
            format_scale(self.scale),
            self.factor,
            self.tree_method,
            self.gap_weight,
            self.restricted_chars,
        )
    }
}

impl RefinementConfig {
    pub fn alignment_parameters(&self) -> Result<AlignmentParameters> {
        Ok(AlignmentParameters {
            mode: self.mode,
            gop: self.gop,
            gep_scale: self.gep_scale,
            scale: self.scale,
            factor: self.factor,
            restricted: ProsodicClass::parse_all(&self.restricted_chars)?,
        })
    }
}

fn format_scale((onset, nucleus, coda): Scale) -> String {
    format!("{onset:.1}x{nucleus:.1}x{coda:.1}")
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            model: "sca".to_string(),
            mode: AlignmentMode::Global,
            gop: -3.0,
            gep_scale: 0.5,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            tree_method: TreeMethod::Neighbor,
            gap_weight: 0.5,
            restricted_chars: "T".to_string(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            model: "sca".to_string(),
            mode: AlignmentMode::Global,
            presets: vec![
                LibraryPreset {
                    mode: AlignmentMode::Global,
                    gop: -3.0,
                    gep_scale: 0.5,
                },
                LibraryPreset {
                    mode: AlignmentMode::Local,
                    gop: -1.0,
                    gep_scale: 0.5,
                },
            ],
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            tree_method: TreeMethod::Upgma,
            gap_weight: 0.0,
            restricted_chars: "T".to_string(),
        }
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            check: Check::Final,
            mode: AlignmentMode::Global,
            gop: -3.0,
            gep_scale: 0.5,
            scale: (1.0, 1.0, 1.0),
            factor: 0.0,
            gap_weight: 1.0,
            restricted_chars: "T".to_string(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            swap_penalty: -1.0,
            score_mode: ScoreMode::Classes,
            gap_weight: 1.0,
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "global" => Self::Global,
            "local" => Self::Local,
            "overlap" => Self::Overlap,
            "dialign" => Self::Dialign,
            other => return Err(Error::UnknownAlignmentMode(other.to_string())),
        })
    }
}

impl FromStr for TreeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "upgma" => Self::Upgma,
            "neighbor" => Self::Neighbor,
            other => return Err(Error::UnknownTreeMethod(other.to_string())),
        })
    }
}

impl FromStr for Check {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "immediate" => Self::Immediate,
            "final" => Self::Final,
            other => return Err(Error::UnknownCheck(other.to_string())),
        })
    }
}

impl FromStr for ScoreMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "classes" => Self::Classes,
            "library" => Self::Library,
            other => return Err(Error::UnknownScoreMode(other.to_string())),
        })
    }
}

impl TryFrom<u8> for PidMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            1 => Self::AlignedAndInternalGaps,
            2 => Self::Aligned,
            3 => Self::ShorterSequence,
            4 => Self::ShorterSequenceWithInternalGaps,
            5 => Self::AlignedAndGaps,
            other => return Err(Error::UnknownPidMode(other)),
        })
    }
}

impl Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Global => "global",
                Self::Local => "local",
                Self::Overlap => "overlap",
                Self::Dialign => "dialign",
            }
        )
    }
}

impl Display for TreeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Upgma => "upgma",
                Self::Neighbor => "neighbor",
            }
        )
    }
}
