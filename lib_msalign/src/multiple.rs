use std::fmt::Display;

use log::info;

use crate::{
    config::{
        AlignmentMode, LibraryConfig, PidMode, ProgressiveConfig, RefinementConfig, ScoreMode,
        SwapConfig, TreeMethod,
    },
    error::{Error, Result},
    evaluate::GAP,
    guide_tree::{Clustering, GuideTree, GuideTreeBuilder},
    library::build_library,
    metrics::{peaks, pid, sum_of_pairs},
    model::ClassModel,
    pairwise::{
        AlignmentParameters, DynamicProgrammingAligner, PairwiseAligner,
        table::{DistanceMatrix, PairwiseAlignmentTable},
    },
    profile::{Profile, ProfileAligner},
    progressive::merge_alignments,
    refine::{group_by_gap_profile, iterate, orphans, singletons},
    residue::{ResidueId, ResidueIndex, Token},
    scorer::{ScoreModel, ScoreTable},
    swap::{apply_swap, detect_swaps},
    tokenizer::{IpaTokenizer, Tokenizer},
    unique::UniqueSequenceIndex,
};

/// A multiple alignment session over a fixed set of sequences.
///
/// Sequences with the same class symbols are aligned as a single unique row,
/// and the alignment of the original sequences is derived from the unique rows.
pub struct Multiple {
    sequences: Vec<String>,
    tokens: Vec<Vec<String>>,
    /// Groups of sequences with the same raw string.
    identical: UniqueSequenceIndex,
    aligner: Box<dyn PairwiseAligner>,
    guide_tree_builder: Box<dyn GuideTreeBuilder>,
    custom_models: Vec<ClassModel>,
    model: Option<ModelState>,
    alignment: Option<AlignmentState>,
    params: Option<String>,
    swap_index: Vec<(usize, usize, usize)>,
}

struct ModelState {
    model: ClassModel,
    /// The class symbols of each original sequence.
    classes: Vec<Vec<char>>,
    unique: UniqueSequenceIndex,
    /// The sonority values of each unique row.
    sonority: Vec<Vec<u8>>,
    scores: ScoreModel,
}

struct AlignmentState {
    distances: DistanceMatrix,
    guide_tree: GuideTree,
    /// The alignment of the unique rows.
    profile: Profile,
}

/// The pairwise alignment of two original sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseRecord {
    pub first: usize,
    pub second: usize,
    pub alignment_first: Vec<String>,
    pub alignment_second: Vec<String>,
    pub similarity: f64,
    pub distance: f64,
}

impl Multiple {
    /// Tokenizes the sequences as IPA transcriptions with merged vowels.
    pub fn new<S: Into<String>>(sequences: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::with_tokenizer(sequences, &IpaTokenizer::default())
    }

    pub fn with_tokenizer<S: Into<String>>(
        sequences: impl IntoIterator<Item = S>,
        tokenizer: &dyn Tokenizer,
    ) -> Result<Self> {
        let sequences: Vec<String> = sequences.into_iter().map(Into::into).collect();
        if sequences.is_empty() {
            return Err(Error::EmptyInput);
        }

        let tokens = sequences
            .iter()
            .map(|sequence| tokenizer.tokenize(sequence))
            .collect();
        let identical = UniqueSequenceIndex::new(&sequences);

        Ok(Self {
            sequences,
            tokens,
            identical,
            aligner: Box::new(DynamicProgrammingAligner),
            guide_tree_builder: Box::new(Clustering),
            custom_models: Vec::new(),
            model: None,
            alignment: None,
            params: None,
            swap_index: Vec::new(),
        })
    }

    pub fn with_pairwise_aligner(mut self, aligner: impl PairwiseAligner + 'static) -> Self {
        self.aligner = Box::new(aligner);
        self
    }

    pub fn with_guide_tree_builder(mut self, builder: impl GuideTreeBuilder + 'static) -> Self {
        self.guide_tree_builder = Box::new(builder);
        self
    }

    /// Makes a model available by its name, taking precedence over a built-in model of the same name.
    pub fn register_model(&mut self, model: ClassModel) {
        self.custom_models
            .retain(|registered| registered.name() != model.name());
        self.custom_models.push(model);
    }

    fn resolve_model(&self, name: &str) -> Result<ClassModel> {
        match self
            .custom_models
            .iter()
            .find(|model| model.name() == name)
        {
            Some(model) => Ok(model.clone()),
            None => ClassModel::by_name(name),
        }
    }

    fn model_state(&self, name: &str) -> Result<ModelState> {
        let model = self.resolve_model(name)?;
        let classes: Vec<Vec<char>> = self
            .tokens
            .iter()
            .map(|tokens| model.classes(tokens))
            .collect();
        let unique = UniqueSequenceIndex::new(&classes);

        let representatives: Vec<_> = (0..unique.len())
            .map(|row| unique.representative(row))
            .collect();
        let sonority = representatives
            .iter()
            .map(|&sequence| model.sonorities(&self.tokens[sequence]))
            .collect();
        let unique_classes: Vec<&[char]> = representatives
            .iter()
            .map(|&sequence| classes[sequence].as_slice())
            .collect();
        let index = ResidueIndex::new(unique_classes.iter().map(|classes| classes.len()));
        let scores = ScoreModel::new(ScoreTable::from_classes(index, &unique_classes, &model));

        info!(
            "Set model {} with {} unique rows for {} sequences",
            model.name(),
            unique.len(),
            unique.sequence_count()
        );
        Ok(ModelState {
            model,
            classes,
            unique,
            sonority,
            scores,
        })
    }

    /// Converts the tokens to the classes of the named model and groups identical class sequences.
    ///
    /// This discards any previous alignment.
    pub fn set_model(&mut self, name: &str) -> Result<()> {
        self.model = Some(self.model_state(name)?);
        self.alignment = None;
        self.swap_index.clear();
        Ok(())
    }

    /// Progressive alignment with scores derived from the sound classes.
    pub fn prog_align(&mut self, config: &ProgressiveConfig) -> Result<()> {
        let parameters = config.alignment_parameters()?;
        self.set_model(&config.model)?;
        let state = self.model.as_mut().ok_or(Error::NotAligned)?;
        state.scores.set_mode(ScoreMode::Classes)?;

        // The distances are always derived from global alignments, the mode applies to the merges.
        let distance_parameters = AlignmentParameters {
            mode: AlignmentMode::Global,
            ..parameters.clone()
        };
        let table = PairwiseAlignmentTable::compute(
            self.aligner.as_ref(),
            &state.sonority,
            state.scores.active(),
            &distance_parameters,
        )?;
        info!("Computed the pairwise alignments of {} rows", table.height());

        self.align_along_guide_tree(&table, config.tree_method, &parameters, config.gap_weight)?;
        self.params = Some(config.params());
        Ok(())
    }

    /// Progressive alignment with scores from a consistency library.
    pub fn lib_align(&mut self, config: &LibraryConfig) -> Result<()> {
        let presets = config.preset_parameters()?;
        let parameters = config.library_parameters()?;
        self.set_model(&config.model)?;
        let state = self.model.as_mut().ok_or(Error::NotAligned)?;

        let library = build_library(
            self.aligner.as_ref(),
            &state.sonority,
            state.scores.classes(),
            &presets,
        )?;
        state.scores.set_library(library);

        let table = PairwiseAlignmentTable::compute(
            self.aligner.as_ref(),
            &state.sonority,
            state.scores.active(),
            &parameters,
        )?;
        info!(
            "Computed the pairwise alignments of {} rows on the library",
            table.height()
        );

        self.align_along_guide_tree(&table, config.tree_method, &parameters, config.gap_weight)?;
        self.params = Some(config.params());
        Ok(())
    }

    fn align_along_guide_tree(
        &mut self,
        table: &PairwiseAlignmentTable,
        method: TreeMethod,
        parameters: &AlignmentParameters,
        gap_weight: f64,
    ) -> Result<()> {
        let state = self.model.as_ref().ok_or(Error::NotAligned)?;
        let distances = table.distance_matrix();
        let guide_tree = self.guide_tree_builder.guide_tree(&distances, method);

        let profile_aligner = ProfileAligner {
            aligner: self.aligner.as_ref(),
            scorer: state.scores.active(),
            sonority: &state.sonority,
            parameters,
            gap_weight,
        };
        let profile = merge_alignments(&profile_aligner, &guide_tree)?;

        self.alignment = Some(AlignmentState {
            distances,
            guide_tree,
            profile,
        });
        self.swap_index.clear();
        Ok(())
    }

    fn refine(&mut self, partitions: &[Vec<usize>], config: &RefinementConfig) -> Result<()> {
        let parameters = config.alignment_parameters()?;
        let (Some(state), Some(alignment)) = (self.model.as_ref(), self.alignment.as_mut()) else {
            return Err(Error::NotAligned);
        };

        let profile_aligner = ProfileAligner {
            aligner: self.aligner.as_ref(),
            scorer: state.scores.active(),
            sonority: &state.sonority,
            parameters: &parameters,
            gap_weight: config.gap_weight,
        };
        if iterate(
            &mut alignment.profile,
            partitions,
            &profile_aligner,
            config.check,
        ) {
            self.swap_index.clear();
        }
        Ok(())
    }

    fn alignment_state(&self) -> Result<&AlignmentState> {
        self.alignment.as_ref().ok_or(Error::NotAligned)
    }

    fn aligned_state(&self) -> Result<(&ModelState, &AlignmentState)> {
        match (&self.model, &self.alignment) {
            (Some(model), Some(alignment)) => Ok((model, alignment)),
            _ => Err(Error::NotAligned),
        }
    }

    /// Realigns each row whose mean distance to all rows is above the mean distance.
    pub fn iterate_orphans(&mut self, config: &RefinementConfig) -> Result<()> {
        let partitions: Vec<_> = orphans(&self.alignment_state()?.distances)
            .into_iter()
            .map(|row| vec![row])
            .collect();
        self.refine(&partitions, config)
    }

    /// Realigns the flat clusters of the guide tree at the given distance threshold.
    ///
    /// Does nothing for less than three sequences.
    pub fn iterate_clusters(&mut self, threshold: f64, config: &RefinementConfig) -> Result<()> {
        let distances = &self.alignment_state()?.distances;
        if self.sequences.len() < 3 {
            info!("Skipping cluster refinement of {} sequences", self.sequences.len());
            return Ok(());
        }

        let partitions = self.guide_tree_builder.flat_clusters(distances, threshold);
        self.refine(&partitions, config)
    }

    /// Realigns the groups of rows with the same gap profile.
    pub fn iterate_similar_gap_sites(&mut self, config: &RefinementConfig) -> Result<()> {
        let partitions = group_by_gap_profile(&self.alignment_state()?.profile);
        self.refine(&partitions, config)
    }

    /// Realigns every row on its own.
    pub fn iterate_all_sequences(&mut self, config: &RefinementConfig) -> Result<()> {
        let partitions = singletons(self.alignment_state()?.profile.height());
        self.refine(&partitions, config)
    }

    /// The sum-of-pairs score of the unique rows under the active scores.
    pub fn sum_of_pairs(&self, gap_weight: f64) -> Result<f64> {
        let (model, alignment) = self.aligned_state()?;
        Ok(sum_of_pairs(
            &alignment.profile,
            model.scores.active(),
            gap_weight,
        ))
    }

    /// The score of each column of the unique rows against itself.
    pub fn peaks(&self, gap_weight: f64) -> Result<Vec<f64>> {
        let (model, alignment) = self.aligned_state()?;
        Ok(peaks(&alignment.profile, model.scores.active(), gap_weight))
    }

    /// Detects swaps, marks them in the alignment and returns `true` if any were found.
    pub fn swap_check(&mut self, config: &SwapConfig) -> Result<bool> {
        let (Some(state), Some(alignment)) = (self.model.as_mut(), self.alignment.as_mut()) else {
            return Err(Error::NotAligned);
        };
        state.scores.set_mode(config.score_mode)?;

        let swaps = detect_swaps(&alignment.profile, state.scores.active(), config);
        for &column in &swaps {
            apply_swap(&mut alignment.profile, column);
        }

        self.swap_index = swaps
            .into_iter()
            .map(|column| (column, column + 1, column + 2))
            .collect();
        Ok(!self.swap_index.is_empty())
    }

    pub fn swap_index(&self) -> &[(usize, usize, usize)] {
        &self.swap_index
    }

    /// The alignment of the original sequences, where each row holds the residues of the sequence of the same index.
    pub fn alignment(&self) -> Result<Profile> {
        let (model, alignment) = self.aligned_state()?;
        Profile::from_rows(
            (0..self.sequences.len())
                .map(|sequence| {
                    alignment
                        .profile
                        .row(model.unique.internal(sequence))
                        .iter()
                        .map(|token| match token {
                            Token::Residue(residue) => {
                                Token::Residue(ResidueId::new(sequence, residue.position))
                            }
                            other => *other,
                        })
                        .collect()
                })
                .collect(),
        )
    }

    /// The alignment of the original sequences as tokens, with [`GAP`] for every cell without a residue.
    pub fn alignment_tokens(&self) -> Result<Vec<Vec<String>>> {
        let alignment = self.alignment()?;
        Ok(alignment
            .rows()
            .map(|row| {
                row.iter()
                    .map(|token| self.token(*token).unwrap_or(GAP).to_string())
                    .collect()
            })
            .collect())
    }

    fn token(&self, token: Token) -> Option<&str> {
        token
            .residue()
            .map(|residue| self.tokens[residue.row][residue.position].as_str())
    }

    /// The percentage identity of all pairs of different sequences,
    /// weighted by the inverse sizes of the groups of identical sequences.
    ///
    /// A single distinct sequence is fully identical with itself.
    pub fn pid(&self, mode: PidMode) -> Result<f64> {
        let score: f64 = self
            .alignment_pids(mode)?
            .into_iter()
            .map(|(a, b, pid)| {
                let weight_a = 1.0 / self.identical.external(self.identical.internal(a)).len() as f64;
                let weight_b = 1.0 / self.identical.external(self.identical.internal(b)).len() as f64;
                pid * weight_a * weight_b
            })
            .sum();

        let groups = self.identical.len();
        let count = (groups * groups - groups) / 2;
        Ok(if count == 0 {
            1.0
        } else {
            score / count as f64
        })
    }

    /// The percentage identity in the alignment of each pair `a < b` of sequences that are not identical.
    pub fn alignment_pids(&self, mode: PidMode) -> Result<Vec<(usize, usize, f64)>> {
        let alignment = self.alignment()?;
        let rows: Vec<Vec<Option<&str>>> = alignment
            .rows()
            .map(|row| row.iter().map(|token| self.token(*token)).collect())
            .collect();

        let mut result = Vec::new();
        for a in 0..rows.len() {
            for b in a + 1..rows.len() {
                if self.identical.internal(a) != self.identical.internal(b) {
                    result.push((a, b, pid(&rows[a], &rows[b], mode)));
                }
            }
        }
        Ok(result)
    }

    /// Aligns all pairs of unique rows with the class scores of the configured model,
    /// and reports the alignment of each pair of original sequences whose rows `i <= j`.
    ///
    /// The session's model and alignment are not changed.
    pub fn pairwise_alignments(&self, config: &ProgressiveConfig) -> Result<Vec<PairwiseRecord>> {
        let parameters = config.alignment_parameters()?;
        let state = self.model_state(&config.model)?;
        let table = PairwiseAlignmentTable::compute(
            self.aligner.as_ref(),
            &state.sonority,
            state.scores.classes(),
            &parameters,
        )?;

        let render = |tokens: &[Token], sequence: usize| -> Vec<String> {
            tokens
                .iter()
                .map(|token| match token.residue() {
                    Some(residue) => self.tokens[sequence][residue.position].clone(),
                    None => GAP.to_string(),
                })
                .collect()
        };

        let mut records = Vec::new();
        for i in 0..table.height() {
            for j in i..table.height() {
                let pair = table.get(i, j);
                for &first in state.unique.external(i) {
                    for &second in state.unique.external(j) {
                        records.push(PairwiseRecord {
                            first,
                            second,
                            alignment_first: render(&pair.a, first),
                            alignment_second: render(&pair.b, second),
                            similarity: pair.similarity,
                            distance: table.distance(i, j),
                        });
                    }
                }
            }
        }
        Ok(records)
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    pub fn tokens(&self) -> &[Vec<String>] {
        &self.tokens
    }

    pub fn model(&self) -> Option<&ClassModel> {
        self.model.as_ref().map(|state| &state.model)
    }

    /// The class symbols of each sequence under the current model.
    pub fn classes(&self) -> Option<&[Vec<char>]> {
        self.model.as_ref().map(|state| state.classes.as_slice())
    }

    /// The groups of sequences with identical class symbols under the current model.
    pub fn unique_rows(&self) -> Option<&UniqueSequenceIndex> {
        self.model.as_ref().map(|state| &state.unique)
    }

    pub fn library(&self) -> Option<&ScoreTable> {
        self.model
            .as_ref()
            .and_then(|state| state.scores.library())
    }

    /// A description of the parameters of the last alignment.
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    pub fn distances(&self) -> Result<&DistanceMatrix> {
        Ok(&self.alignment_state()?.distances)
    }

    pub fn guide_tree(&self) -> Result<&GuideTree> {
        Ok(&self.alignment_state()?.guide_tree)
    }

    /// The alignment of the unique rows.
    pub fn unique_alignment(&self) -> Result<&Profile> {
        Ok(&self.alignment_state()?.profile)
    }
}

impl Display for Multiple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows = self
            .alignment_tokens()
            .unwrap_or_else(|_| self.tokens.clone());

        let mut once = true;
        for row in rows {
            if once {
                once = false;
            } else {
                writeln!(f)?;
            }
            write!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

impl PartialEq for Multiple {
    fn eq(&self, other: &Self) -> bool {
        match (self.alignment_tokens(), other.alignment_tokens()) {
            (Ok(a), Ok(b)) => a == b,
            (Err(_), Err(_)) => self.sequences == other.sequences,
            _ => false,
        }
    }
}
