use ndarray::Array2;

use crate::{
    config::ScoreMode,
    error::{Error, Result},
    model::ClassModel,
    residue::{ResidueId, ResidueIndex},
};

/// Scores for every pair of residues of the unique rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    index: ResidueIndex,
    scores: Array2<f64>,
}

/// The residue scores of a session.
///
/// Exactly one of the class-based and the library-based tables is active at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreModel {
    classes: ScoreTable,
    library: Option<ScoreTable>,
    mode: ScoreMode,
}

impl ScoreTable {
    pub fn zeros(index: ResidueIndex) -> Self {
        let scores = Array2::zeros((index.len(), index.len()));
        Self { index, scores }
    }

    /// Scores each residue pair by looking up the class symbols of the residues in the model.
    pub fn from_classes(index: ResidueIndex, classes: &[&[char]], model: &ClassModel) -> Self {
        debug_assert_eq!(index.rows(), classes.len());
        let symbols: Vec<char> = classes.iter().flat_map(|row| row.iter().copied()).collect();
        let scores = Array2::from_shape_fn((index.len(), index.len()), |(a, b)| {
            model.score(symbols[a], symbols[b])
        });

        Self { index, scores }
    }

    pub fn index(&self) -> &ResidueIndex {
        &self.index
    }

    pub fn get(&self, a: ResidueId, b: ResidueId) -> f64 {
        self.scores[[self.index.dense(a), self.index.dense(b)]]
    }

    /// Adds `value` to the score of `(a, b)` and mirrors the result to `(b, a)`.
    pub fn add_symmetric(&mut self, a: ResidueId, b: ResidueId, value: f64) {
        let (a, b) = (self.index.dense(a), self.index.dense(b));
        let score = self.scores[[a, b]] + value;
        self.scores[[a, b]] = score;
        self.scores[[b, a]] = score;
    }

    pub fn is_symmetric(&self) -> bool {
        self.scores == self.scores.t()
    }
}

impl ScoreModel {
    pub fn new(classes: ScoreTable) -> Self {
        Self {
            classes,
            library: None,
            mode: ScoreMode::Classes,
        }
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    /// The currently active score table.
    pub fn active(&self) -> &ScoreTable {
        match (self.mode, &self.library) {
            (ScoreMode::Library, Some(library)) => library,
            _ => &self.classes,
        }
    }

    pub fn classes(&self) -> &ScoreTable {
        &self.classes
    }

    pub fn library(&self) -> Option<&ScoreTable> {
        self.library.as_ref()
    }

    pub fn set_mode(&mut self, mode: ScoreMode) -> Result<()> {
        if mode == ScoreMode::Library && self.library.is_none() {
            return Err(Error::NoLibrary);
        }
        self.mode = mode;
        Ok(())
    }

    /// Stores the library and makes it the active table.
    pub fn set_library(&mut self, library: ScoreTable) {
        self.library = Some(library);
        self.mode = ScoreMode::Library;
    }
}

#[cfg(test)]
mod tests {
    use super::{ScoreModel, ScoreTable};
    use crate::{
        config::ScoreMode,
        model::ClassModel,
        residue::{ResidueId, ResidueIndex},
    };

    #[test]
    fn class_scores() {
        let model = ClassModel::by_name("dolgo").unwrap();
        let first = ['T', 'V'];
        let second = ['T'];
        let table =
            ScoreTable::from_classes(ResidueIndex::new([2, 1]), &[&first[..], &second[..]], &model);

        assert_eq!(table.get(ResidueId::new(0, 0), ResidueId::new(1, 0)), 10.0);
        assert_eq!(table.get(ResidueId::new(0, 1), ResidueId::new(1, 0)), -10.0);
        assert_eq!(table.get(ResidueId::new(0, 1), ResidueId::new(0, 1)), 5.0);
        assert!(table.is_symmetric());
    }

    #[test]
    fn add_symmetric() {
        let mut table = ScoreTable::zeros(ResidueIndex::new([1, 2]));
        table.add_symmetric(ResidueId::new(0, 0), ResidueId::new(1, 1), 1.5);
        table.add_symmetric(ResidueId::new(1, 1), ResidueId::new(0, 0), 1.0);
        table.add_symmetric(ResidueId::new(1, 0), ResidueId::new(1, 0), 2.0);

        assert_eq!(table.get(ResidueId::new(0, 0), ResidueId::new(1, 1)), 2.5);
        assert_eq!(table.get(ResidueId::new(1, 1), ResidueId::new(0, 0)), 2.5);
        assert_eq!(table.get(ResidueId::new(1, 0), ResidueId::new(1, 0)), 2.0);
        assert!(table.is_symmetric());
    }

    #[test]
    fn library_mode_requires_library() {
        let mut model = ScoreModel::new(ScoreTable::zeros(ResidueIndex::new([1])));
        assert!(model.set_mode(ScoreMode::Library).is_err());

        model.set_library(ScoreTable::zeros(ResidueIndex::new([1])));
        assert_eq!(model.mode(), ScoreMode::Library);
        model.set_mode(ScoreMode::Classes).unwrap();
        assert_eq!(model.mode(), ScoreMode::Classes);
    }
}
