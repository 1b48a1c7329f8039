use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An IO error occurred: {0}.")]
    Io(#[from] std::io::Error),

    #[error("A parsing error of kind '{kind:?}' occurred when the remaining input was '{input}'.")]
    Parser {
        input: String,
        kind: nom::error::ErrorKind,
    },

    #[error("Parsing was unsuccessful due to incomplete input: {0:?}.")]
    ParserIncomplete(nom::Needed),

    #[error("The class model '{0}' is not available.")]
    UnknownModel(String),

    #[error("The guide tree method '{0}' is not available. Use 'upgma' or 'neighbor'.")]
    UnknownTreeMethod(String),

    #[error("The alignment mode '{0}' is not available.")]
    UnknownAlignmentMode(String),

    #[error("The refinement check '{0}' is not available. Use 'immediate' or 'final'.")]
    UnknownCheck(String),

    #[error("The score mode '{0}' is not available. Use 'classes' or 'library'.")]
    UnknownScoreMode(String),

    #[error("The PID mode {0} is not available. It must be between 1 and 5.")]
    UnknownPidMode(u8),

    #[error("The evaluation mode {0} is not available.")]
    UnknownEvaluationMode(u8),

    #[error("The character '{0}' is not a prosodic class.")]
    UnknownProsodicClass(char),

    #[error("The residue identifier '{0}' is malformed.")]
    InvalidResidueId(String),

    #[error("The character '{character}' appears twice in the {section} section of model '{model}'.")]
    DuplicateModelEntry {
        model: String,
        section: &'static str,
        character: char,
    },

    #[error("The sonority key '{0}' is not a decimal digit.")]
    InvalidSonority(char),

    #[error("The scores for the classes '{first}' and '{second}' in model '{model}' conflict.")]
    ConflictingScore {
        model: String,
        first: char,
        second: char,
    },

    #[error("No sequences were given.")]
    EmptyInput,

    #[error("The sequences have not been aligned yet.")]
    NotAligned,

    #[error("The consistency library has not been built yet. Run a library alignment first.")]
    NoLibrary,

    #[error("Guide tree merge {step} refers to the unavailable cluster {cluster}.")]
    InvalidGuideTree { step: usize, cluster: usize },

    #[error("The pairwise aligner returned {actual} alignments for {expected} pairs of rows.")]
    PairwiseAlignmentCount { expected: usize, actual: usize },

    #[error("The alignment is not rectangular: row {row} has {actual} columns, but {expected} were expected.")]
    RaggedAlignment {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("The gold and test alignments do not contain the same sequences.")]
    MismatchedAlignments,
}
