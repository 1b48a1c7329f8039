use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use lib_msalign::{Multiple, config::PidMode, model::ClassModel, tokenizer::IpaTokenizer};
use log::{LevelFilter, debug, info};
use serde::Serialize;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::{align::configuration::Configuration, input::read_word_list};

pub mod configuration;

#[derive(Parser)]
pub struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// The path to the word list to align.
    ///
    /// The file contains one sequence per line.
    /// Blank lines and lines starting with '#' are ignored.
    #[clap(long, short = 'i')]
    input: PathBuf,

    /// A toml file with the parameters of the alignment stages.
    ///
    /// It may contain the tables `progressive`, `library`, `refinement` and `swap`.
    /// Missing tables and fields fall back to their defaults.
    #[clap(long, short = 'c')]
    configuration: Option<PathBuf>,

    #[clap(long, short = 'm', default_value = "prog")]
    method: AlignmentMethod,

    /// The refinement strategy applied after the alignment.
    #[clap(long, short = 'r', default_value = "none")]
    refine: RefinementStrategy,

    /// The distance threshold of the flat clustering used by `--refine clusters`.
    #[clap(long, short = 't', default_value = "0.5")]
    threshold: f64,

    /// Search the final alignment for swapped residues.
    #[clap(long)]
    swap_check: bool,

    /// The denominator of the percentage identity reported in the statistics, from 1 to 5.
    #[clap(long, default_value = "2")]
    pid_mode: u8,

    /// Tokenize each vowel separately instead of merging adjacent vowels into one token.
    #[clap(long)]
    no_merge_vowels: bool,

    /// A sound class model file in plain text format.
    ///
    /// The model can then be selected by its name in the configuration.
    /// This option can be given multiple times.
    #[clap(long)]
    model_file: Vec<PathBuf>,

    /// The file to store the alignment statistics in toml format.
    #[clap(long, short = 'o')]
    output: Option<PathBuf>,

    /// The file to store the alignment in, one tab-separated row per sequence.
    #[clap(long, short = 'a')]
    alignment: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlignmentMethod {
    /// Progressive alignment with sound class scores.
    Prog,
    /// Progressive alignment with consistency library scores.
    Lib,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RefinementStrategy {
    None,
    Orphans,
    Clusters,
    GapSites,
    All,
}

#[derive(Debug, Serialize)]
pub struct AlignmentStatistics {
    pub params: String,
    pub sequences: usize,
    pub unique_sequences: usize,
    pub width: usize,
    pub sum_of_pairs: f64,
    pub pid_mode: u8,
    pub pid: f64,
    pub swaps: Vec<[usize; 3]>,
}

pub fn cli(cli: Cli) -> Result<()> {
    // Fails only if a logger was initialised before.
    TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap_or_else(|_| debug!("Logger was already initialised"));

    let configuration = if let Some(path) = &cli.configuration {
        info!("Loading configuration file {path:?}");
        Configuration::read_file(path)?
    } else {
        Configuration::default()
    };
    let pid_mode = PidMode::try_from(cli.pid_mode)?;

    info!("Loading word list {:?}", cli.input);
    let sequences = read_word_list(&cli.input)?;
    let tokenizer = IpaTokenizer {
        merge_vowels: !cli.no_merge_vowels,
    };
    let mut multiple = Multiple::with_tokenizer(sequences, &tokenizer)?;

    for path in &cli.model_file {
        info!("Loading model file {path:?}");
        multiple.register_model(ClassModel::read_file(path)?);
    }

    debug!("Choosing alignment method...");
    match cli.method {
        AlignmentMethod::Prog => multiple.prog_align(&configuration.progressive)?,
        AlignmentMethod::Lib => multiple.lib_align(&configuration.library)?,
    }

    let refinement = &configuration.refinement;
    match cli.refine {
        RefinementStrategy::None => {}
        RefinementStrategy::Orphans => multiple.iterate_orphans(refinement)?,
        RefinementStrategy::Clusters => multiple.iterate_clusters(cli.threshold, refinement)?,
        RefinementStrategy::GapSites => multiple.iterate_similar_gap_sites(refinement)?,
        RefinementStrategy::All => multiple.iterate_all_sequences(refinement)?,
    }

    if cli.swap_check && multiple.swap_check(&configuration.swap)? {
        info!("Found swaps at {:?}", multiple.swap_index());
    }

    let statistics = AlignmentStatistics {
        params: multiple.params().unwrap_or_default().to_string(),
        sequences: multiple.sequences().len(),
        unique_sequences: multiple.unique_rows().map(|unique| unique.len()).unwrap_or(0),
        width: multiple.unique_alignment()?.width(),
        sum_of_pairs: multiple.sum_of_pairs(refinement.gap_weight)?,
        pid_mode: cli.pid_mode,
        pid: multiple.pid(pid_mode)?,
        swaps: multiple
            .swap_index()
            .iter()
            .map(|&(first, middle, last)| [first, middle, last])
            .collect(),
    };
    info!(
        "Sum-of-pairs score {} and percentage identity {}",
        statistics.sum_of_pairs, statistics.pid
    );

    if let Some(path) = &cli.alignment {
        info!("Writing alignment to {path:?}");
        let mut writer = BufWriter::new(
            File::create(path)
                .map_err(|error| anyhow!("Unable to create alignment file {path:?}: {error}"))?,
        );
        writeln!(writer, "{multiple}")?;
    }

    if let Some(path) = &cli.output {
        info!("Writing statistics to {path:?}");
        let mut writer = BufWriter::new(
            File::create(path)
                .map_err(|error| anyhow!("Unable to create output file {path:?}: {error}"))?,
        );
        write!(writer, "{}", toml::to_string(&statistics)?)?;
    }

    println!("{multiple}");

    Ok(())
}
