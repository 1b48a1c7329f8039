use std::{
    fmt::Display,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Result, anyhow};
use clap::Parser;
use lib_msalign::evaluate::EvalMsa;
use log::{LevelFilter, debug, info};
use serde::Serialize;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::input::read_alignment;

#[derive(Parser)]
pub struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// The path to the gold standard alignment.
    ///
    /// The file contains one row per line, with tokens separated by tab characters and `-` as gap.
    #[clap(long, short = 'g')]
    gold: PathBuf,

    /// The path to the alignment to evaluate, in the same format as the gold standard.
    #[clap(long, short = 't')]
    test: PathBuf,

    /// The file to store the scores in toml format.
    #[clap(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationStatistics {
    pub column_precision: f64,
    pub column_recall: f64,
    pub column_average: f64,
    pub column_f_score: f64,
    pub identical_rows: f64,
    pub sum_of_pairs_recall: f64,
    pub sum_of_pairs_precision: f64,
    pub sum_of_pairs_average: f64,
    pub jaccard: f64,
}

impl EvaluationStatistics {
    pub fn new(eval: &EvalMsa) -> Result<Self> {
        Ok(Self {
            column_precision: eval.c_score(1)?,
            column_recall: eval.c_score(2)?,
            column_average: eval.c_score(3)?,
            column_f_score: eval.c_score(4)?,
            identical_rows: eval.pir_score(),
            sum_of_pairs_recall: eval.sp_score(1)?,
            sum_of_pairs_precision: eval.sp_score(2)?,
            sum_of_pairs_average: eval.sp_score(3)?,
            jaccard: eval.jc_score(),
        })
    }
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

    info!("Loading gold standard alignment {:?}", cli.gold);
    let gold = read_alignment(&cli.gold)?;
    info!("Loading test alignment {:?}", cli.test);
    let test = read_alignment(&cli.test)?;

    let eval = EvalMsa::new(gold, test)?;
    let statistics = EvaluationStatistics::new(&eval)?;

    if let Some(path) = &cli.output {
        info!("Writing scores to {path:?}");
        let mut writer = BufWriter::new(
            File::create(path)
                .map_err(|error| anyhow!("Unable to create output file {path:?}: {error}"))?,
        );
        write!(writer, "{}", toml::to_string(&statistics)?)?;
    }

    println!("{statistics}");

    Ok(())
}

impl Display for EvaluationStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Column score: precision {:.4}, recall {:.4}, average {:.4}, F-score {:.4}",
            self.column_precision, self.column_recall, self.column_average, self.column_f_score
        )?;
        writeln!(f, "Identical rows: {:.4}", self.identical_rows)?;
        writeln!(
            f,
            "Sum-of-pairs score: recall {:.4}, precision {:.4}, average {:.4}",
            self.sum_of_pairs_recall, self.sum_of_pairs_precision, self.sum_of_pairs_average
        )?;
        write!(f, "Jaccard score: {:.4}", self.jaccard)
    }
}
