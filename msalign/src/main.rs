use anyhow::Result;
use clap::Parser;
use msalign::{align, evaluate};

#[derive(Parser)]
#[command(version, about)]
enum Cli {
    /// Align a list of phonetic sequences.
    Align(align::Cli),

    /// Compare a test alignment against a gold standard alignment.
    Evaluate(evaluate::Cli),
}

fn main() -> Result<()> {
    match Cli::parse() {
        Cli::Align(cli) => align::cli(cli),
        Cli::Evaluate(cli) => evaluate::cli(cli),
    }
}
