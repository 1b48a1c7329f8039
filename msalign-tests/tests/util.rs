use std::{env, fs, path::PathBuf};

use anyhow::{Result, anyhow};
use clap::Parser;
use msalign::{align, evaluate};

pub fn run_in_repo_root(args: &str) -> Result<()> {
    // working directory is this crate, a.k.a. "[...]/msalign/msalign-tests"
    // simulate a call from the repo root
    env::set_current_dir(
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .ok_or(anyhow!("No parent directory"))?,
    )?;

    if args.starts_with("align ") {
        let args = align::Cli::parse_from(args.split_whitespace());
        align::cli(args)?;
    } else if args.starts_with("evaluate ") {
        let args = evaluate::Cli::parse_from(args.split_whitespace());
        evaluate::cli(args)?;
    } else {
        return Err(anyhow!("Unknown subcommand: {args}"));
    }

    Ok(())
}

/// A path in the temporary directory that is unique to the calling test.
pub fn output_path(name: &str) -> String {
    env::temp_dir()
        .join(format!("msalign-tests-{name}"))
        .display()
        .to_string()
}

pub fn read_toml(path: &str) -> Result<toml::Table> {
    Ok(toml::from_str(&fs::read_to_string(path)?)?)
}
