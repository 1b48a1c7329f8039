use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Result, anyhow, ensure};
use log::debug;

/// Reads one sequence per line, ignoring blank lines and lines starting with `#`.
pub fn read_word_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    debug!("Parsing word list {path:?}");

    let words: Vec<_> = content_lines(path)?
        .into_iter()
        .map(|line| line.trim().to_string())
        .collect();
    ensure!(!words.is_empty(), "Input file {path:?} contains no sequences");
    Ok(words)
}

/// Reads one alignment row per line, with tokens separated by tab characters.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn read_alignment(path: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    debug!("Parsing alignment file {path:?}");

    let rows: Vec<Vec<String>> = content_lines(path)?
        .into_iter()
        .map(|line| line.trim_end().split('\t').map(str::to_string).collect())
        .collect();
    ensure!(!rows.is_empty(), "Alignment file {path:?} contains no rows");
    Ok(rows)
}

fn content_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(
        File::open(path).map_err(|error| anyhow!("Unable to open input file {path:?}: {error}"))?,
    );

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line =
            line.map_err(|error| anyhow!("Error reading line from input file {path:?}: {error}"))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::{read_alignment, read_word_list};

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let path = env::temp_dir().join("msalign-input-word-list.txt");
        fs::write(&path, "# names\nwoldemort\n\n  waldemar \n#vladimir\n").unwrap();

        assert_eq!(read_word_list(&path).unwrap(), ["woldemort", "waldemar"]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn alignment_rows_are_tab_separated() {
        let path = env::temp_dir().join("msalign-input-alignment.msa");
        fs::write(&path, "w\to\tl\n\nw\ta\t-\n").unwrap();

        assert_eq!(
            read_alignment(&path).unwrap(),
            [["w", "o", "l"], ["w", "a", "-"]]
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_files_are_rejected() {
        let path = env::temp_dir().join("msalign-input-empty.txt");
        fs::write(&path, "# nothing\n\n").unwrap();

        assert!(read_word_list(&path).is_err());
        assert!(read_alignment(&path).is_err());
        assert!(read_word_list(env::temp_dir().join("msalign-input-missing.txt")).is_err());
        fs::remove_file(&path).unwrap();
    }
}
