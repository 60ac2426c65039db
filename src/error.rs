/// Errors surfaced to the runner. Everything else degrades with a warning.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level has no map rows")]
    Empty,
    #[error("unknown tile {ch:?} at row {row}, column {col}")]
    UnknownTile { ch: char, row: usize, col: usize },
    #[error("level has no player spawn ('P')")]
    NoPlayer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = LevelError::UnknownTile { ch: '?', row: 2, col: 7 };
        assert_eq!(e.to_string(), "unknown tile '?' at row 2, column 7");
        assert_eq!(LevelError::NoPlayer.to_string(), "level has no player spawn ('P')");
    }
}
