use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop the pipeline. None of these are recoverable: the
/// stages are linear, so `main` reports the error and exits.
#[derive(Debug, Error)]
pub(crate) enum PipelineError {
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} is missing required column '{column}'", path.display())]
    MalformedInput { path: PathBuf, column: String },

    #[error("{}, line {line}: cannot parse '{value}' in column '{column}'", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("key ({entity}, {year}) appears more than once in a join input")]
    DuplicateKey { entity: String, year: i32 },

    #[error("cannot create output directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("chart '{0}' has no data to plot")]
    EmptyChart(String),

    #[error("cannot render chart '{chart}': {reason}")]
    Render { chart: String, reason: String },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub(crate) type Result<T> = std::result::Result<T, PipelineError>;
