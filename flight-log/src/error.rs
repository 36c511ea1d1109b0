use thiserror::Error;

/// Everything that makes a flight log file unusable. The whole file is
/// rejected in every case; there are no partial tables.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read flight log: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: cannot parse '{value}' in column '{column}'")]
    Field {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("timestamps decrease at row {row}")]
    TimeNotMonotonic { row: usize },
    #[error("file holds no samples")]
    NoSamples,
}
