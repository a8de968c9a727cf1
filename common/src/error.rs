use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Malformed cell {value:?} at row {row:?}, column {column:?}: expected <kernel>/<filename>")]
    Format {
        row: String,
        column: String,
        value: String,
    },
    #[error("Malformed layout file {path}: {reason}")]
    Layout { path: PathBuf, reason: String },
    #[error("No trace parser for system {system:?} (known: {known})")]
    Resolution { system: String, known: String },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
