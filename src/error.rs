use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No records could be parsed from the file. Check that it is a 總表 CSV export.")]
    EmptyImport,

    #[error("Invalid date '{0}': use YY/MM or YYYY/MM (e.g. 25/01)")]
    InvalidDate(String),

    #[error("No record with id {0}")]
    UnknownRecord(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CardbookError>;
