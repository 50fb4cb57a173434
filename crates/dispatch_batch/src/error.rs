use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("schedule file is empty")]
    EmptySchedule,
    #[error("schedule header is not a day count")]
    MalformedHeader,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}
