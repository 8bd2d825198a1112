use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate column '{column}' in {path}")]
    DuplicateColumn { path: String, column: String },

    /// A configured column is absent from the input table.
    #[error("{context}: missing column(s) {columns:?}")]
    MissingColumns {
        context: String,
        columns: Vec<String>,
    },
}
