//! Filtering and row storage for data grids

pub mod config;
pub mod filter;
pub mod sources;
pub mod store;

use thiserror::Error;

// Re-exports
pub use config::{FilterConfig, NullConfig};
pub use filter::{
    compare_values, filter_rows, matches, ClauseFilter, FilterClause, FilterOperator, FilterSpec,
};
pub use sources::CsvRowSource;
pub use store::{FilterFn, FilterableRowStore, SortArgs, SortDirection};

/// Errors raised while evaluating filters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid filter operator: {operator}")]
    InvalidOperator { operator: String },

    #[error("filter function failed: {0}")]
    FilterFunction(String),
}

impl FilterError {
    /// Wrap a failure raised inside a caller-supplied filter function
    pub fn filter_function(error: impl std::fmt::Display) -> Self {
        FilterError::FilterFunction(error.to_string())
    }
}

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                DataError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => DataError::Csv(error.to_string()),
        }
    }
}
