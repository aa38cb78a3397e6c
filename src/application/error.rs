use thiserror::Error;

use crate::io::ExportError;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No such client: {0}")]
    ClientNotFound(String),

    #[error("No such bill: {date} for client {client}")]
    BillNotFound { client: String, date: String },

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}
