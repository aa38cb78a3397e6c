use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::{BillIndex, Client};
use crate::storage::Store;

/// Column names of the whole-store CSV export.
pub const STORE_CSV_HEADER: [&str; 6] = [
    "client",
    "bill_id",
    "bill_date",
    "product_id",
    "product_name",
    "price",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Error opening {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bill index {bill_index} is out of range for client {client}")]
    BillIndexOutOfRange { client: String, bill_index: BillIndex },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-in-time copy of the whole store for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub clients: Vec<Client>,
}

/// Records are written bare: no header, no quoting, `\n` terminated.
fn bare_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn write_bill_records<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    client: &Client,
    bill_index: BillIndex,
) -> Result<usize, ExportError> {
    let bill = client
        .bill(bill_index)
        .ok_or_else(|| ExportError::BillIndexOutOfRange {
            client: client.name.clone(),
            bill_index,
        })?;

    for product in &bill.products {
        csv_writer.write_record([
            client.name.clone(),
            bill.id.to_string(),
            bill.date.clone(),
            product.id.to_string(),
            product.name.clone(),
            product.formatted_price(),
        ])?;
    }

    Ok(bill.products.len())
}

/// Write one line per product of the given bill:
/// `client,bill_id,bill_date,product_id,product_name,price`.
pub fn write_bill_csv<W: Write>(
    client: &Client,
    bill_index: BillIndex,
    writer: W,
) -> Result<usize, ExportError> {
    let mut csv_writer = bare_writer(writer);
    let count = write_bill_records(&mut csv_writer, client, bill_index)?;
    csv_writer.flush()?;
    Ok(count)
}

/// Export one bill to `path`, replacing any existing content.
/// Returns the number of product lines written.
pub fn export_bill_csv(
    client: &Client,
    bill_index: BillIndex,
    path: impl AsRef<Path>,
) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    let count = write_bill_csv(client, bill_index, file)?;
    info!(client = %client.name, bill_index, count, path = %path.display(), "exported bill");
    Ok(count)
}

/// Exporter for whole-store dumps.
pub struct Exporter<'a> {
    store: &'a Store,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Export every product of every bill as CSV, with a header row.
    pub fn write_store_csv<W: Write>(&self, writer: W) -> Result<usize, ExportError> {
        let mut csv_writer = bare_writer(writer);
        csv_writer.write_record(STORE_CSV_HEADER)?;

        let mut count = 0;
        for client in self.store.clients() {
            for bill_index in 0..client.bill_count() {
                count += write_bill_records(&mut csv_writer, client, bill_index)?;
            }
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full store as a pretty-printed JSON snapshot.
    pub fn write_store_json<W: Write>(&self, mut writer: W) -> Result<StoreSnapshot, ExportError> {
        let snapshot = StoreSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            clients: self.store.clients().to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }

    /// Export the full store to `path` in the requested format.
    /// Returns the number of product lines for CSV, or of clients for JSON.
    pub fn export_to(
        &self,
        path: impl AsRef<Path>,
        format: ExportFormat,
    ) -> Result<usize, ExportError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ExportError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        let count = match format {
            ExportFormat::Csv => self.write_store_csv(file)?,
            ExportFormat::Json => self.write_store_json(file)?.clients.len(),
        };
        info!(%format, count, path = %path.display(), "exported store");
        Ok(count)
    }
}
