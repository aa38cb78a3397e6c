use std::path::Path;

use tracing::debug;

use crate::domain::{parse_id_lenient, parse_price_lenient, BillId, BillIndex, ClientIndex};
use crate::io::{export_bill_csv, ExportFormat, Exporter};
use crate::storage::Store;

use super::{render_bill, render_client_bills, render_store, AppError};

/// Supplies ids for newly created bills.
pub trait BillIdSource {
    fn next_bill_id(&mut self) -> BillId;
}

/// Monotonically increasing bill ids. Lives only as long as the process.
#[derive(Debug, Clone)]
pub struct SequentialBillIds {
    next: BillId,
}

impl SequentialBillIds {
    pub const DEFAULT_START: BillId = 300;

    pub fn starting_at(first: BillId) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialBillIds {
    fn default() -> Self {
        Self::starting_at(Self::DEFAULT_START)
    }
}

impl BillIdSource for SequentialBillIds {
    fn next_bill_id(&mut self) -> BillId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Outcome of adding a bill through the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillReceipt {
    pub client_index: ClientIndex,
    pub bill_index: BillIndex,
    pub bill_id: BillId,
}

/// Application service owning the store and the bill id sequence.
/// This is the primary interface for any front end (shell, GUI, tests).
pub struct BillingService<G: BillIdSource = SequentialBillIds> {
    store: Store,
    bill_ids: G,
}

impl BillingService {
    pub fn new() -> Self {
        Self::with_bill_ids(SequentialBillIds::default())
    }
}

impl Default for BillingService {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: BillIdSource> BillingService<G> {
    pub fn with_bill_ids(bill_ids: G) -> Self {
        Self {
            store: Store::new(),
            bill_ids,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn client_index(&self, name: &str) -> Result<ClientIndex, AppError> {
        self.store
            .find_client_index(name)
            .ok_or_else(|| AppError::ClientNotFound(name.to_string()))
    }

    fn bill_index(
        &self,
        client_index: ClientIndex,
        client: &str,
        date: &str,
    ) -> Result<BillIndex, AppError> {
        self.store
            .client(client_index)
            .and_then(|c| c.find_bill_index(date))
            .ok_or_else(|| AppError::BillNotFound {
                client: client.to_string(),
                date: date.to_string(),
            })
    }

    // ========================
    // Commands
    // ========================

    /// Register a client. Registering an existing name is a no-op.
    pub fn log_client(&mut self, name: &str) -> Result<ClientIndex, AppError> {
        if name.is_empty() {
            return Err(AppError::MissingArgument("client name"));
        }
        Ok(self.store.register_client(name)?)
    }

    /// Add a bill dated `date` to an existing client, numbered from the id source.
    pub fn add_bill(&mut self, client: &str, date: &str) -> Result<BillReceipt, AppError> {
        let client_index = self.client_index(client)?;
        let bill_id = self.bill_ids.next_bill_id();
        let bill_index = self.store.add_bill(client_index, bill_id, date)?;

        Ok(BillReceipt {
            client_index,
            bill_index,
            bill_id,
        })
    }

    /// Add a product to the first bill dated `date` of an existing client.
    ///
    /// `product_id` and `price` are raw text; anything unparseable becomes 0.
    pub fn add_product(
        &mut self,
        client: &str,
        date: &str,
        product_id: &str,
        name: &str,
        price: &str,
    ) -> Result<(), AppError> {
        let client_index = self.client_index(client)?;
        let bill_index = self.bill_index(client_index, client, date)?;

        let product_id = parse_id_lenient(product_id);
        let price = parse_price_lenient(price);
        self.store
            .add_product(client_index, bill_index, product_id, name, price)?;
        Ok(())
    }

    // ========================
    // Queries
    // ========================

    /// Client names, one per line.
    pub fn show_store(&self) -> String {
        self.store
            .clients()
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Client count with last modification time of each client.
    pub fn summary(&self) -> String {
        render_store(&self.store)
    }

    pub fn show_client(&self, name: &str) -> Result<String, AppError> {
        let client = self
            .store
            .find_client(name)
            .ok_or_else(|| AppError::ClientNotFound(name.to_string()))?;
        Ok(render_client_bills(client))
    }

    pub fn show_bill(&self, client: &str, date: &str) -> Result<String, AppError> {
        let client_index = self.client_index(client)?;
        let bill_index = self.bill_index(client_index, client, date)?;
        let bill = self
            .store
            .client(client_index)
            .and_then(|c| c.bill(bill_index))
            .ok_or_else(|| AppError::BillNotFound {
                client: client.to_string(),
                date: date.to_string(),
            })?;
        Ok(render_bill(bill))
    }

    // ========================
    // Export
    // ========================

    /// Write the first bill dated `date` of `client` to a CSV file.
    /// Returns the number of product lines written.
    pub fn export_bill(
        &self,
        client: &str,
        date: &str,
        path: impl AsRef<Path>,
    ) -> Result<usize, AppError> {
        let client_index = self.client_index(client)?;
        let bill_index = self.bill_index(client_index, client, date)?;
        let owner = self
            .store
            .client(client_index)
            .ok_or_else(|| AppError::ClientNotFound(client.to_string()))?;

        Ok(export_bill_csv(owner, bill_index, path)?)
    }

    /// Dump the whole store to `path`.
    pub fn export_store(
        &self,
        path: impl AsRef<Path>,
        format: ExportFormat,
    ) -> Result<usize, AppError> {
        debug!(%format, "exporting store");
        Ok(Exporter::new(&self.store).export_to(path, format)?)
    }

    /// Release everything held by the store.
    pub fn shutdown(&mut self) {
        self.store.destroy();
    }
}
