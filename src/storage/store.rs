use std::collections::TryReserveError;

use thiserror::Error;
use tracing::debug;

use crate::domain::{
    truncate_chars, Bill, BillId, BillIndex, Client, ClientIndex, Product, ProductId,
    MAX_NAME_LEN,
};

use super::INITIAL_CLIENT_CAPACITY;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Out of memory while growing {what}")]
    CapacityExhausted {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("Client index {0} is out of range")]
    ClientIndexOutOfRange(ClientIndex),

    #[error("Bill index {bill_index} is out of range for client {client_index}")]
    BillIndexOutOfRange {
        client_index: ClientIndex,
        bill_index: BillIndex,
    },
}

/// In-memory store owning every client, bill and product.
///
/// Entities are addressed by index. Lookups hand out borrows, so a reference
/// obtained before a mutation can never outlive it; callers re-resolve by
/// name or index instead.
#[derive(Debug, Default)]
pub struct Store {
    clients: Vec<Client>,
}

impl Store {
    /// Create an empty store. No memory is reserved until the first client arrives.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Number of client slots currently reserved.
    pub fn capacity(&self) -> usize {
        self.clients.capacity()
    }

    /// All clients in registration order.
    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client(&self, index: ClientIndex) -> Option<&Client> {
        self.clients.get(index)
    }

    // ========================
    // Clients
    // ========================

    /// Register a client by name, returning its index.
    ///
    /// The name is truncated first; if a client with the resulting name
    /// already exists nothing changes and its index is returned.
    pub fn register_client(&mut self, name: &str) -> Result<ClientIndex, StoreError> {
        let name = truncate_chars(name, MAX_NAME_LEN);
        if let Some(idx) = self.find_client_index(&name) {
            return Ok(idx);
        }

        self.ensure_client_capacity()?;
        self.clients.push(Client::new(&name));
        debug!(client = %name, total = self.clients.len(), "registered client");
        Ok(self.clients.len() - 1)
    }

    /// Index of the client named exactly `name`.
    pub fn find_client_index(&self, name: &str) -> Option<ClientIndex> {
        self.clients.iter().position(|c| c.name == name)
    }

    pub fn find_client(&self, name: &str) -> Option<&Client> {
        self.find_client_index(name).map(|idx| &self.clients[idx])
    }

    /// Double the client slots when full, starting from [`INITIAL_CLIENT_CAPACITY`].
    fn ensure_client_capacity(&mut self) -> Result<(), StoreError> {
        let len = self.clients.len();
        let capacity = self.clients.capacity();
        if len < capacity {
            return Ok(());
        }

        let new_capacity = if capacity == 0 {
            INITIAL_CLIENT_CAPACITY
        } else {
            capacity * 2
        };
        self.clients
            .try_reserve_exact(new_capacity - len)
            .map_err(|source| StoreError::CapacityExhausted {
                what: "clients",
                source,
            })
    }

    // ========================
    // Bills
    // ========================

    /// Append an empty bill to the client at `client_index` and refresh its
    /// modification time. Returns the index of the new bill.
    pub fn add_bill(
        &mut self,
        client_index: ClientIndex,
        bill_id: BillId,
        bill_date: &str,
    ) -> Result<BillIndex, StoreError> {
        let client = self
            .clients
            .get_mut(client_index)
            .ok_or(StoreError::ClientIndexOutOfRange(client_index))?;

        client
            .bills
            .try_reserve(1)
            .map_err(|source| StoreError::CapacityExhausted {
                what: "bills",
                source,
            })?;
        client.bills.push(Bill::new(bill_id, bill_date));
        client.touch();

        debug!(client = %client.name, bill_id, date = bill_date, "added bill");
        Ok(client.bills.len() - 1)
    }

    // ========================
    // Products
    // ========================

    /// Append a product to a bill and refresh the owning client's
    /// modification time. Returns the index of the new product.
    pub fn add_product(
        &mut self,
        client_index: ClientIndex,
        bill_index: BillIndex,
        product_id: ProductId,
        name: &str,
        price: f64,
    ) -> Result<usize, StoreError> {
        let client = self
            .clients
            .get_mut(client_index)
            .ok_or(StoreError::ClientIndexOutOfRange(client_index))?;
        let bill = client
            .bills
            .get_mut(bill_index)
            .ok_or(StoreError::BillIndexOutOfRange {
                client_index,
                bill_index,
            })?;

        bill.products
            .try_reserve(1)
            .map_err(|source| StoreError::CapacityExhausted {
                what: "products",
                source,
            })?;
        bill.products.push(Product::new(product_id, name, price));
        let product_index = bill.products.len() - 1;
        client.touch();

        debug!(client = %client.name, bill_index, product_id, price, "added product");
        Ok(product_index)
    }

    // ========================
    // Teardown
    // ========================

    /// Release every client, bill and product, leaving an empty store.
    /// Calling this on an empty store does nothing.
    pub fn destroy(&mut self) {
        if self.clients.is_empty() && self.clients.capacity() == 0 {
            return;
        }

        let bills: usize = self.clients.iter().map(Client::bill_count).sum();
        debug!(clients = self.clients.len(), bills, "releasing store");
        self.clients = Vec::new();
    }
}
