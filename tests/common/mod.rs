// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use tally::application::BillingService;
use tally::storage::Store;

/// Test fixture: a store with a fixed client/bill/product layout.
pub struct StandardStore;

impl StandardStore {
    /// Three clients, each with two bills, each with two products.
    pub fn create() -> Result<Store> {
        let mut store = Store::new();
        for (c, name) in ["Alice", "Bob", "Carol"].iter().enumerate() {
            let client_index = store.register_client(name)?;
            for b in 0..2 {
                let bill_id = 100 * (c as i32 + 1) + b;
                let date = format!("2024-0{}-01", b + 1);
                let bill_index = store.add_bill(client_index, bill_id, &date)?;
                for p in 0..2 {
                    store.add_product(
                        client_index,
                        bill_index,
                        p + 1,
                        &format!("Item {}", p + 1),
                        10.0 * f64::from(p + 1),
                    )?;
                }
            }
        }
        Ok(store)
    }
}

/// Service with Alice registered and one bill dated 2024-01-01 (id 300).
pub fn service_with_alice() -> Result<BillingService> {
    let mut service = BillingService::new();
    service.log_client("Alice")?;
    service.add_bill("Alice", "2024-01-01")?;
    Ok(service)
}
