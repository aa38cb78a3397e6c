//! Plain-text rendering of store contents. Nothing here mutates state.

use std::fmt::Write;

use crate::domain::{format_price, Bill, Client, Product};
use crate::storage::Store;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn render_product(product: &Product) -> String {
    format!(
        "    Product {}: {:<20} ${}",
        product.id,
        product.name,
        format_price(product.price)
    )
}

/// Header line followed by one line per product.
pub fn render_bill(bill: &Bill) -> String {
    let mut out = format!("  Bill {} ({}):", bill.id, bill.date);
    for product in &bill.products {
        let _ = write!(out, "\n{}", render_product(product));
    }
    out
}

/// Bill count followed by the id and date of each bill.
pub fn render_client_bills(client: &Client) -> String {
    let mut out = format!("Client {} has {} bills:", client.name, client.bill_count());
    for bill in &client.bills {
        let _ = write!(out, "\n  [{}] {}", bill.id, bill.date);
    }
    out
}

/// Client count followed by each client's name and last modification time.
pub fn render_store(store: &Store) -> String {
    let mut out = format!("=== Store: {} clients ===", store.len());
    for client in store.clients() {
        let _ = write!(
            out,
            "\n- {} (Last mod: {})",
            client.name,
            client.last_modified.format(TIMESTAMP_FORMAT)
        );
    }
    out
}
