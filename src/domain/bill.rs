use serde::{Deserialize, Serialize};

use super::{truncate_chars, Product, MAX_DATE_LEN};

/// Caller-supplied bill number. Uniqueness within a client is not enforced.
pub type BillId = i32;

/// Position of a bill inside its client's bill list.
pub type BillIndex = usize;

/// A dated bill owning its line items in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    /// Free-form, intended as `YYYY-MM-DD`. Used as the lookup key.
    pub date: String,
    pub products: Vec<Product>,
}

impl Bill {
    /// Create an empty bill, truncating the date to [`MAX_DATE_LEN`] characters.
    pub fn new(id: BillId, date: &str) -> Self {
        Self {
            id,
            date: truncate_chars(date, MAX_DATE_LEN),
            products: Vec::new(),
        }
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}
