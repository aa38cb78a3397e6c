use serde::{Deserialize, Serialize};

use super::{format_price, truncate_chars, MAX_NAME_LEN};

pub type ProductId = i32;

/// A single line item on a bill.
///
/// Neither the id nor the price is validated: duplicate ids, zero and negative
/// prices are all accepted as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
}

impl Product {
    /// Create a product, truncating the name to [`MAX_NAME_LEN`] characters.
    pub fn new(id: ProductId, name: &str, price: f64) -> Self {
        Self {
            id,
            name: truncate_chars(name, MAX_NAME_LEN),
            price,
        }
    }

    /// Price rendered with exactly two decimals, e.g. `9.5` -> `"9.50"`.
    pub fn formatted_price(&self) -> String {
        format_price(self.price)
    }
}
