use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{truncate_chars, Bill, BillIndex, MAX_NAME_LEN};

/// Position of a client inside the store.
pub type ClientIndex = usize;

/// A named client owning its bills in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique, case-sensitive key within the store.
    pub name: String,
    pub bills: Vec<Bill>,
    /// Refreshed whenever a bill or product is added beneath this client.
    pub last_modified: DateTime<Utc>,
}

impl Client {
    /// Create a client with no bills, truncating the name to [`MAX_NAME_LEN`] characters.
    pub fn new(name: &str) -> Self {
        Self {
            name: truncate_chars(name, MAX_NAME_LEN),
            bills: Vec::new(),
            last_modified: Utc::now(),
        }
    }

    pub fn bill_count(&self) -> usize {
        self.bills.len()
    }

    pub fn bill(&self, index: BillIndex) -> Option<&Bill> {
        self.bills.get(index)
    }

    /// Index of the first bill dated `date`. Later bills with the same date are shadowed.
    pub fn find_bill_index(&self, date: &str) -> Option<BillIndex> {
        self.bills.iter().position(|b| b.date == date)
    }

    pub fn find_bill_by_date(&self, date: &str) -> Option<&Bill> {
        self.find_bill_index(date).map(|idx| &self.bills[idx])
    }

    /// Bump `last_modified` to now, never moving it backwards.
    pub fn touch(&mut self) {
        self.last_modified = self.last_modified.max(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_client_has_no_bills() {
        let client = Client::new("Alice");
        assert_eq!(client.name, "Alice");
        assert_eq!(client.bill_count(), 0);
        assert!(client.find_bill_index("2024-01-01").is_none());
    }

    #[test]
    fn test_find_bill_by_date_first_match_wins() {
        let mut client = Client::new("Alice");
        client.bills.push(Bill::new(300, "2024-01-01"));
        client.bills.push(Bill::new(301, "2024-02-01"));
        client.bills.push(Bill::new(302, "2024-01-01"));

        assert_eq!(client.find_bill_index("2024-01-01"), Some(0));
        assert_eq!(client.find_bill_by_date("2024-01-01").map(|b| b.id), Some(300));
        assert_eq!(client.find_bill_index("2024-02-01"), Some(1));
        assert!(client.find_bill_by_date("2024-03-01").is_none());
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut client = Client::new("Alice");
        let future = Utc::now() + Duration::hours(1);
        client.last_modified = future;

        client.touch();
        assert_eq!(client.last_modified, future);
    }

    #[test]
    fn test_touch_advances_to_now() {
        let mut client = Client::new("Alice");
        client.last_modified = Utc::now() - Duration::hours(1);
        let before = Utc::now();

        client.touch();
        assert!(client.last_modified >= before);
    }
}
