mod store;

pub use store::*;

/// Number of client slots reserved the first time the store grows.
pub const INITIAL_CLIENT_CAPACITY: usize = 4;
