// Application layer - the command surface the shell (or any other front end)
// drives, plus text rendering of store contents.

pub mod error;
pub mod presentation;
pub mod service;

pub use error::*;
pub use presentation::*;
pub use service::*;
