mod bill;
mod client;
mod input;
mod product;

pub use bill::*;
pub use client::*;
pub use input::*;
pub use product::*;
