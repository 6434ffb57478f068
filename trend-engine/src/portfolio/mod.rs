//! Portfolio management module

pub mod position;
pub mod risk;
pub mod wallet;

pub use position::*;
pub use risk::*;
pub use wallet::*;
