//! Configuration module

pub mod runner;
pub mod strategy;

pub use runner::*;
pub use strategy::*;
