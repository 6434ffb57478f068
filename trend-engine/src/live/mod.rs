//! Live operation: polling driver and the supervisor running one driver
//! task per engine instance.

pub mod polling;
pub mod supervisor;

pub use polling::*;
pub use supervisor::*;
