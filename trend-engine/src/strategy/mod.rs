//! Strategy engine module
//!
//! Provides the pluggable entry policies, the decision type emitted once per
//! candle, and the FLAT/LONG/SHORT state machine that ties them to the
//! risk manager.

pub mod base;
pub mod implementations;
pub mod signal;
pub mod state_machine;
pub mod validator;

pub use base::*;
pub use implementations::*;
pub use signal::*;
pub use state_machine::*;
pub use validator::*;
