//! Strategy implementations

pub mod adx_volume;
pub mod baseline;
pub mod supertrend_stoch;

pub use adx_volume::*;
pub use baseline::*;
pub use supertrend_stoch::*;

use crate::config::StrategyVariant;
use crate::strategy::EntryPolicy;

/// Entry policy for a configured variant
pub fn policy_for(variant: StrategyVariant) -> Box<dyn EntryPolicy> {
    match variant {
        StrategyVariant::Baseline => Box::new(BaselinePolicy),
        StrategyVariant::AdxVolume => Box::new(AdxVolumePolicy),
        StrategyVariant::SupertrendStoch => Box::new(SupertrendStochPolicy),
    }
}
