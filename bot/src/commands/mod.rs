pub mod backtest;
pub mod run;
pub mod version;

pub use backtest::handle_backtest;
pub use run::handle_run;
pub use version::handle_version;

use crate::cli::StrategyArgs;
use anyhow::Context;
use trend_engine::config::StrategyConfig;

/// Strategy from `--strategy`, or the defaults of `--variant`
pub fn load_strategy(args: &StrategyArgs) -> anyhow::Result<StrategyConfig> {
    match &args.strategy {
        Some(path) => StrategyConfig::from_json_file(path)
            .with_context(|| format!("loading strategy from {}", path.display())),
        None => Ok(StrategyConfig::for_variant(args.variant)),
    }
}
