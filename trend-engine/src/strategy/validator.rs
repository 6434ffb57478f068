//! Decision validation

use crate::portfolio::PositionState;
use crate::strategy::{Action, Decision};

/// Decision validator
pub struct DecisionValidator;

impl DecisionValidator {
    /// Validate decision fields
    pub fn validate(decision: &Decision) -> bool {
        let finite = |v: Option<f64>| v.map_or(false, f64::is_finite);
        match decision.action {
            Action::EnterLong | Action::EnterShort => {
                decision.price.is_finite()
                    && finite(decision.stop_loss)
                    && finite(decision.take_profit)
                    && decision.size.map_or(false, |s| s > 0.0)
            }
            Action::Exit => decision.price.is_finite() && decision.exit_reason.is_some(),
            Action::Hold => true,
        }
    }

    /// Entries are legal only from FLAT, exits only from an open position
    pub fn is_legal(state: &PositionState, decision: &Decision) -> bool {
        match decision.action {
            Action::EnterLong | Action::EnterShort => state.is_flat(),
            Action::Exit => !state.is_flat(),
            Action::Hold => true,
        }
    }

    /// Valid and legal from `state`
    pub fn is_actionable(state: &PositionState, decision: &Decision) -> bool {
        Self::validate(decision) && Self::is_legal(state, decision) && !decision.is_hold()
    }
}
