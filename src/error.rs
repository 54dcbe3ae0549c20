//! Error taxonomy for the capture engine
//!
//! None of these reach the player. Actions log them and degrade to
//! "wait for the next poll/input" or "reset to idle".

use crate::effects::EffectKind;
use crate::scene::Element;
use crate::state::RoundToken;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("cannot measure {0:?}: no bounding box")]
    MeasurementUnavailable(Element),

    #[error("stale continuation from round {expected:?} (current {actual:?})")]
    StaleRound {
        expected: RoundToken,
        actual: RoundToken,
    },

    #[error("effect {kind:?} failed to start: {reason}")]
    EffectFailed { kind: EffectKind, reason: String },

    #[error("config error: {0}")]
    Config(String),
}
