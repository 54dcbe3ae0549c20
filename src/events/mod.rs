//! Capture event trail
//!
//! Every engine transition is recorded as a `CaptureEvent` on the
//! timestamped `EventBus`.

mod bus;
mod types;

pub use bus::{BusEvent, EventBus};
pub use types::CaptureEvent;
