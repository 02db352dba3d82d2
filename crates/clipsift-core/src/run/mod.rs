//! Background runs: one worker per run, an ordered event channel back to
//! the caller, and cooperative cancellation.

mod cancel;
mod controller;
mod events;

pub use cancel::CancelFlag;
pub use controller::{RunController, RunRequest, RunSettings, StartOutcome};
pub use events::{EventReceiver, RunEvent};
