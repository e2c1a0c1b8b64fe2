//! Faithfulness scoring and the refusal policy

pub mod faithfulness;
pub mod policy;

pub use faithfulness::score;
pub use policy::{Decision, GroundingSignals, RefusalPolicy, RefusalReason};
