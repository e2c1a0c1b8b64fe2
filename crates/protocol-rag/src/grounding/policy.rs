//! Accept-or-refuse decision for a generated answer

use std::fmt;

/// Inputs to the refusal decision
#[derive(Debug, Clone, Copy)]
pub struct GroundingSignals {
    /// At least one passage was placed in the prompt
    pub evidence_supplied: bool,
    /// The generator's whole answer was the "not available" sentence
    ///
    /// An answer that declines only part of the question is not a decline.
    pub generator_declined: bool,
    /// Faithfulness of the answer to the supplied passages
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalReason {
    NoEvidence,
    GeneratorDeclined,
    LowFaithfulness,
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefusalReason::NoEvidence => write!(f, "no supporting passages"),
            RefusalReason::GeneratorDeclined => write!(f, "generator declined"),
            RefusalReason::LowFaithfulness => write!(f, "faithfulness below threshold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Refuse(RefusalReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Threshold policy over [`GroundingSignals`]
#[derive(Debug, Clone, Copy)]
pub struct RefusalPolicy {
    threshold: f32,
}

impl RefusalPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Evaluate the decision table; a NaN score never accepts
    ///
    /// | evidence | declined | score >= threshold | decision |
    /// |----------|----------|--------------------|----------|
    /// | no       | any      | any                | refuse   |
    /// | yes      | yes      | any                | refuse   |
    /// | yes      | no       | no                 | refuse   |
    /// | yes      | no       | yes                | accept   |
    pub fn decide(&self, signals: &GroundingSignals) -> Decision {
        if !signals.evidence_supplied {
            return Decision::Refuse(RefusalReason::NoEvidence);
        }
        if signals.generator_declined {
            return Decision::Refuse(RefusalReason::GeneratorDeclined);
        }
        if signals.score >= self.threshold {
            Decision::Accept
        } else {
            Decision::Refuse(RefusalReason::LowFaithfulness)
        }
    }
}
