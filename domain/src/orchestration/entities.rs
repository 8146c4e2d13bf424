//! Orchestration domain entities

use serde::{Deserialize, Serialize};

/// State of one orchestration request.
///
/// ```text
/// SelectingBackend → CallingPrimary → (FallbackPrimary)* → CollectingCritiques
///                  → Aggregating → Done
/// Refining → Done   (separate, caller-initiated)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SelectingBackend,
    CallingPrimary,
    FallbackPrimary,
    CollectingCritiques,
    Aggregating,
    Done,
    Refining,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::SelectingBackend => "selecting_backend",
            Phase::CallingPrimary => "calling_primary",
            Phase::FallbackPrimary => "fallback_primary",
            Phase::CollectingCritiques => "collecting_critiques",
            Phase::Aggregating => "aggregating",
            Phase::Done => "done",
            Phase::Refining => "refining",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::SelectingBackend => "Backend Selection",
            Phase::CallingPrimary => "Primary Response",
            Phase::FallbackPrimary => "Primary Fallback",
            Phase::CollectingCritiques => "Critiques",
            Phase::Aggregating => "Aggregation",
            Phase::Done => "Done",
            Phase::Refining => "Refinement",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::SelectingBackend, Phase::CallingPrimary)
                | (Phase::CallingPrimary, Phase::FallbackPrimary)
                | (Phase::CallingPrimary, Phase::CollectingCritiques)
                | (Phase::FallbackPrimary, Phase::FallbackPrimary)
                | (Phase::FallbackPrimary, Phase::CollectingCritiques)
                | (Phase::CollectingCritiques, Phase::Aggregating)
                | (Phase::Aggregating, Phase::Done)
                | (Phase::Done, Phase::Refining)
                | (Phase::Refining, Phase::Done)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tracks the phase sequence of one request (Entity)
#[derive(Debug, Clone)]
pub struct OrchestrationRun {
    current: Phase,
    trace: Vec<Phase>,
}

impl Default for OrchestrationRun {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestrationRun {
    pub fn new() -> Self {
        Self {
            current: Phase::SelectingBackend,
            trace: vec![Phase::SelectingBackend],
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    /// Move to `next`. Illegal transitions are ignored and reported as `false`.
    pub fn advance(&mut self, next: Phase) -> bool {
        if !self.current.can_transition_to(next) {
            return false;
        }
        self.current = next;
        self.trace.push(next);
        true
    }

    pub fn trace(&self) -> &[Phase] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<Phase> {
        self.trace
    }
}
