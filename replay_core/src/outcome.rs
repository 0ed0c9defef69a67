//! The Outcome Router - end-of-run presentation.
//!
//! Runs once per replay, on the controller's Playing → Finished edge, and
//! hands the decision to the scene layer through [`SceneTransition`].

use serde::{Deserialize, Serialize};

use crate::trajectory::Outcome;

/// Which results screen to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    Crashed,
    Finished,
}

impl Presentation {
    pub fn name(&self) -> &'static str {
        match self {
            Presentation::Crashed => "crashed",
            Presentation::Finished => "finished",
        }
    }
}

/// The router's verdict for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub presentation: Presentation,

    /// Lap time in seconds; only present for finished runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_seconds: Option<f64>,
}

impl RouteDecision {
    /// Text for the results label: `"crashed"` or the time, e.g. `"5.00s"`.
    pub fn label(&self) -> String {
        match (self.presentation, self.display_seconds) {
            (Presentation::Finished, Some(secs)) => format!("{:.2}s", secs),
            (presentation, _) => presentation.name().to_string(),
        }
    }
}

/// Stateless outcome → presentation mapping.
pub struct OutcomeRouter;

impl OutcomeRouter {
    /// Decides the presentation for `outcome` at the trajectory's tick rate.
    ///
    /// `elapsed_ticks` is ignored for crashed runs.
    pub fn route(outcome: &Outcome, tick_rate: u32) -> RouteDecision {
        if !outcome.succeeded {
            return RouteDecision {
                presentation: Presentation::Crashed,
                display_seconds: None,
            };
        }

        RouteDecision {
            presentation: Presentation::Finished,
            display_seconds: Some(outcome.elapsed_ticks as f64 / tick_rate.max(1) as f64),
        }
    }
}

/// The scene/UI layer's hook for leaving the replay screen.
pub trait SceneTransition {
    /// Called exactly once per replay with the routed outcome.
    fn transition(&mut self, decision: &RouteDecision);
}

impl<F> SceneTransition for F
where
    F: FnMut(&RouteDecision),
{
    fn transition(&mut self, decision: &RouteDecision) {
        self(decision)
    }
}

/// A sink that records every transition it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordedTransitions {
    pub decisions: Vec<RouteDecision>,
}

impl RecordedTransitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.decisions.len()
    }

    pub fn last(&self) -> Option<&RouteDecision> {
        self.decisions.last()
    }
}

impl SceneTransition for RecordedTransitions {
    fn transition(&mut self, decision: &RouteDecision) {
        self.decisions.push(*decision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_finished_run_shows_seconds() {
        let decision = OutcomeRouter::route(&Outcome::finished(50), 10);
        assert_eq!(decision.presentation, Presentation::Finished);
        assert_relative_eq!(decision.display_seconds.unwrap(), 5.0);
        assert_eq!(decision.label(), "5.00s");
    }

    #[test]
    fn test_fractional_seconds_are_kept() {
        // 129 ticks at 100 TPS must not truncate to 1 second
        let decision = OutcomeRouter::route(&Outcome::finished(129), 100);
        assert_relative_eq!(decision.display_seconds.unwrap(), 1.29);
    }

    #[test]
    fn test_crash_has_no_time() {
        for ticks in [0, 50, 60000, -1] {
            let decision = OutcomeRouter::route(&Outcome::crashed(ticks), 10);
            assert_eq!(decision.presentation, Presentation::Crashed);
            assert_eq!(decision.display_seconds, None);
            assert_eq!(decision.label(), "crashed");
        }
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |d: &RouteDecision| seen.push(d.presentation);
            sink.transition(&OutcomeRouter::route(&Outcome::crashed(3), 10));
        }
        assert_eq!(seen, vec![Presentation::Crashed]);
    }

    #[test]
    fn test_decision_serializes_without_absent_time() {
        let decision = OutcomeRouter::route(&Outcome::crashed(3), 10);
        let json = serde_json::to_string(&decision).unwrap();
        assert_eq!(json, r#"{"presentation":"crashed"}"#);
    }
}
