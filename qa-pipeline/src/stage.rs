//! Per-request pipeline state machine.

use std::{fmt, time::Instant};

use tracing::{info, warn};

use crate::error::PipelineError;

/// Where a request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    DocumentLoaded,
    QuestionsLoaded,
    Chunked,
    IndexBuilt,
    /// Terminal success.
    AllAnswered,
    /// Terminal failure, with the error code.
    Failed(&'static str),
}

impl Stage {
    /// Next stage on the success path; `None` for terminal stages.
    pub fn successor(self) -> Option<Stage> {
        match self {
            Stage::Received => Some(Stage::DocumentLoaded),
            Stage::DocumentLoaded => Some(Stage::QuestionsLoaded),
            Stage::QuestionsLoaded => Some(Stage::Chunked),
            Stage::Chunked => Some(Stage::IndexBuilt),
            Stage::IndexBuilt => Some(Stage::AllAnswered),
            Stage::AllAnswered | Stage::Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Failed(code) => write!(f, "Failed({code})"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// Tracks and logs the transitions of one request.
#[derive(Debug)]
pub struct StageTracker {
    current: Stage,
    started: Instant,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        info!(stage = %Stage::Received, "pipeline stage");
        Self {
            current: Stage::Received,
            started: Instant::now(),
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Moves to the next success stage. No-op once terminal.
    pub fn advance(&mut self) -> Stage {
        match self.current.successor() {
            Some(next) => {
                self.current = next;
                info!(
                    stage = %next,
                    elapsed_ms = self.started.elapsed().as_millis(),
                    "pipeline stage"
                );
            }
            None => warn!(stage = %self.current, "advance on terminal stage ignored"),
        }
        self.current
    }

    /// Records a terminal failure unless already terminal.
    pub fn fail(&mut self, err: &PipelineError) -> Stage {
        if !self.current.is_terminal() {
            let from = self.current;
            self.current = Stage::Failed(err.code());
            info!(
                stage = %self.current,
                from = %from,
                error = %err,
                elapsed_ms = self.started.elapsed().as_millis(),
                "pipeline stage"
            );
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_path_runs_in_order() {
        let mut t = StageTracker::new();
        let seen: Vec<Stage> = (0..5).map(|_| t.advance()).collect();
        assert_eq!(
            seen,
            vec![
                Stage::DocumentLoaded,
                Stage::QuestionsLoaded,
                Stage::Chunked,
                Stage::IndexBuilt,
                Stage::AllAnswered
            ]
        );
        assert_eq!(t.advance(), Stage::AllAnswered);
        assert_eq!(t.fail(&PipelineError::NoQuestions), Stage::AllAnswered);
    }

    #[test]
    fn failure_is_terminal() {
        let mut t = StageTracker::new();
        t.advance();
        assert_eq!(t.fail(&PipelineError::EmptyDocument), Stage::Failed("EMPTY_DOCUMENT"));
        assert_eq!(t.advance(), Stage::Failed("EMPTY_DOCUMENT"));
        assert_eq!(t.current().to_string(), "Failed(EMPTY_DOCUMENT)");
    }
}
