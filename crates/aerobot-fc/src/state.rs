use crate::safety::DirectionalBudget;
use crate::signal::TerminationCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Flying,
    Terminating,
    Terminated,
}

/// What the executor hands back once the session has terminated.
#[derive(Debug, Clone)]
pub struct ExecutorReport {
    pub state: SessionState,
    pub cause: Option<TerminationCause>,
    pub budget: DirectionalBudget,
    pub dispatched: u64,
    pub dropped: u64,
    pub failed: u64,
}

