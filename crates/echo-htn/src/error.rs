// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Failure signals and caller-visible errors.
//!
//! [`Failure`] values are control flow: operators and methods return them,
//! the search consumes them by backtracking. Only [`PlanError`] and
//! [`ExecutionFailure`] ever reach a caller.

use thiserror::Error;

use crate::task::TaskKind;

/// Local failure of an operator, method, or execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Failure {
    /// An operator or method guard is not met.
    #[error("precondition failed: {0}")]
    PreconditionFailed(&'static str),
    /// Every method registered for a compound task failed.
    #[error("decomposition exhausted")]
    DecompositionExhausted,
    /// An execution-time operator failed although planning predicted success.
    #[error("execution deviated: {0}")]
    ExecutionDeviation(&'static str),
}

impl Failure {
    /// Shorthand for [`Failure::PreconditionFailed`].
    pub const fn precondition(reason: &'static str) -> Self {
        Self::PreconditionFailed(reason)
    }

    /// Human-readable reason without the variant prefix.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::PreconditionFailed(reason) | Self::ExecutionDeviation(reason) => reason,
            Self::DecompositionExhausted => "decomposition exhausted",
        }
    }
}

/// Terminal planning errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A task names an operator or method group that was never registered.
    #[error("no {kind} registered for task `{name}`")]
    UnknownTask {
        /// Task name as it appeared in the network.
        name: String,
        /// Which registry was consulted.
        kind: TaskKind,
    },
    /// The search exhausted every alternative for the root goal.
    #[error("no plan found for {goal}")]
    NoPlanFound {
        /// Rendered goal network.
        goal: String,
    },
}

/// Errors raised while building a [`Domain`](crate::Domain).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Attempted to register an operator name twice.
    #[error("duplicate operator: {0}")]
    DuplicateOperator(String),
    /// Attempted to register two methods with the same label for one task.
    #[error("duplicate method `{label}` for task `{task}`")]
    DuplicateMethod {
        /// Compound task name.
        task: String,
        /// Method label.
        label: String,
    },
    /// Attempted to register an execution variant twice.
    #[error("duplicate execution operator: {0}")]
    DuplicateExecOperator(String),
    /// An execution variant was registered for an operator that does not exist.
    #[error("no planning operator named {0}")]
    UnknownOperator(String),
}

/// Why the lazy-lookahead loop gave up replanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// More replans were needed than the budget allowed.
    BudgetSpent,
    /// A fresh plan was identical to the one that just failed, from the
    /// same state.
    NoProgress,
}

impl std::fmt::Display for Exhaustion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BudgetSpent => f.write_str("replan budget spent"),
            Self::NoProgress => f.write_str("no progress"),
        }
    }
}

/// Terminal failure of a lazy-lookahead run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFailure {
    /// Planning from the actual state failed.
    #[error("planning failed: {0}")]
    Planning(#[from] PlanError),
    /// The replanning loop stopped before the goal was reached.
    #[error("replanning exhausted after {replans} replans: {cause}")]
    ReplanningExhausted {
        /// Replans performed before giving up.
        replans: usize,
        /// Stop condition.
        cause: Exhaustion,
    },
}
