// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Operator, method, and execution-operator seams.
//!
//! Domains plug behaviour in through three traits. Plain functions with the
//! matching signature implement them via blanket impls; domains that need
//! parameters (costs, capacities) implement them on small structs instead.

use crate::error::Failure;
use crate::rigid::RigidRelations;
use crate::state::{State, Value};
use crate::task::Task;

/// Read-only view handed to every operator and method call.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    rigid: &'a RigidRelations,
    depth: usize,
    level: u32,
}

impl<'a> Context<'a> {
    /// Builds a context for a node at `depth` searched with width `level`.
    pub fn new(rigid: &'a RigidRelations, depth: usize, level: u32) -> Self {
        Self {
            rigid,
            depth,
            level,
        }
    }

    /// Static facts of the domain.
    pub fn rigid(&self) -> &'a RigidRelations {
        self.rigid
    }

    /// Decomposition depth of the node being expanded.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Iterative-deepening level of the search node.
    ///
    /// Methods that can widen the search (extra detours, extra refuels)
    /// must stay within this bound.
    pub fn level(&self) -> u32 {
        self.level
    }
}

/// Primitive action: checks its precondition and returns the successor state.
pub trait Operator {
    /// Applies the operator to `state`. Never mutates its input.
    fn apply(&self, ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure>;
}

impl<F> Operator for F
where
    F: Fn(&Context<'_>, &State, &[Value]) -> Result<State, Failure>,
{
    fn apply(&self, ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure> {
        self(ctx, state, args)
    }
}

/// One candidate decomposition of a compound task.
///
/// An empty subtask list means the task is already satisfied.
pub trait Method {
    /// Returns the replacement subtasks or fails when not applicable.
    fn decompose(
        &self,
        ctx: &Context<'_>,
        state: &State,
        args: &[Value],
    ) -> Result<Vec<Task>, Failure>;
}

impl<F> Method for F
where
    F: Fn(&Context<'_>, &State, &[Value]) -> Result<Vec<Task>, Failure>,
{
    fn decompose(
        &self,
        ctx: &Context<'_>,
        state: &State,
        args: &[Value],
    ) -> Result<Vec<Task>, Failure> {
        self(ctx, state, args)
    }
}

/// Fact learned while executing an action that planning did not model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// The undirected edge between the two locations is not traversable.
    EdgeBlocked(String, String),
}

/// Execution-time failure of an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviation {
    failure: Failure,
    discovery: Option<Discovery>,
}

impl Deviation {
    /// Deviation without new knowledge about the world.
    pub fn new(reason: &'static str) -> Self {
        Self {
            failure: Failure::ExecutionDeviation(reason),
            discovery: None,
        }
    }

    /// Deviation that also revises a rigid relation.
    pub fn with_discovery(reason: &'static str, discovery: Discovery) -> Self {
        Self {
            failure: Failure::ExecutionDeviation(reason),
            discovery: Some(discovery),
        }
    }

    /// Underlying failure: [`Failure::ExecutionDeviation`] for world-side
    /// failures, or the planning operator's own failure when execution
    /// fell back to it.
    pub fn failure(&self) -> Failure {
        self.failure
    }

    /// Why execution failed.
    pub fn reason(&self) -> &'static str {
        self.failure.reason()
    }

    /// Revised fact, if any.
    pub fn discovery(&self) -> Option<&Discovery> {
        self.discovery.as_ref()
    }
}

impl From<Failure> for Deviation {
    fn from(failure: Failure) -> Self {
        Self {
            failure,
            discovery: None,
        }
    }
}

/// Execution-time variant of an operator.
///
/// May fail for reasons invisible to the planner and may report a
/// [`Discovery`] that the executor applies to the rigid relations.
pub trait ExecOperator {
    /// Executes the action against the actual world state.
    fn execute(&self, ctx: &Context<'_>, state: &State, args: &[Value])
        -> Result<State, Deviation>;
}

impl<F> ExecOperator for F
where
    F: Fn(&Context<'_>, &State, &[Value]) -> Result<State, Deviation>,
{
    fn execute(
        &self,
        ctx: &Context<'_>,
        state: &State,
        args: &[Value],
    ) -> Result<State, Deviation> {
        self(ctx, state, args)
    }
}
