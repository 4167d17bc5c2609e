// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Depth-first decomposition search ("seek-plan").
//!
//! Expands only the head of the task network. Atomic heads have exactly one
//! way to execute; compound heads try their methods in declaration order and
//! the first complete plan wins. Each child node owns its state, so a failed
//! branch is discarded without undo.
//!
//! Termination is the domain's responsibility: methods must not regrow an
//! equivalent network without making progress. [`PlannerConfig::max_depth`]
//! is available as a safety cap but is off by default.

use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::config::PlannerConfig;
use crate::domain::{Domain, MethodEntry};
use crate::error::{Failure, PlanError};
use crate::method::{Context, Operator};
use crate::plan::{Plan, SearchStats};
use crate::state::State;
use crate::task::{Task, TaskKind, TaskNetwork};

/// One point in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Tasks still to accomplish; only the head is expanded.
    pub network: TaskNetwork,
    /// World state reached so far on this branch.
    pub state: State,
    /// Accumulated action cost; never decreases along a path.
    pub cost: u64,
    /// Decomposition depth.
    pub depth: usize,
    /// Iterative-deepening level bounding how wide methods may branch.
    pub level: u32,
}

impl SearchNode {
    /// Root node for `network` from `state`.
    pub fn root(network: TaskNetwork, state: State, level: u32) -> Self {
        Self {
            network,
            state,
            cost: 0,
            depth: 0,
            level,
        }
    }
}

/// A replayed plan step did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step {index} `{task}` failed: {reason}")]
pub struct ValidationError {
    /// Zero-based index of the failing action.
    pub index: usize,
    /// The failing action.
    pub task: Task,
    /// Why it failed.
    pub reason: &'static str,
}

/// Planning session over a borrowed, read-only domain.
#[derive(Debug)]
pub struct Planner<'d> {
    pub(crate) domain: &'d Domain,
    pub(crate) config: PlannerConfig,
}

impl<'d> Planner<'d> {
    /// Planner with default configuration.
    pub fn new(domain: &'d Domain) -> Self {
        Self::with_config(domain, PlannerConfig::default())
    }

    /// Planner with explicit configuration.
    pub fn with_config(domain: &'d Domain, config: PlannerConfig) -> Self {
        Self { domain, config }
    }

    /// The domain searched.
    pub fn domain(&self) -> &'d Domain {
        self.domain
    }

    /// Active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Finds the first valid plan for `goal` from `state`.
    ///
    /// Runs seek-plan at deepening level 0, 1, … up to
    /// [`PlannerConfig::deepening_limit`] and returns the first success.
    /// An already satisfied goal yields an empty plan.
    #[instrument(level = "debug", skip_all, fields(domain = %self.domain.name(), goal_len = goal.len()))]
    pub fn plan(&self, state: &State, goal: &[Task]) -> Result<Plan, PlanError> {
        let network: TaskNetwork = goal.iter().cloned().collect();
        let mut stats = SearchStats::default();
        for level in 0..=self.config.deepening_limit {
            let mut actions = Vec::new();
            let root = SearchNode::root(network.clone(), state.clone(), level);
            let found = self.seek(root, &mut actions, &mut stats)?;
            if found {
                stats.level = level;
                let cost = self.total_cost(&actions);
                debug!(
                    level,
                    actions = actions.len(),
                    cost,
                    expansions = stats.expansions,
                    backtracks = stats.backtracks,
                    "plan found"
                );
                return Ok(Plan::new(actions, cost, stats));
            }
            debug!(level, expansions = stats.expansions, "no plan at level");
        }
        Err(PlanError::NoPlanFound {
            goal: network.to_string(),
        })
    }

    /// `true` when `task` decomposes to the empty plan in `state`.
    ///
    /// Only decompositions without any action are explored, so an
    /// unsatisfied task is rejected as soon as every branch needs one.
    pub fn is_satisfied(&self, state: &State, task: &Task) -> Result<bool, PlanError> {
        let network: TaskNetwork = std::iter::once(task.clone()).collect();
        for level in 0..=self.config.deepening_limit {
            if self.reaches_empty(SearchNode::root(network.clone(), state.clone(), level))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Replays `actions` with the planning operators, returning the final
    /// state or the first step that does not apply.
    pub fn validate(&self, state: &State, actions: &[Task]) -> Result<State, ValidationError> {
        let ctx = Context::new(self.domain.rigid(), 0, 0);
        actions
            .iter()
            .enumerate()
            .try_fold(state.clone(), |current, (index, task)| {
                let reject = |reason| ValidationError {
                    index,
                    task: task.clone(),
                    reason,
                };
                let operator = self
                    .domain
                    .operator(task.name())
                    .ok_or_else(|| reject("no operator registered"))?;
                operator
                    .apply(&ctx, &current, task.args())
                    .map_err(|failure| reject(failure.reason()))
            })
    }

    pub(crate) fn total_cost(&self, actions: &[Task]) -> u64 {
        actions
            .iter()
            .map(|a| self.domain.cost_of(a))
            .fold(0, u64::saturating_add)
    }

    pub(crate) fn depth_capped(&self, depth: usize) -> bool {
        self.config.max_depth.is_some_and(|max| depth >= max)
    }

    pub(crate) fn operator_for(&self, task: &Task) -> Result<&'d dyn Operator, PlanError> {
        self.domain
            .operator(task.name())
            .ok_or_else(|| PlanError::UnknownTask {
                name: task.name().to_owned(),
                kind: TaskKind::Primitive,
            })
    }

    pub(crate) fn methods_for(&self, task: &Task) -> Result<&'d [MethodEntry], PlanError> {
        self.domain
            .methods(task.name())
            .ok_or_else(|| PlanError::UnknownTask {
                name: task.name().to_owned(),
                kind: TaskKind::Compound,
            })
    }

    fn reaches_empty(&self, node: SearchNode) -> Result<bool, PlanError> {
        let Some((head, rest)) = node.network.split_first() else {
            return Ok(true);
        };
        if head.is_primitive() {
            self.operator_for(head)?;
            return Ok(false);
        }
        if self.depth_capped(node.depth) {
            return Ok(false);
        }
        let ctx = Context::new(self.domain.rigid(), node.depth, node.level);
        for entry in self.methods_for(head)? {
            let Ok(subtasks) = entry.method().decompose(&ctx, &node.state, head.args()) else {
                continue;
            };
            let child = SearchNode {
                network: rest.prepend(subtasks),
                state: node.state.clone(),
                cost: node.cost,
                depth: node.depth + 1,
                level: node.level,
            };
            if self.reaches_empty(child)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns `Ok(true)` once the network is emptied, leaving the plan in
    /// `actions`; `Ok(false)` means the branch failed and `actions` is
    /// restored to its length on entry.
    fn seek(
        &self,
        node: SearchNode,
        actions: &mut Vec<Task>,
        stats: &mut SearchStats,
    ) -> Result<bool, PlanError> {
        let SearchNode {
            network,
            state,
            cost,
            depth,
            level,
        } = node;
        let Some((head, rest)) = network.split_first() else {
            stats.completions += 1;
            return Ok(true);
        };
        if self.depth_capped(depth) {
            stats.depth_cutoffs += 1;
            trace!(depth, task = %head, "depth cap reached");
            return Ok(false);
        }
        stats.expansions += 1;
        let ctx = Context::new(self.domain.rigid(), depth, level);

        if head.is_primitive() {
            let operator = self.operator_for(head)?;
            let next = match operator.apply(&ctx, &state, head.args()) {
                Ok(next) => next,
                Err(failure) => {
                    trace!(depth, task = %head, %failure, "operator rejected");
                    return Ok(false);
                }
            };
            let child = SearchNode {
                network: rest,
                state: next,
                cost: cost.saturating_add(self.domain.cost_of(head)),
                depth: depth + 1,
                level,
            };
            actions.push(head.clone());
            if self.seek(child, actions, stats)? {
                return Ok(true);
            }
            actions.pop();
            stats.backtracks += 1;
            return Ok(false);
        }

        for entry in self.methods_for(head)? {
            let subtasks = match entry.method().decompose(&ctx, &state, head.args()) {
                Ok(subtasks) => subtasks,
                Err(failure) => {
                    let method = entry.label();
                    trace!(depth, task = %head, method, %failure, "method rejected");
                    continue;
                }
            };
            let (method, subtasks_len) = (entry.label(), subtasks.len());
            trace!(depth, task = %head, method, subtasks = subtasks_len, "decomposed");
            let child = SearchNode {
                network: rest.prepend(subtasks),
                state: state.clone(),
                cost,
                depth: depth + 1,
                level,
            };
            if self.seek(child, actions, stats)? {
                return Ok(true);
            }
            stats.backtracks += 1;
        }
        trace!(depth, task = %head, failure = %Failure::DecompositionExhausted, "backtracking");
        Ok(false)
    }
}
