// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Branch-and-bound search for the cheapest plan.
//!
//! Explores the same tree as [`Planner::plan`] but keeps going after the
//! first complete plan. Every node carries its accumulated cost; a node is
//! pruned once that cost reaches the best complete plan seen so far (or
//! exceeds the caller's limit while nothing has been found). Action costs
//! are non-negative, so a pruned branch can never beat the incumbent.

use tracing::{debug, instrument, trace};

use crate::error::PlanError;
use crate::method::Context;
use crate::plan::{Plan, SearchStats};
use crate::planner::{Planner, SearchNode};
use crate::state::State;
use crate::task::{Task, TaskNetwork};

/// Best complete plan so far and the bound it implies.
#[derive(Debug)]
struct Incumbent {
    best: Option<(Vec<Task>, u64)>,
    limit: Option<u64>,
}

impl Incumbent {
    fn prunes(&self, cost: u64) -> bool {
        match &self.best {
            Some((_, best)) => cost >= *best,
            None => self.limit.is_some_and(|limit| cost > limit),
        }
    }
}

impl Planner<'_> {
    /// Finds a minimum-cost plan whose cost does not exceed `cost_limit`.
    ///
    /// `None` falls back to [`PlannerConfig::cost_limit`](crate::PlannerConfig::cost_limit),
    /// and when that is unset too the search is unbounded until the first
    /// plan is found. The bound is shared by every branch and every
    /// deepening level. Among equally cheap plans the one found first in
    /// seek-plan order wins.
    #[instrument(level = "debug", skip_all, fields(domain = %self.domain.name(), goal_len = goal.len(), cost_limit = ?cost_limit))]
    pub fn plan_optimal(
        &self,
        state: &State,
        goal: &[Task],
        cost_limit: Option<u64>,
    ) -> Result<Plan, PlanError> {
        let network: TaskNetwork = goal.iter().cloned().collect();
        let mut incumbent = Incumbent {
            best: None,
            limit: cost_limit.or(self.config.cost_limit),
        };
        let mut stats = SearchStats::default();
        for level in 0..=self.config.deepening_limit {
            let root = SearchNode::root(network.clone(), state.clone(), level);
            self.branch(root, &mut Vec::new(), &mut incumbent, &mut stats)?;
            debug!(
                level,
                best = ?incumbent.best.as_ref().map(|(_, cost)| *cost),
                pruned = stats.pruned,
                "level exhausted"
            );
        }
        match incumbent.best {
            Some((actions, cost)) => Ok(Plan::new(actions, cost, stats)),
            None => Err(PlanError::NoPlanFound {
                goal: network.to_string(),
            }),
        }
    }

    fn branch(
        &self,
        node: SearchNode,
        actions: &mut Vec<Task>,
        incumbent: &mut Incumbent,
        stats: &mut SearchStats,
    ) -> Result<(), PlanError> {
        let SearchNode {
            network,
            state,
            cost,
            depth,
            level,
        } = node;
        if incumbent.prunes(cost) {
            stats.pruned += 1;
            return Ok(());
        }
        let Some((head, rest)) = network.split_first() else {
            stats.completions += 1;
            stats.level = level;
            debug!(cost, actions = actions.len(), level, "new best plan");
            incumbent.best = Some((actions.clone(), cost));
            return Ok(());
        };
        if self.depth_capped(depth) {
            stats.depth_cutoffs += 1;
            return Ok(());
        }
        stats.expansions += 1;
        let ctx = Context::new(self.domain.rigid(), depth, level);

        if head.is_primitive() {
            let operator = self.operator_for(head)?;
            let next = match operator.apply(&ctx, &state, head.args()) {
                Ok(next) => next,
                Err(failure) => {
                    trace!(depth, task = %head, %failure, "operator rejected");
                    return Ok(());
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
            self.branch(child, actions, incumbent, stats)?;
            actions.pop();
            return Ok(());
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
            let child = SearchNode {
                network: rest.prepend(subtasks),
                state: state.clone(),
                cost,
                depth: depth + 1,
                level,
            };
            self.branch(child, actions, incumbent, stats)?;
            stats.backtracks += 1;
        }
        Ok(())
    }
}
