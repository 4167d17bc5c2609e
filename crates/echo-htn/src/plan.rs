// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plans and search counters.

use std::fmt;

use crate::task::Task;

/// Counters collected while searching. Diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes whose head task was expanded.
    pub expansions: u64,
    /// Alternatives abandoned after they failed.
    pub backtracks: u64,
    /// Branch-and-bound nodes cut by the cost bound.
    pub pruned: u64,
    /// Nodes cut by the depth cap.
    pub depth_cutoffs: u64,
    /// Complete plans reached (branch-and-bound counts every one).
    pub completions: u64,
    /// Deepening level at which the returned plan was found.
    pub level: u32,
}

/// Ordered grounded actions and their total cost.
///
/// Equality compares actions and cost; search counters are ignored.
#[derive(Debug, Clone)]
pub struct Plan {
    actions: Vec<Task>,
    cost: u64,
    stats: SearchStats,
}

impl Plan {
    pub(crate) fn new(actions: Vec<Task>, cost: u64, stats: SearchStats) -> Self {
        Self {
            actions,
            cost,
            stats,
        }
    }

    /// Actions in execution order.
    pub fn actions(&self) -> &[Task] {
        &self.actions
    }

    /// Sum of the domain cost function over the actions.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Counters from the search that produced this plan.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// `true` when the goal was already satisfied.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Consumes the plan, returning its actions.
    pub fn into_actions(self) -> Vec<Task> {
        self.actions
    }
}

impl PartialEq for Plan {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.actions == other.actions
    }
}

impl Eq for Plan {}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{action}")?;
        }
        write!(f, "] (cost {})", self.cost)
    }
}
