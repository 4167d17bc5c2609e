// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy-lookahead execution: plan, execute, replan on deviation.
//!
//! The executor owns its [`Domain`]. Planning borrows it immutably; the only
//! mutation is [`Executor::report_edge_blocked`], applied between planning
//! calls when an execution step reports a [`Discovery`].

use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigError, ConfigService, ConfigStore, PlannerConfig};
use crate::domain::Domain;
use crate::error::{Exhaustion, ExecutionFailure, PlanError};
use crate::method::{Deviation, Discovery};
use crate::plan::Plan;
use crate::planner::Planner;
use crate::state::State;
use crate::task::Task;

/// Result of one executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The action applied; the actual state advanced.
    Applied,
    /// The action failed in the world; execution stopped there.
    Deviated {
        /// Reported reason.
        reason: &'static str,
        /// Fact revised as a consequence, if any.
        discovery: Option<Discovery>,
    },
}

/// One attempted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    /// Index into [`ExecutionTrace::plans`] of the plan being executed.
    pub attempt: usize,
    /// Position of the action in that plan.
    pub index: usize,
    /// The action.
    pub task: Task,
    /// Actual state before the action was attempted.
    pub state_before: State,
    /// What happened.
    pub outcome: StepOutcome,
}

/// Everything the executor did, in order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    /// Every plan produced, one per planning round.
    pub plans: Vec<Plan>,
    /// Every attempted action across all rounds.
    pub steps: Vec<TraceStep>,
    /// Planning rounds after the first.
    pub replans: usize,
}

impl ExecutionTrace {
    /// Steps that deviated.
    pub fn deviations(&self) -> impl Iterator<Item = &TraceStep> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Deviated { .. }))
    }

    /// Actions that actually applied, in execution order.
    pub fn applied(&self) -> impl Iterator<Item = &Task> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .map(|s| &s.task)
    }
}

/// Final word from [`Executor::run_lazy_lookahead`].
///
/// `state` is the actual world state reached, whether or not the run
/// succeeded.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Actual state after the last applied action.
    pub state: State,
    /// `Ok` when every goal task was verified satisfied.
    pub outcome: Result<(), ExecutionFailure>,
    /// What happened along the way.
    pub trace: ExecutionTrace,
}

impl ExecutionReport {
    /// `true` when the goal was reached.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Executes plans against the actual world and replans on deviation.
#[derive(Debug)]
pub struct Executor {
    domain: Domain,
    config: PlannerConfig,
}

impl Executor {
    /// Executor with default configuration.
    pub fn new(domain: Domain) -> Self {
        Self::with_config(domain, PlannerConfig::default())
    }

    /// Executor with explicit configuration.
    pub fn with_config(domain: Domain, config: PlannerConfig) -> Self {
        Self { domain, config }
    }

    /// Executor configured from whatever `settings` holds under
    /// [`PlannerConfig::KEY`], falling back to the defaults.
    pub fn from_settings<S: ConfigStore>(
        domain: Domain,
        settings: &ConfigService<S>,
    ) -> Result<Self, ConfigError> {
        let config = settings.planner_config()?;
        debug!(?config, "planner config loaded");
        Ok(Self::with_config(domain, config))
    }

    /// Domain in its current (possibly revised) form.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Returns the domain, including revisions learned during execution.
    pub fn into_domain(self) -> Domain {
        self.domain
    }

    /// A planner over the current domain.
    pub fn planner(&self) -> Planner<'_> {
        Planner::with_config(&self.domain, self.config.clone())
    }

    /// Removes the undirected edge `a`–`b` from the rigid relations.
    ///
    /// Every later planning call sees the edge as gone. Returns `false` if
    /// the edge was already absent.
    pub fn report_edge_blocked(&mut self, a: &str, b: &str) -> bool {
        let removed = self.domain.remove_edge(a, b);
        if removed {
            warn!(a, b, "edge blocked; replanning without it");
        }
        removed
    }

    /// [`Executor::run_lazy_lookahead`] with the configured replan budget.
    pub fn run(&mut self, state: State, goal: &[Task]) -> ExecutionReport {
        self.run_lazy_lookahead(state, goal, self.config.max_replans)
    }

    /// Plans for the outstanding goal, executes the plan step by step and
    /// replans from the actual state whenever a step deviates.
    ///
    /// The goal is sequential. Before each planning round the leading goal
    /// tasks already satisfied in the actual state are dropped; a satisfied
    /// task behind an unsatisfied one stays, since reaching the earlier
    /// task may undo it. A plan that runs to completion and leaves the world
    /// exactly where the planner predicted achieves the whole outstanding
    /// goal. The run fails when planning fails, when more than
    /// `max_replans` rounds follow the first, or when a fresh plan is
    /// identical to the one that just deviated from the same state.
    #[instrument(skip_all, fields(domain = %self.domain.name(), goal_len = goal.len(), max_replans = max_replans))]
    pub fn run_lazy_lookahead(
        &mut self,
        state: State,
        goal: &[Task],
        max_replans: usize,
    ) -> ExecutionReport {
        let mut trace = ExecutionTrace::default();
        let mut actual = state;
        let mut failed: Option<(Plan, State)> = None;
        loop {
            let outstanding = match self.outstanding(&actual, goal) {
                Ok(outstanding) => outstanding,
                Err(err) => return finish(actual, Err(err.into()), trace),
            };
            if outstanding.is_empty() {
                info!(replans = trace.replans, steps = trace.steps.len(), "goal reached");
                return finish(actual, Ok(()), trace);
            }
            if !trace.plans.is_empty() {
                if trace.replans >= max_replans {
                    warn!(replans = trace.replans, "replan budget spent");
                    let failure = ExecutionFailure::ReplanningExhausted {
                        replans: trace.replans,
                        cause: Exhaustion::BudgetSpent,
                    };
                    return finish(actual, Err(failure), trace);
                }
                trace.replans += 1;
            }

            let plan = match self.planner().plan(&actual, &outstanding) {
                Ok(plan) => plan,
                Err(err) => {
                    warn!(%err, "planning from actual state failed");
                    return finish(actual, Err(err.into()), trace);
                }
            };
            debug!(round = trace.plans.len(), %plan, "planned");
            if plan.is_empty() {
                return finish(actual, Ok(()), trace);
            }
            if failed
                .as_ref()
                .is_some_and(|(prev, from)| *prev == plan && *from == actual)
            {
                warn!(%plan, "replanned the plan that just failed");
                let failure = ExecutionFailure::ReplanningExhausted {
                    replans: trace.replans,
                    cause: Exhaustion::NoProgress,
                };
                return finish(actual, Err(failure), trace);
            }

            let attempt = trace.plans.len();
            trace.plans.push(plan.clone());
            let planned_from = actual.clone();
            match self.execute_plan(&mut actual, &plan, attempt, &mut trace) {
                Ok(()) => {
                    let predicted = self.planner().validate(&planned_from, plan.actions());
                    if predicted.as_ref() == Ok(&actual) {
                        info!(replans = trace.replans, steps = trace.steps.len(), "goal reached");
                        return finish(actual, Ok(()), trace);
                    }
                    debug!("world diverged from the model without a failed step");
                    failed = None;
                }
                Err(deviation) => {
                    if let Some(Discovery::EdgeBlocked(a, b)) = deviation.discovery() {
                        self.report_edge_blocked(a, b);
                    }
                    failed = Some((plan, planned_from));
                }
            }
        }
    }

    fn outstanding(&self, actual: &State, goal: &[Task]) -> Result<Vec<Task>, PlanError> {
        let planner = self.planner();
        for (done, task) in goal.iter().enumerate() {
            if !planner.is_satisfied(actual, task)? {
                return Ok(goal[done..].to_vec());
            }
        }
        Ok(Vec::new())
    }

    fn execute_plan(
        &self,
        actual: &mut State,
        plan: &Plan,
        attempt: usize,
        trace: &mut ExecutionTrace,
    ) -> Result<(), Deviation> {
        for (index, task) in plan.actions().iter().enumerate() {
            match self.domain.execute(actual, task) {
                Ok(next) => {
                    trace.steps.push(TraceStep {
                        attempt,
                        index,
                        task: task.clone(),
                        state_before: std::mem::replace(actual, next),
                        outcome: StepOutcome::Applied,
                    });
                }
                Err(deviation) => {
                    warn!(index, %task, reason = deviation.reason(), "execution deviated");
                    trace.steps.push(TraceStep {
                        attempt,
                        index,
                        task: task.clone(),
                        state_before: actual.clone(),
                        outcome: StepOutcome::Deviated {
                            reason: deviation.reason(),
                            discovery: deviation.discovery().cloned(),
                        },
                    });
                    return Err(deviation);
                }
            }
        }
        Ok(())
    }
}

fn finish(
    state: State,
    outcome: Result<(), ExecutionFailure>,
    trace: ExecutionTrace,
) -> ExecutionReport {
    ExecutionReport {
        state,
        outcome,
        trace,
    }
}
