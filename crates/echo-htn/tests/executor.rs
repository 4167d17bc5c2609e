// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use anyhow::{Context as _, Result};
use common::{at, corridor, corridor_domain, diamond, init_tracing, reach, step_task, Walls};
use echo_htn::{
    ConfigService, Discovery, Exhaustion, ExecutionFailure, Executor, FsConfigStore, PlanError,
    PlannerConfig, StepOutcome, Task,
};

fn executor_with(walls: Walls) -> Result<Executor> {
    let mut domain = corridor_domain(diamond());
    domain.declare_exec_operator("step", walls)?;
    Ok(Executor::new(domain))
}

#[test]
fn discovered_wall_triggers_a_detour() -> Result<()> {
    init_tracing();
    let mut exec = executor_with(Walls::reporting(&[("a", "b")]))?;
    let report = exec.run_lazy_lookahead(at("a"), &[reach("d")], 3);

    assert!(report.is_success(), "outcome: {:?}", report.outcome);
    assert_eq!(report.state.sym("at", "bot"), Some("d"));
    assert_eq!(report.trace.plans.len(), 2);
    assert_eq!(report.trace.replans, 1);
    assert_eq!(
        report.trace.plans[0].actions(),
        &[step_task("a", "b"), step_task("b", "d")]
    );

    let deviations: Vec<_> = report.trace.deviations().collect();
    assert_eq!(deviations.len(), 1);
    assert_eq!(
        deviations[0].outcome,
        StepOutcome::Deviated {
            reason: "wall",
            discovery: Some(Discovery::EdgeBlocked("a".into(), "b".into())),
        }
    );
    assert_eq!(
        report.trace.applied().cloned().collect::<Vec<_>>(),
        vec![step_task("a", "c"), step_task("c", "d")]
    );
    assert!(!exec.domain().rigid().is_adjacent("a", "b"));
    Ok(())
}

#[test]
fn replanning_starts_from_the_actual_state() -> Result<()> {
    let mut exec = executor_with(Walls::reporting(&[("b", "d")]))?;
    let report = exec.run_lazy_lookahead(at("a"), &[reach("d")], 3);

    assert!(report.is_success());
    assert_eq!(
        report.trace.applied().cloned().collect::<Vec<_>>(),
        vec![
            step_task("a", "b"),
            step_task("b", "a"),
            step_task("a", "c"),
            step_task("c", "d"),
        ]
    );
    let failed = report.trace.deviations().next().context("one deviation")?;
    assert_eq!(failed.attempt, 0);
    assert_eq!(failed.index, 1);
    assert_eq!(failed.state_before.sym("at", "bot"), Some("b"));
    Ok(())
}

#[test]
fn satisfied_goals_are_dropped_before_replanning() -> Result<()> {
    let mut exec = executor_with(Walls::reporting(&[("b", "d")]))?;
    let report = exec.run_lazy_lookahead(at("a"), &[reach("b"), reach("d")], 3);

    assert!(report.is_success());
    let replanned = &report.trace.plans[1];
    assert_eq!(replanned.actions()[0], step_task("b", "a"));
    assert_eq!(replanned.len(), 3);
    Ok(())
}

#[test]
fn exhausted_budget_returns_the_actual_state() -> Result<()> {
    let mut exec = executor_with(Walls::reporting(&[("b", "d")]))?;
    let report = exec.run_lazy_lookahead(at("a"), &[reach("d")], 0);

    assert_eq!(
        report.outcome,
        Err(ExecutionFailure::ReplanningExhausted {
            replans: 0,
            cause: Exhaustion::BudgetSpent,
        })
    );
    assert_eq!(report.state.sym("at", "bot"), Some("b"));
    assert_eq!(report.trace.plans.len(), 1);
    Ok(())
}

#[test]
fn identical_replan_is_reported_as_no_progress() -> Result<()> {
    let mut exec = executor_with(Walls::silent(&[("a", "b")]))?;
    let report = exec.run_lazy_lookahead(at("a"), &[reach("d")], 5);

    assert_eq!(
        report.outcome,
        Err(ExecutionFailure::ReplanningExhausted {
            replans: 1,
            cause: Exhaustion::NoProgress,
        })
    );
    assert_eq!(report.state.sym("at", "bot"), Some("a"));
    assert!(exec.domain().rigid().is_adjacent("a", "b"));
    Ok(())
}

#[test]
fn already_satisfied_goal_needs_no_plan() -> Result<()> {
    let mut exec = executor_with(Walls::reporting(&[]))?;
    let report = exec.run_lazy_lookahead(at("d"), &[reach("d")], 0);
    assert!(report.is_success());
    assert!(report.trace.plans.is_empty());
    assert!(report.trace.steps.is_empty());
    Ok(())
}

#[test]
fn unreachable_goal_is_a_planning_failure() -> Result<()> {
    let mut domain = corridor_domain(corridor(&[("a", "b"), ("e", "f")]));
    domain
        .declare_exec_operator("step", Walls::reporting(&[]))?;
    let mut exec = Executor::new(domain);

    let report = exec.run_lazy_lookahead(at("a"), &[reach("f")], 3);
    assert!(matches!(
        report.outcome,
        Err(ExecutionFailure::Planning(PlanError::NoPlanFound { .. }))
    ));
    assert_eq!(report.state, at("a"));

    let report = exec.run(at("a"), &[Task::compound("fly", Vec::new())]);
    assert!(matches!(
        report.outcome,
        Err(ExecutionFailure::Planning(PlanError::UnknownTask { .. }))
    ));
    Ok(())
}

#[test]
fn run_uses_the_configured_budget() -> Result<()> {
    let mut domain = corridor_domain(diamond());
    domain
        .declare_exec_operator("step", Walls::reporting(&[("a", "b"), ("c", "d")]))?;
    let config = PlannerConfig::default().with_max_replans(1);
    let mut exec = Executor::with_config(domain, config);

    // Both routes are walled: a-b is found first, then a-c-d dies at c-d
    // and a third round would exceed the budget.
    let report = exec.run(at("a"), &[reach("d")]);
    assert_eq!(
        report.outcome,
        Err(ExecutionFailure::ReplanningExhausted {
            replans: 1,
            cause: Exhaustion::BudgetSpent,
        })
    );
    assert_eq!(report.state.sym("at", "bot"), Some("c"));
    Ok(())
}

#[test]
fn executor_without_exec_variants_uses_planning_operators() -> Result<()> {
    let mut exec = Executor::new(corridor_domain(diamond()));
    let report = exec.run_lazy_lookahead(at("a"), &[reach("d")], 0);
    assert!(report.is_success());
    assert_eq!(report.trace.steps.len(), 2);
    assert_eq!(exec.into_domain().rigid().edges().count(), 4);
    Ok(())
}

#[test]
fn sequential_goal_keeps_satisfied_tasks_behind_an_unsatisfied_one() -> Result<()> {
    let mut exec = executor_with(Walls::reporting(&[]))?;
    let report = exec.run_lazy_lookahead(at("b"), &[reach("d"), reach("b")], 3);

    assert!(report.is_success(), "outcome: {:?}", report.outcome);
    assert_eq!(report.trace.plans.len(), 1);
    assert_eq!(report.trace.replans, 0);
    assert_eq!(
        report.trace.plans[0].actions(),
        &[step_task("b", "d"), step_task("d", "b")]
    );
    assert_eq!(report.state.sym("at", "bot"), Some("b"));
    Ok(())
}

#[test]
fn executor_reads_its_budget_from_stored_settings() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = ConfigService::new(FsConfigStore::new(dir.path())?);

    let mut domain = corridor_domain(diamond());
    domain.declare_exec_operator("step", Walls::reporting(&[("b", "d")]))?;
    let exec = Executor::from_settings(domain, &settings)?;
    assert_eq!(exec.config(), &PlannerConfig::default());

    settings.save(PlannerConfig::KEY, &PlannerConfig::default().with_max_replans(0))?;
    let mut exec = Executor::from_settings(exec.into_domain(), &settings)?;
    let report = exec.run(at("a"), &[reach("d")]);
    assert_eq!(
        report.outcome,
        Err(ExecutionFailure::ReplanningExhausted {
            replans: 0,
            cause: Exhaustion::BudgetSpent,
        })
    );
    assert_eq!(report.state.sym("at", "bot"), Some("b"));
    Ok(())
}
