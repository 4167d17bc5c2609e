// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
mod common;

use anyhow::Result;
use common::{drop_off, init_tracing, mv, pickup};
use echo_htn::{Discovery, Exhaustion, ExecutionFailure, PlanError, StepOutcome, TraceStep};
use echo_warehouse::{fixtures, Scenario};

fn blocked_edge(step: &TraceStep) -> Option<&Discovery> {
    match &step.outcome {
        StepOutcome::Deviated { discovery, .. } => discovery.as_ref(),
        StepOutcome::Applied => None,
    }
}

#[test]
fn detour_is_taken_after_the_blocked_corridor() -> Result<()> {
    init_tracing();
    let scenario = Scenario::from_yaml(fixtures::DETOUR)?;
    let mut exec = scenario.executor()?;
    let report = exec.run(scenario.initial_state(), &scenario.goal());

    assert!(report.is_success(), "outcome: {:?}", report.outcome);
    assert_eq!(report.trace.replans, 1);
    assert_eq!(
        report.trace.plans[0].actions(),
        &[
            pickup("c1"),
            mv("room1", "room2"),
            mv("room2", "room4"),
            drop_off("c1"),
        ]
    );
    assert_eq!(
        report.trace.plans[1].actions(),
        &[mv("room1", "room3"), mv("room3", "room4"), drop_off("c1")]
    );

    let deviations: Vec<_> = report.trace.deviations().collect();
    assert_eq!(deviations.len(), 1);
    assert_eq!((deviations[0].attempt, deviations[0].index), (0, 1));
    assert_eq!(
        blocked_edge(deviations[0]),
        Some(&Discovery::EdgeBlocked("room1".into(), "room2".into()))
    );
    // The failed move left the robot where it was, still carrying c1.
    assert_eq!(deviations[0].state_before.sym("loc", "c1"), Some("R1"));

    assert!(scenario.deliveries_satisfied(&report.state));
    assert_eq!(report.state.int("battery", "R1"), Some(80));
    assert!(!exec.domain().rigid().is_adjacent("room1", "room2"));
    Ok(())
}

#[test]
fn warehouse_replans_around_a_blocked_door() -> Result<()> {
    let mut scenario = Scenario::from_yaml(fixtures::WAREHOUSE)?;
    scenario.obstacles.push(("room2".into(), "room4".into()));
    let mut exec = scenario.executor()?;
    let report = exec.run(scenario.initial_state(), &scenario.goal());

    assert!(report.is_success(), "outcome: {:?}", report.outcome);
    assert_eq!(report.trace.plans.len(), 2);
    assert_eq!(report.trace.replans, 1);

    let deviations: Vec<_> = report.trace.deviations().collect();
    assert_eq!(deviations.len(), 1);
    assert_eq!(deviations[0].task, mv("room2", "room4"));

    // The second plan starts from room2 and goes round through room3.
    assert_eq!(
        &report.trace.plans[1].actions()[..3],
        &[mv("room2", "room3"), mv("room3", "room4"), pickup("c1")]
    );
    assert!(scenario.deliveries_satisfied(&report.state));
    assert_eq!(report.state.sym("loc", "R1"), Some("room5"));

    let applied_moves = report.trace.applied().filter(|t| t.name() == "move").count();
    assert_eq!(report.trace.plans[1].cost(), 13);
    assert_eq!(applied_moves, 1 + 13);
    Ok(())
}

#[test]
fn zero_replan_budget_stops_at_the_first_deviation() -> Result<()> {
    let scenario = Scenario::from_yaml(fixtures::DETOUR)?;
    let mut exec = scenario.executor()?;
    let report = exec.run_lazy_lookahead(scenario.initial_state(), &scenario.goal(), 0);

    assert_eq!(
        report.outcome,
        Err(ExecutionFailure::ReplanningExhausted {
            replans: 0,
            cause: Exhaustion::BudgetSpent,
        })
    );
    assert_eq!(report.state.sym("loc", "R1"), Some("room1"));
    assert_eq!(report.state.sym("loc", "c1"), Some("R1"));
    Ok(())
}

#[test]
fn walled_in_robot_reports_planning_failure() -> Result<()> {
    let mut scenario = Scenario::from_yaml(fixtures::DETOUR)?;
    scenario.obstacles.push(("room1".into(), "room3".into()));
    let mut exec = scenario.executor()?;
    let report = exec.run(scenario.initial_state(), &scenario.goal());

    assert!(matches!(
        report.outcome,
        Err(ExecutionFailure::Planning(PlanError::NoPlanFound { .. }))
    ));
    assert_eq!(report.trace.replans, 2);
    assert_eq!(report.trace.deviations().count(), 2);
    assert_eq!(exec.domain().rigid().neighbors("room1"), Vec::<&str>::new());
    Ok(())
}

#[test]
fn nothing_to_do_when_already_delivered() -> Result<()> {
    let mut scenario = Scenario::from_yaml(fixtures::DETOUR)?;
    scenario.initial.loc.insert("c1".into(), "room4".into());
    let mut exec = scenario.executor()?;
    let report = exec.run(scenario.initial_state(), &scenario.goal());

    assert!(report.is_success());
    assert!(report.trace.plans.is_empty());
    assert!(report.trace.steps.is_empty());
    Ok(())
}
