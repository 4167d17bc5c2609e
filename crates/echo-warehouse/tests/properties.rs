// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use echo_htn::Planner;
use echo_warehouse::graph::distance;
use echo_warehouse::{fixtures, Scenario};

// Pinned seed so failures reproduce across machines; override locally with
// PROPTEST_SEED when exploring.
const SEED_BYTES: [u8; 32] = [
    0x2a, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0,
];

const ROOMS: [&str; 4] = ["room1", "room2", "room3", "room4"];

#[derive(Debug, Clone)]
struct Setup {
    robot_at: usize,
    object_at: usize,
    dest: usize,
    battery: i64,
    cost_per_move: i64,
}

fn setup() -> impl Strategy<Value = Setup> {
    (0..4usize, 0..4usize, 0..4usize, 1i64..=30).prop_flat_map(
        |(robot_at, object_at, dest, cost_per_move)| {
            (cost_per_move + 1..=100).prop_map(move |battery| Setup {
                robot_at,
                object_at,
                dest,
                battery,
                cost_per_move,
            })
        },
    )
}

fn scenario(s: &Setup) -> Result<Scenario, TestCaseError> {
    let mut scenario =
        Scenario::from_yaml(fixtures::SIMPLE).map_err(|e| TestCaseError::fail(e.to_string()))?;
    scenario.cost_per_move = s.cost_per_move;
    scenario.initial.battery.insert("R1".into(), s.battery);
    scenario.initial.loc.insert("R1".into(), ROOMS[s.robot_at].into());
    scenario.initial.loc.insert("c1".into(), ROOMS[s.object_at].into());
    let dest = scenario.deliveries.entry("R1".into()).or_default();
    dest.insert("c1".into(), ROOMS[s.dest].into());
    Ok(scenario)
}

#[test]
fn stepwise_deliveries_follow_shortest_routes_and_recharge_only_when_needed() {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);

    runner
        .run(&setup(), |s| {
            let scenario = scenario(&s)?;
            let domain = scenario
                .domain()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let planner = Planner::with_config(&domain, scenario.planner_config());
            let start = scenario.initial_state();
            let goal = scenario.goal();

            let plan = planner
                .plan(&start, &goal)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let end = planner
                .validate(&start, plan.actions())
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(scenario.deliveries_satisfied(&end));

            let rigid = domain.rigid();
            let (robot, object, dest) = (ROOMS[s.robot_at], ROOMS[s.object_at], ROOMS[s.dest]);
            let expected = if object == dest {
                0
            } else {
                distance(rigid, robot, object).unwrap_or(usize::MAX)
                    + distance(rigid, object, dest).unwrap_or(usize::MAX)
            };
            prop_assert_eq!(usize::try_from(plan.cost()).ok(), Some(expected));

            for (i, action) in plan.actions().iter().enumerate() {
                if action.name() != "recharge" {
                    continue;
                }
                let before = planner
                    .validate(&start, &plan.actions()[..i])
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert!(before.int("battery", "R1") <= Some(s.cost_per_move));
                prop_assert_eq!(plan.actions().get(i + 1).map(|a| a.name()), Some("move"));
            }

            let best = planner
                .plan_optimal(&start, &goal, None)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(best.cost() <= plan.cost());
            Ok(())
        })
        .expect("step-wise delivery properties hold");
}
