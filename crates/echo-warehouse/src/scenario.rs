// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Warehouse scenarios declared in YAML.
//!
//! A scenario names the map, the robots and objects, the initial state, the
//! deliveries to make, and obstacles that only show up during execution.
//!
//! ```yaml
//! name: corridor
//! robots: [R1]
//! objects: [c1]
//! locations: [room1, room2]
//! adjacency: [[room1, room2]]
//! cost_per_move: 10
//! full_battery: 100
//! initial:
//!   loc: { R1: room1, c1: room2 }
//!   battery: { R1: 100 }
//! deliveries:
//!   R1: { c1: room1 }
//! ```

use std::collections::BTreeMap;

use echo_htn::{
    args, Domain, DomainError, Executor, PlannerConfig, RigidRelations, State, Task, Value,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::warehouse_domain;
use crate::graph::CHARGING_STATION;
use crate::methods::TravelStrategy;
use crate::operators::{MoveExec, Params, BATTERY, CARGO, LOC, OBJECT, ROBOT};

/// Errors raised while loading or wiring a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The document is not valid scenario YAML.
    #[error("scenario yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The document parsed but is inconsistent.
    #[error("invalid scenario `{scenario}`: {reason}")]
    Invalid {
        /// Scenario name.
        scenario: String,
        /// What is wrong.
        reason: String,
    },
    /// Domain registration failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Where things start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Initial {
    /// Entity → location; a carried object is located at its robot.
    pub loc: BTreeMap<String, String>,
    /// Robot → battery level.
    pub battery: BTreeMap<String, i64>,
    /// Robot → carried objects (absent means empty).
    #[serde(default)]
    pub cargo: BTreeMap<String, Vec<String>>,
}

/// A complete warehouse problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Diagnostic name.
    pub name: String,
    /// Robot ids.
    pub robots: Vec<String>,
    /// Transportable object ids.
    pub objects: Vec<String>,
    /// Location ids.
    pub locations: Vec<String>,
    /// Locations where a robot may recharge. With none declared, robots
    /// recharge anywhere.
    #[serde(default)]
    pub charging_stations: Vec<String>,
    /// Undirected edges between locations.
    pub adjacency: Vec<(String, String)>,
    /// Battery spent per move.
    pub cost_per_move: i64,
    /// Battery level after recharging.
    pub full_battery: i64,
    /// Initial state.
    pub initial: Initial,
    /// Robot → (object → destination).
    pub deliveries: BTreeMap<String, BTreeMap<String, String>>,
    /// Edges that turn out blocked when a robot tries them.
    #[serde(default)]
    pub obstacles: Vec<(String, String)>,
    /// Planner settings; defaults allow one recharge per station.
    #[serde(default)]
    pub planner: Option<PlannerConfig>,
}

impl Scenario {
    /// Parses and validates a scenario.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        debug!(
            scenario = %scenario.name,
            robots = scenario.robots.len(),
            objects = scenario.objects.len(),
            locations = scenario.locations.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    fn invalid(&self, reason: impl Into<String>) -> ScenarioError {
        ScenarioError::Invalid {
            scenario: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Checks that every reference names a declared entity and every
    /// battery level lies within `0..=full_battery`.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let is_loc = |id: &str| self.locations.iter().any(|l| l == id);
        let is_robot = |id: &str| self.robots.iter().any(|r| r == id);
        let is_object = |id: &str| self.objects.iter().any(|o| o == id);

        if self.cost_per_move <= 0 || self.full_battery <= 0 {
            return Err(self.invalid("cost_per_move and full_battery must be positive"));
        }
        for (a, b) in self.adjacency.iter().chain(&self.obstacles) {
            if !(is_loc(a) && is_loc(b)) {
                return Err(self.invalid(format!("edge {a}-{b} joins unknown locations")));
            }
        }
        if let Some(s) = self.charging_stations.iter().find(|s| !is_loc(s)) {
            return Err(self.invalid(format!("charging station {s} is not a location")));
        }
        for robot in &self.robots {
            if !self.initial.loc.get(robot).is_some_and(|l| is_loc(l)) {
                return Err(self.invalid(format!("robot {robot} has no starting location")));
            }
            match self.initial.battery.get(robot) {
                None => {
                    return Err(self.invalid(format!("robot {robot} has no battery level")));
                }
                Some(level) if !(0..=self.full_battery).contains(level) => {
                    let reason = format!(
                        "robot {robot} battery {level} outside 0..={}",
                        self.full_battery
                    );
                    return Err(self.invalid(reason));
                }
                Some(_) => {}
            }
        }
        for object in &self.objects {
            if !self.initial.loc.get(object).is_some_and(|l| is_loc(l) || is_robot(l)) {
                return Err(self.invalid(format!("object {object} is nowhere")));
            }
        }
        for (robot, cargo) in &self.initial.cargo {
            if !is_robot(robot) || cargo.len() > 1 {
                return Err(self.invalid(format!("bad cargo for {robot}")));
            }
            if let Some(c) = cargo.iter().find(|c| self.initial.loc.get(*c) != Some(robot)) {
                let reason = format!("{c} is carried by {robot} but located elsewhere");
                return Err(self.invalid(reason));
            }
        }
        for (robot, deliveries) in &self.deliveries {
            if !is_robot(robot) {
                return Err(self.invalid(format!("deliveries for unknown robot {robot}")));
            }
            for (object, dest) in deliveries {
                if !(is_object(object) && is_loc(dest)) {
                    return Err(self.invalid(format!("cannot deliver {object} to {dest}")));
                }
            }
        }
        Ok(())
    }

    /// Operator and method parameters.
    pub fn params(&self) -> Params {
        Params {
            cost_per_move: self.cost_per_move,
            full_battery: self.full_battery,
            recharge_anywhere: self.charging_stations.is_empty(),
        }
    }

    /// Station-aware travel when the map has stations, step-wise otherwise.
    pub fn strategy(&self) -> TravelStrategy {
        if self.charging_stations.is_empty() {
            TravelStrategy::StepWise
        } else {
            TravelStrategy::Stations
        }
    }

    /// Types and room graph.
    pub fn rigid_relations(&self) -> RigidRelations {
        let mut rigid = RigidRelations::new();
        rigid.declare_type(ROBOT, self.robots.iter().map(String::as_str));
        rigid.declare_type(OBJECT, self.objects.iter().map(String::as_str));
        rigid.declare_type(LOC, self.locations.iter().map(String::as_str));
        rigid.declare_type(CHARGING_STATION, self.charging_stations.iter().map(String::as_str));
        for (a, b) in &self.adjacency {
            rigid.connect(a, b);
        }
        rigid
    }

    /// The declared initial world.
    pub fn initial_state(&self) -> State {
        let mut state = State::new(format!("{} initial", self.name));
        for (entity, loc) in &self.initial.loc {
            state.set(LOC, entity.as_str(), loc.as_str());
        }
        for (robot, level) in &self.initial.battery {
            state.set(BATTERY, robot.as_str(), *level);
        }
        for robot in &self.robots {
            let cargo: Vec<Value> = self
                .initial
                .cargo
                .get(robot)
                .map(|items| items.iter().map(|c| Value::from(c.as_str())).collect())
                .unwrap_or_default();
            state.set(CARGO, robot.as_str(), cargo);
        }
        state
    }

    /// One `transport_all` task per robot with deliveries.
    pub fn goal(&self) -> Vec<Task> {
        self.deliveries
            .iter()
            .map(|(robot, deliveries)| {
                let targets: BTreeMap<String, Value> = deliveries
                    .iter()
                    .map(|(object, dest)| (object.clone(), Value::from(dest.as_str())))
                    .collect();
                Task::compound("transport_all", args![robot.as_str(), targets])
            })
            .collect()
    }

    /// Planning domain; obstacles are invisible to it.
    pub fn domain(&self) -> Result<Domain, ScenarioError> {
        Ok(warehouse_domain(
            &self.name,
            self.rigid_relations(),
            self.params(),
            self.strategy(),
        )?)
    }

    /// Planner settings, defaulting the deepening limit to the station count.
    pub fn planner_config(&self) -> PlannerConfig {
        self.planner.clone().unwrap_or_else(|| {
            let stations = u32::try_from(self.charging_stations.len()).unwrap_or(u32::MAX);
            PlannerConfig::default().with_deepening_limit(stations)
        })
    }

    /// Executor whose `move` runs into the declared obstacles.
    pub fn executor(&self) -> Result<Executor, ScenarioError> {
        let mut domain = self.domain()?;
        domain.declare_exec_operator("move", MoveExec::new(self.params(), self.obstacles.clone()))?;
        Ok(Executor::with_config(domain, self.planner_config()))
    }

    /// `true` when every object sits at its destination in `state`.
    pub fn deliveries_satisfied(&self, state: &State) -> bool {
        self.deliveries
            .values()
            .flatten()
            .all(|(object, dest)| state.sym(LOC, object) == Some(dest.as_str()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::fixtures;

    #[test]
    fn simple_fixture_builds_a_stepwise_domain() {
        let scenario = Scenario::from_yaml(fixtures::SIMPLE).unwrap();
        assert_eq!(scenario.strategy(), TravelStrategy::StepWise);
        assert!(scenario.params().recharge_anywhere);
        assert_eq!(scenario.planner_config().deepening_limit, 0);

        let state = scenario.initial_state();
        assert_eq!(state.sym(LOC, "c1"), Some("room3"));
        assert_eq!(state.int(BATTERY, "R1"), Some(50));
        assert_eq!(state.list(CARGO, "R1"), Some(&[][..]));
        assert!(!scenario.deliveries_satisfied(&state));
    }

    #[test]
    fn deepening_limit_defaults_to_station_count() {
        let scenario = Scenario::from_yaml(fixtures::WAREHOUSE).unwrap();
        assert_eq!(scenario.strategy(), TravelStrategy::Stations);
        assert_eq!(scenario.planner_config().deepening_limit, 3);
        assert_eq!(scenario.goal().len(), 1);
    }

    #[test]
    fn dangling_references_are_rejected() {
        let mut scenario = Scenario::from_yaml(fixtures::SIMPLE).unwrap();
        scenario.adjacency.push(("room1".into(), "attic".into()));
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("attic"), "{err}");

        let mut scenario = Scenario::from_yaml(fixtures::SIMPLE).unwrap();
        scenario
            .deliveries
            .entry("R1".into())
            .or_default()
            .insert("c9".into(), "room2".into());
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Invalid { .. })
        ));
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let yaml = fixtures::SIMPLE.replace("cost_per_move", "cost_per_mvoe");
        assert!(matches!(
            Scenario::from_yaml(&yaml),
            Err(ScenarioError::Yaml(_))
        ));
    }

    #[test]
    fn carried_objects_must_be_located_at_their_robot() {
        let mut scenario = Scenario::from_yaml(fixtures::SIMPLE).unwrap();
        scenario.initial.cargo.insert("R1".into(), vec!["c1".into()]);
        assert!(scenario.validate().is_err());
        scenario.initial.loc.insert("c1".into(), "R1".into());
        scenario.validate().unwrap();
        assert_eq!(
            scenario.initial_state().list(CARGO, "R1"),
            Some(&[Value::from("c1")][..])
        );
    }

    #[test]
    fn battery_levels_must_fit_the_full_charge() {
        let mut scenario = Scenario::from_yaml(fixtures::SIMPLE).unwrap();
        scenario.initial.battery.insert("R1".into(), 101);
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("battery 101"), "{err}");

        scenario.initial.battery.insert("R1".into(), -1);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Invalid { .. })
        ));

        for level in [0, 100] {
            scenario.initial.battery.insert("R1".into(), level);
            scenario.validate().unwrap();
        }
    }
}
