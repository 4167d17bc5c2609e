// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Warehouse primitive actions.
//!
//! The robot carries at most one object. Moving costs a fixed amount of
//! battery and is refused unless strictly more than that amount remains.

use std::collections::BTreeMap;

use echo_htn::{Context, Deviation, Discovery, ExecOperator, Failure, Operator, State, Value};

use crate::graph::CHARGING_STATION;

/// State relation: entity → location (objects carried by a robot are
/// located at the robot's id).
pub const LOC: &str = "loc";
/// State relation: robot → list of carried objects.
pub const CARGO: &str = "cargo";
/// State relation: robot → remaining battery.
pub const BATTERY: &str = "battery";
/// Type category for robots.
pub const ROBOT: &str = "robot";
/// Type category for transportable objects.
pub const OBJECT: &str = "object";

/// Numeric knobs shared by operators and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Battery spent by one move.
    pub cost_per_move: i64,
    /// Battery level after a recharge.
    pub full_battery: i64,
    /// Whether `recharge` works away from charging stations.
    pub recharge_anywhere: bool,
}

pub(crate) fn sym_arg(args: &[Value], idx: usize) -> Result<&str, Failure> {
    args.get(idx)
        .and_then(Value::as_sym)
        .ok_or(Failure::precondition("expected a symbol argument"))
}

pub(crate) fn int_arg(args: &[Value], idx: usize) -> Result<i64, Failure> {
    args.get(idx)
        .and_then(Value::as_int)
        .ok_or(Failure::precondition("expected an integer argument"))
}

pub(crate) fn list_arg(args: &[Value], idx: usize) -> Result<&[Value], Failure> {
    args.get(idx)
        .and_then(Value::as_list)
        .ok_or(Failure::precondition("expected a list argument"))
}

pub(crate) fn map_arg(args: &[Value], idx: usize) -> Result<&BTreeMap<String, Value>, Failure> {
    args.get(idx)
        .and_then(Value::as_map)
        .ok_or(Failure::precondition("expected a map argument"))
}

pub(crate) fn battery_of(state: &State, robot: &str) -> Result<i64, Failure> {
    state
        .int(BATTERY, robot)
        .ok_or(Failure::precondition("battery unknown"))
}

/// `move(R, from, to)`.
#[derive(Debug, Clone, Copy)]
pub struct Move(pub Params);

impl Operator for Move {
    fn apply(&self, ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure> {
        let (robot, from, to) = (sym_arg(args, 0)?, sym_arg(args, 1)?, sym_arg(args, 2)?);
        let rigid = ctx.rigid();
        if !(rigid.is_a(robot, ROBOT) && rigid.is_a(from, LOC) && rigid.is_a(to, LOC)) {
            return Err(Failure::precondition("move: wrong argument types"));
        }
        if !rigid.is_adjacent(from, to) {
            return Err(Failure::precondition("move: not adjacent"));
        }
        if state.sym(LOC, robot) != Some(from) {
            return Err(Failure::precondition("move: robot not at start"));
        }
        let battery = battery_of(state, robot)?;
        if battery <= self.0.cost_per_move {
            return Err(Failure::precondition("move: battery too low"));
        }
        let mut next = state.clone();
        next.set(LOC, robot, to);
        next.set(BATTERY, robot, battery - self.0.cost_per_move);
        Ok(next)
    }
}

/// `pickup(R, c)`: robot and object share a location and the robot is empty.
#[derive(Debug, Clone, Copy)]
pub struct Pickup;

impl Operator for Pickup {
    fn apply(&self, ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure> {
        let (robot, object) = (sym_arg(args, 0)?, sym_arg(args, 1)?);
        let rigid = ctx.rigid();
        if !(rigid.is_a(robot, ROBOT) && rigid.is_a(object, OBJECT)) {
            return Err(Failure::precondition("pickup: wrong argument types"));
        }
        if !state.list(CARGO, robot).is_none_or(<[Value]>::is_empty) {
            return Err(Failure::precondition("pickup: already carrying"));
        }
        let here = state.sym(LOC, robot);
        if here.is_none() || state.sym(LOC, object) != here {
            return Err(Failure::precondition("pickup: object elsewhere"));
        }
        let mut next = state.clone();
        if !next.push(CARGO, robot, object) {
            return Err(Failure::precondition("pickup: cargo is not a list"));
        }
        next.set(LOC, object, robot);
        Ok(next)
    }
}

/// `drop(R, c)`: puts a carried object down where the robot stands.
#[derive(Debug, Clone, Copy)]
pub struct DropOff;

impl Operator for DropOff {
    fn apply(&self, ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure> {
        let (robot, object) = (sym_arg(args, 0)?, sym_arg(args, 1)?);
        let rigid = ctx.rigid();
        if !(rigid.is_a(robot, ROBOT) && rigid.is_a(object, OBJECT)) {
            return Err(Failure::precondition("drop: wrong argument types"));
        }
        if state.sym(LOC, object) != Some(robot) {
            return Err(Failure::precondition("drop: not carrying"));
        }
        let here = state
            .sym(LOC, robot)
            .ok_or(Failure::precondition("drop: robot unplaced"))?
            .to_owned();
        let mut next = state.clone();
        next.set(LOC, object, here);
        next.remove_from(CARGO, robot, &Value::from(object));
        Ok(next)
    }
}

/// `recharge(R)`: fills the battery at a charging station.
#[derive(Debug, Clone, Copy)]
pub struct Recharge(pub Params);

impl Operator for Recharge {
    fn apply(&self, ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure> {
        let robot = sym_arg(args, 0)?;
        let rigid = ctx.rigid();
        if !rigid.is_a(robot, ROBOT) {
            return Err(Failure::precondition("recharge: not a robot"));
        }
        let at_station = state
            .sym(LOC, robot)
            .is_some_and(|loc| rigid.is_a(loc, CHARGING_STATION));
        if !(at_station || self.0.recharge_anywhere) {
            return Err(Failure::precondition("recharge: no charging station here"));
        }
        Ok(state.clone().with(BATTERY, robot, self.0.full_battery))
    }
}

/// Execution-time `move` that runs into obstacles the planner cannot see.
///
/// A blocked move fails and reports the edge, which the executor then
/// removes from the room graph.
#[derive(Debug, Clone)]
pub struct MoveExec {
    params: Params,
    obstacles: Vec<(String, String)>,
}

impl MoveExec {
    /// Move variant that fails on any of the undirected `obstacles`.
    pub fn new(params: Params, obstacles: Vec<(String, String)>) -> Self {
        Self { params, obstacles }
    }

    fn blocked(&self, a: &str, b: &str) -> bool {
        self.obstacles
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

impl ExecOperator for MoveExec {
    fn execute(
        &self,
        ctx: &Context<'_>,
        state: &State,
        args: &[Value],
    ) -> Result<State, Deviation> {
        let next = Move(self.params).apply(ctx, state, args)?;
        let (from, to) = (sym_arg(args, 1)?, sym_arg(args, 2)?);
        if self.blocked(from, to) {
            return Err(Deviation::with_discovery(
                "move: path blocked",
                Discovery::EdgeBlocked(from.to_owned(), to.to_owned()),
            ));
        }
        Ok(next)
    }
}
