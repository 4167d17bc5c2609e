// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Warehouse task decompositions.
//!
//! Deliveries: `transport_all(R, {c: dest})` delivers every listed object,
//! recommending nearest-first via `transport_all_order` while leaving the
//! other orderings reachable for branch-and-bound.
//!
//! Travel comes in two strategies. Maps with charging stations route through
//! `travel_with_wrapper`/`travel_with`/`travel_via`, which try zero recharges
//! first and allow at most [`Context::level`] recharges per leg. Maps
//! without stations walk the shortest path through `move_next`, recharging
//! in place whenever the battery cannot pay for the next move.

use std::collections::BTreeMap;

use echo_htn::{
    args, Context, Domain, DomainError, Failure, Method, RigidRelations, State, Task, Value,
};

use crate::graph::{
    charging_stations_by_distance, closest_charging_station, distance, shortest_path,
};
use crate::operators::{
    battery_of, int_arg, list_arg, map_arg, sym_arg, Params, CARGO, LOC,
};

type ParamMethodFn =
    for<'a> fn(&Params, &Context<'a>, &State, &[Value]) -> Result<Vec<Task>, Failure>;

/// A method body that also needs the scenario's numeric parameters.
struct WithParams {
    params: Params,
    body: ParamMethodFn,
}

impl WithParams {
    fn new(params: Params, body: ParamMethodFn) -> Self {
        Self { params, body }
    }
}

impl Method for WithParams {
    fn decompose(
        &self,
        ctx: &Context<'_>,
        state: &State,
        args: &[Value],
    ) -> Result<Vec<Task>, Failure> {
        (self.body)(&self.params, ctx, state, args)
    }
}

/// Which travel strategy a domain uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelStrategy {
    /// Recharge only at stations; recharge count bounded by the search level.
    Stations,
    /// Recharge anywhere, just before a move the battery cannot afford.
    StepWise,
}

/// Registers every warehouse method on `domain`.
pub fn declare_methods(
    domain: &mut Domain,
    params: Params,
    strategy: TravelStrategy,
) -> Result<(), DomainError> {
    domain.declare_method("transport_all", "carried_first", transport_all_carried)?;
    domain.declare_method("transport_all", "nearest_first", transport_all_nearest)?;
    domain.declare_method("transport_all", "done", transport_all_done)?;

    domain.declare_method("transport_all_order", "take_ith", transport_all_order_take)?;
    domain.declare_method("transport_all_order", "skip_ith", transport_all_order_skip)?;

    domain.declare_method("transport", "fetch", transport_fetch)?;
    domain.declare_method("transport", "deliver", transport_deliver)?;
    domain.declare_method("transport", "delivered", transport_delivered)?;

    domain.declare_method("travel", "arrived", travel_arrived)?;
    match strategy {
        TravelStrategy::Stations => {
            domain.declare_method("travel", "route", travel_route)?;
            domain.declare_method("travel_with_wrapper", "try", wrapper_try)?;
            domain.declare_method("travel_with_wrapper", "widen", wrapper_widen)?;
            domain.declare_method("travel_with", "arrived", travel_arrived)?;
            domain.declare_method(
                "travel_with",
                "direct",
                WithParams::new(params, travel_with_direct),
            )?;
            domain.declare_method("travel_with", "via", travel_with_via)?;
            domain.declare_method(
                "travel_via",
                "station",
                WithParams::new(params, travel_via_station),
            )?;
            domain.declare_method("travel_via", "next_station", travel_via_next)?;
        }
        TravelStrategy::StepWise => {
            domain.declare_method("travel", "path", travel_path)?;
            domain.declare_method(
                "move_next",
                "direct",
                WithParams::new(params, move_next_direct),
            )?;
            domain.declare_method(
                "move_next",
                "recharge_first",
                WithParams::new(params, move_next_recharge),
            )?;
        }
    }
    Ok(())
}

fn transport_all(robot: &str, deliveries: BTreeMap<String, Value>) -> Task {
    Task::compound("transport_all", args![robot, deliveries])
}

fn transport(robot: &str, object: &str, dest: &Value) -> Task {
    Task::compound("transport", vec![robot.into(), object.into(), dest.clone()])
}

fn cargo_is_empty(state: &State, robot: &str) -> bool {
    state.list(CARGO, robot).is_none_or(<[Value]>::is_empty)
}

fn robot_loc<'s>(state: &'s State, robot: &str) -> Result<&'s str, Failure> {
    state
        .sym(LOC, robot)
        .ok_or(Failure::precondition("robot unplaced"))
}

fn without(deliveries: &BTreeMap<String, Value>, object: &str) -> BTreeMap<String, Value> {
    let mut rest = deliveries.clone();
    rest.remove(object);
    rest
}

// An object already on board is delivered before anything else.
fn transport_all_carried(
    _: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, deliveries) = (sym_arg(args, 0)?, map_arg(args, 1)?);
    let carried = state
        .list(CARGO, robot)
        .and_then(<[Value]>::first)
        .and_then(Value::as_sym)
        .ok_or(Failure::precondition("nothing carried"))?;
    let dest = deliveries
        .get(carried)
        .ok_or(Failure::precondition("carried object not in deliveries"))?;
    Ok(vec![
        transport(robot, carried, dest),
        transport_all(robot, without(deliveries, carried)),
    ])
}

fn transport_all_nearest(
    ctx: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, deliveries) = (sym_arg(args, 0)?, map_arg(args, 1)?);
    if !cargo_is_empty(state, robot) || deliveries.is_empty() {
        return Err(Failure::precondition("cargo full or nothing to deliver"));
    }
    let here = robot_loc(state, robot)?;
    let mut objects: Vec<&String> = deliveries.keys().collect();
    objects.sort_by_key(|object| {
        state
            .sym(LOC, object)
            .and_then(|at| distance(ctx.rigid(), here, at))
            .unwrap_or(usize::MAX)
    });
    let order: Vec<Value> = objects.into_iter().map(|o| Value::from(o.as_str())).collect();
    Ok(vec![Task::compound(
        "transport_all_order",
        args![robot, order, deliveries.clone(), 0],
    )])
}

fn transport_all_done(_: &Context<'_>, _: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    if map_arg(args, 1)?.is_empty() {
        Ok(Vec::new())
    } else {
        Err(Failure::precondition("deliveries outstanding"))
    }
}

fn order_candidate<'v>(
    state: &State,
    args: &'v [Value],
) -> Result<(&'v str, &'v [Value], &'v BTreeMap<String, Value>, i64), Failure> {
    let (robot, order, deliveries, i) = (
        sym_arg(args, 0)?,
        list_arg(args, 1)?,
        map_arg(args, 2)?,
        int_arg(args, 3)?,
    );
    let in_range = usize::try_from(i).is_ok_and(|i| i < deliveries.len() && i < order.len());
    if !cargo_is_empty(state, robot) || !in_range {
        return Err(Failure::precondition("no candidate at this position"));
    }
    Ok((robot, order, deliveries, i))
}

// Deliver the i-th recommended object next.
fn transport_all_order_take(
    _: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, order, deliveries, i) = order_candidate(state, args)?;
    let object = usize::try_from(i)
        .ok()
        .and_then(|i| order.get(i))
        .and_then(Value::as_sym)
        .ok_or(Failure::precondition("bad ordering"))?;
    let dest = deliveries
        .get(object)
        .ok_or(Failure::precondition("ordered object not in deliveries"))?;
    Ok(vec![
        transport(robot, object, dest),
        transport_all(robot, without(deliveries, object)),
    ])
}

// Leave the i-th object for later and consider the next one.
fn transport_all_order_skip(
    _: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, order, deliveries, i) = order_candidate(state, args)?;
    Ok(vec![Task::compound(
        "transport_all_order",
        args![robot, order.to_vec(), deliveries.clone(), i + 1],
    )])
}

fn transport_fetch(ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, object, dest) = (sym_arg(args, 0)?, sym_arg(args, 1)?, sym_arg(args, 2)?);
    let at = state
        .sym(LOC, object)
        .ok_or(Failure::precondition("object unplaced"))?;
    if at == dest || !ctx.rigid().is_a(at, LOC) {
        return Err(Failure::precondition("object not waiting at a location"));
    }
    Ok(vec![
        Task::compound("travel", args![robot, at]),
        Task::primitive("pickup", args![robot, object]),
        Task::compound("travel", args![robot, dest]),
        Task::primitive("drop", args![robot, object]),
    ])
}

fn transport_deliver(_: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, object, dest) = (sym_arg(args, 0)?, sym_arg(args, 1)?, sym_arg(args, 2)?);
    if state.sym(LOC, object) != Some(robot) {
        return Err(Failure::precondition("object not on board"));
    }
    Ok(vec![
        Task::compound("travel", args![robot, dest]),
        Task::primitive("drop", args![robot, object]),
    ])
}

fn transport_delivered(
    _: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (object, dest) = (sym_arg(args, 1)?, sym_arg(args, 2)?);
    if state.sym(LOC, object) == Some(dest) {
        Ok(Vec::new())
    } else {
        Err(Failure::precondition("object not delivered"))
    }
}

// Shared by `travel` and `travel_with`: nothing to do once there.
fn travel_arrived(_: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest) = (sym_arg(args, 0)?, sym_arg(args, 1)?);
    if robot_loc(state, robot)? == dest {
        Ok(Vec::new())
    } else {
        Err(Failure::precondition("not there yet"))
    }
}

fn travel_route(_: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest) = (sym_arg(args, 0)?, sym_arg(args, 1)?);
    if robot_loc(state, robot)? == dest {
        return Err(Failure::precondition("already there"));
    }
    Ok(vec![Task::compound("travel_with_wrapper", args![robot, dest, 0])])
}

// Try exactly i recharges on this leg.
fn wrapper_try(ctx: &Context<'_>, _: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest, i) = (sym_arg(args, 0)?, sym_arg(args, 1)?, int_arg(args, 2)?);
    if i > i64::from(ctx.level()) {
        return Err(Failure::precondition("recharge count above search level"));
    }
    Ok(vec![Task::compound(
        "travel_with",
        args![robot, dest, i, Vec::<Value>::new()],
    )])
}

// Allow one more recharge, up to the search level.
fn wrapper_widen(ctx: &Context<'_>, _: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest, i) = (sym_arg(args, 0)?, sym_arg(args, 1)?, int_arg(args, 2)?);
    if i >= i64::from(ctx.level()) {
        return Err(Failure::precondition("search level reached"));
    }
    Ok(vec![Task::compound(
        "travel_with_wrapper",
        args![robot, dest, i + 1],
    )])
}

/// Moves needed to reach the nearest station from `loc` (zero when none
/// is reachable, since no recharge could follow anyway).
fn station_reserve(rigid: &RigidRelations, loc: &str) -> usize {
    closest_charging_station(rigid, loc)
        .and_then(|station| distance(rigid, loc, &station))
        .unwrap_or(0)
}

fn battery_for(params: &Params, moves: usize) -> i64 {
    i64::try_from(moves)
        .unwrap_or(i64::MAX)
        .saturating_mul(params.cost_per_move)
}

fn moves_along(robot: &str, from: &str, path: Vec<String>) -> Vec<Task> {
    let mut prev = from.to_owned();
    path.into_iter()
        .map(|next| {
            let step = Task::primitive("move", args![robot, prev.as_str(), next.as_str()]);
            prev = next;
            step
        })
        .collect()
}

// No recharge: go straight there if the battery also covers the way on to
// the nearest station.
fn travel_with_direct(
    params: &Params,
    ctx: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, dest, i) = (sym_arg(args, 0)?, sym_arg(args, 1)?, int_arg(args, 2)?);
    let rigid = ctx.rigid();
    let here = robot_loc(state, robot)?;
    if i != 0 || here == dest || !rigid.is_a(dest, LOC) {
        return Err(Failure::precondition("not a direct leg"));
    }
    let path = shortest_path(rigid, here, dest).ok_or(Failure::precondition("unreachable"))?;
    let needed = battery_for(params, path.len() + station_reserve(rigid, dest));
    if battery_of(state, robot)? <= needed {
        return Err(Failure::precondition("not enough battery for a direct leg"));
    }
    Ok(moves_along(robot, here, path))
}

// With recharges: pick the last station, nearest to the destination first.
fn travel_with_via(ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest, i, excluded) = (
        sym_arg(args, 0)?,
        sym_arg(args, 1)?,
        int_arg(args, 2)?,
        list_arg(args, 3)?,
    );
    let rigid = ctx.rigid();
    if i <= 0 || robot_loc(state, robot)? == dest || !rigid.is_a(dest, LOC) {
        return Err(Failure::precondition("not a leg with recharges"));
    }
    let mut candidates = charging_stations_by_distance(rigid, dest)
        .into_iter()
        .filter(|s| !excluded.iter().any(|e| e.as_sym() == Some(s.as_str())));
    let first = candidates
        .next()
        .ok_or(Failure::precondition("no usable charging station"))?;
    let others: Vec<Value> = candidates.map(Value::from).collect();
    Ok(vec![Task::compound(
        "travel_via",
        args![robot, dest, first, others, excluded.to_vec(), i],
    )])
}

fn excluding(excluded: &[Value], station: &str) -> Vec<Value> {
    let mut out = excluded.to_vec();
    out.push(Value::from(station));
    out
}

// Reach `station` with one recharge fewer, refill, then go direct.
fn travel_via_station(
    params: &Params,
    ctx: &Context<'_>,
    _: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, dest, station, excluded, i) = (
        sym_arg(args, 0)?,
        sym_arg(args, 1)?,
        sym_arg(args, 2)?,
        list_arg(args, 4)?,
        int_arg(args, 5)?,
    );
    let rigid = ctx.rigid();
    if i <= 0 || !rigid.is_a(station, LOC) {
        return Err(Failure::precondition("no recharge left for this station"));
    }
    let leg = distance(rigid, station, dest).ok_or(Failure::precondition("unreachable"))?;
    if params.full_battery <= battery_for(params, leg + station_reserve(rigid, dest)) {
        return Err(Failure::precondition("station too far from destination"));
    }
    let excluded = excluding(excluded, station);
    Ok(vec![
        Task::compound("travel_with", args![robot, station, i - 1, excluded.clone()]),
        Task::primitive("recharge", args![robot]),
        Task::compound("travel_with", args![robot, dest, 0, excluded]),
    ])
}

// Fall back to the next station in distance order.
fn travel_via_next(_: &Context<'_>, _: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest, station, others, excluded, i) = (
        sym_arg(args, 0)?,
        sym_arg(args, 1)?,
        sym_arg(args, 2)?,
        list_arg(args, 3)?,
        list_arg(args, 4)?,
        int_arg(args, 5)?,
    );
    let Some((next, rest)) = others.split_first() else {
        return Err(Failure::precondition("no other station"));
    };
    if i <= 0 {
        return Err(Failure::precondition("no recharge left"));
    }
    Ok(vec![Task::compound(
        "travel_via",
        vec![
            robot.into(),
            dest.into(),
            next.clone(),
            Value::List(rest.to_vec()),
            Value::List(excluding(excluded, station)),
            i.into(),
        ],
    )])
}

fn travel_path(ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (robot, dest) = (sym_arg(args, 0)?, sym_arg(args, 1)?);
    let rigid = ctx.rigid();
    let here = robot_loc(state, robot)?;
    if here == dest || !rigid.is_a(dest, LOC) {
        return Err(Failure::precondition("nowhere to travel"));
    }
    let path = shortest_path(rigid, here, dest).ok_or(Failure::precondition("unreachable"))?;
    let mut prev = here;
    let mut steps = Vec::with_capacity(path.len());
    for next in &path {
        steps.push(Task::compound("move_next", args![robot, prev, next.as_str()]));
        prev = next.as_str();
    }
    Ok(steps)
}

fn move_next_direct(
    params: &Params,
    ctx: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, from, to) = (sym_arg(args, 0)?, sym_arg(args, 1)?, sym_arg(args, 2)?);
    if !ctx.rigid().is_adjacent(from, to) || battery_of(state, robot)? <= params.cost_per_move {
        return Err(Failure::precondition("cannot move without recharging"));
    }
    Ok(vec![Task::primitive("move", args![robot, from, to])])
}

fn move_next_recharge(
    params: &Params,
    ctx: &Context<'_>,
    state: &State,
    args: &[Value],
) -> Result<Vec<Task>, Failure> {
    let (robot, from, to) = (sym_arg(args, 0)?, sym_arg(args, 1)?, sym_arg(args, 2)?);
    if !ctx.rigid().is_adjacent(from, to) || battery_of(state, robot)? > params.cost_per_move {
        return Err(Failure::precondition("no recharge needed"));
    }
    Ok(vec![
        Task::primitive("recharge", args![robot]),
        Task::primitive("move", args![robot, from, to]),
    ])
}
