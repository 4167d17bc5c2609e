// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use echo_htn::{
    args, Context, Deviation, Discovery, Domain, ExecOperator, Failure, RigidRelations, State,
    Task, Value,
};

/// Routes engine logs to the test harness; repeat calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Corridor world: one walker moving between named spots along undirected
/// edges. `reach(bot, dest)` walks the shortest path one hop at a time.
pub fn corridor(edges: &[(&str, &str)]) -> RigidRelations {
    let mut rigid = RigidRelations::new();
    for (a, b) in edges {
        rigid.declare_type("spot", [*a, *b]);
        rigid.connect(a, b);
    }
    rigid
}

/// Domain over `rigid` with planning operators and methods registered.
pub fn corridor_domain(rigid: RigidRelations) -> Domain {
    let mut domain = Domain::new("corridor", rigid);
    domain.declare_operator("step", step).expect("step");
    domain.declare_method("reach", "arrived", arrived).expect("arrived");
    domain.declare_method("reach", "walk", walk).expect("walk");
    domain
}

pub fn at(spot: &str) -> State {
    State::new("actual").with("at", "bot", spot)
}

pub fn reach(dest: &str) -> Task {
    Task::compound("reach", args!["bot", dest])
}

pub fn step_task(from: &str, to: &str) -> Task {
    Task::primitive("step", args!["bot", from, to])
}

fn sym<'a>(args: &'a [Value], idx: usize) -> Result<&'a str, Failure> {
    args.get(idx)
        .and_then(Value::as_sym)
        .ok_or(Failure::precondition("malformed arguments"))
}

pub fn step(ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<State, Failure> {
    let (bot, from, to) = (sym(args, 0)?, sym(args, 1)?, sym(args, 2)?);
    if state.sym("at", bot) != Some(from) {
        return Err(Failure::precondition("not at start"));
    }
    if !ctx.rigid().is_adjacent(from, to) {
        return Err(Failure::precondition("not adjacent"));
    }
    Ok(state.clone().with("at", bot, to))
}

fn arrived(_: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (bot, dest) = (sym(args, 0)?, sym(args, 1)?);
    if state.sym("at", bot) == Some(dest) {
        Ok(Vec::new())
    } else {
        Err(Failure::precondition("elsewhere"))
    }
}

fn walk(ctx: &Context<'_>, state: &State, args: &[Value]) -> Result<Vec<Task>, Failure> {
    let (bot, dest) = (sym(args, 0)?, sym(args, 1)?);
    let here = state.sym("at", bot).ok_or(Failure::precondition("unplaced"))?;
    let next = first_hop(ctx.rigid(), here, dest).ok_or(Failure::precondition("no path"))?;
    Ok(vec![
        Task::primitive("step", args![bot, here, next]),
        Task::compound("reach", args![bot, dest]),
    ])
}

/// First hop of a breadth-first shortest path, neighbours in name order.
pub fn first_hop(rigid: &RigidRelations, from: &str, to: &str) -> Option<String> {
    if from == to {
        return None;
    }
    let mut parent: BTreeMap<String, String> = BTreeMap::new();
    let mut seen = BTreeSet::from([from.to_owned()]);
    let mut queue = VecDeque::from([from.to_owned()]);
    while let Some(node) = queue.pop_front() {
        for next in rigid.neighbors(&node) {
            if seen.insert(next.to_owned()) {
                parent.insert(next.to_owned(), node.clone());
                queue.push_back(next.to_owned());
            }
        }
    }
    let mut hop = to.to_owned();
    loop {
        let prev = parent.get(&hop)?;
        if prev == from {
            return Some(hop);
        }
        hop = prev.clone();
    }
}

/// Execution-time `step` that hits walls the planner does not know about.
pub struct Walls {
    pub blocked: Vec<(String, String)>,
    pub report: bool,
}

impl Walls {
    pub fn reporting(blocked: &[(&str, &str)]) -> Self {
        Self {
            blocked: blocked
                .iter()
                .map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
                .collect(),
            report: true,
        }
    }

    pub fn silent(blocked: &[(&str, &str)]) -> Self {
        Self {
            report: false,
            ..Self::reporting(blocked)
        }
    }

    fn is_blocked(&self, a: &str, b: &str) -> bool {
        self.blocked
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

impl ExecOperator for Walls {
    fn execute(
        &self,
        ctx: &Context<'_>,
        state: &State,
        args: &[Value],
    ) -> Result<State, Deviation> {
        let (from, to) = (sym(args, 1)?, sym(args, 2)?);
        if self.is_blocked(from, to) {
            return Err(if self.report {
                Deviation::with_discovery(
                    "wall",
                    Discovery::EdgeBlocked(from.to_owned(), to.to_owned()),
                )
            } else {
                Deviation::new("wall")
            });
        }
        Ok(step(ctx, state, args)?)
    }
}

/// Diamond: a-b, b-d, a-c, c-d. Shortest a→d goes through b first.
pub fn diamond() -> RigidRelations {
    corridor(&[("a", "b"), ("b", "d"), ("a", "c"), ("c", "d")])
}
