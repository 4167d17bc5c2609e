// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use echo_htn::{Task, Value};

/// Routes engine logs to the test harness; repeat calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn act(name: &str, args: &[&str]) -> Task {
    Task::primitive(name, args.iter().map(|a| Value::from(*a)).collect())
}

pub fn mv(from: &str, to: &str) -> Task {
    act("move", &["R1", from, to])
}

pub fn pickup(object: &str) -> Task {
    act("pickup", &["R1", object])
}

pub fn drop_off(object: &str) -> Task {
    act("drop", &["R1", object])
}

pub fn recharge() -> Task {
    act("recharge", &["R1"])
}
