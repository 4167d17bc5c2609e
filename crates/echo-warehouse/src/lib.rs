// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! echo-warehouse: warehouse robot logistics on top of `echo-htn`.
//!
//! Robots move between rooms, carry one object at a time, and spend battery
//! on every move. A [`Scenario`] loaded from YAML yields the planning
//! [`Domain`](echo_htn::Domain), the initial state, the delivery goal, and an
//! [`Executor`](echo_htn::Executor) whose moves can run into obstacles the
//! planner never saw.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions
)]

mod domain;
pub mod fixtures;
pub mod graph;
mod methods;
pub mod operators;
mod scenario;

/// Domain assembly.
pub use domain::warehouse_domain;
/// Travel strategy selection.
pub use methods::TravelStrategy;
/// Scenario loading.
pub use scenario::{Initial, Scenario, ScenarioError};
