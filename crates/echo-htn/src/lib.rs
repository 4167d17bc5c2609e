// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! echo-htn: hierarchical task network planning engine.
//!
//! A [`Domain`] registers primitive [`Operator`]s and compound-task
//! [`Method`]s by name. [`Planner::plan`] runs depth-first decomposition with
//! backtracking and returns the first valid [`Plan`];
//! [`Planner::plan_optimal`] runs branch-and-bound for the cheapest plan
//! under a cost bound. [`Executor::run_lazy_lookahead`] executes plans
//! against the actual world and replans when execution deviates.
//!
//! Search is single-threaded and deterministic: alternatives are tried in
//! registration order and every registry iterates in key order, so identical
//! inputs produce identical plans.
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
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod config;
mod domain;
mod error;
mod lookahead;
mod method;
mod optimal;
mod plan;
mod planner;
mod rigid;
mod state;
mod task;

/// Planner configuration and its storage port.
pub use config::{ConfigError, ConfigService, ConfigStore, FsConfigStore, PlannerConfig};
/// Operator and method registries.
pub use domain::{CostFn, Domain, MethodEntry};
/// Failure signals and terminal errors.
pub use error::{DomainError, ExecutionFailure, Exhaustion, Failure, PlanError};
/// Lazy-lookahead executor and its trace.
pub use lookahead::{ExecutionReport, ExecutionTrace, Executor, StepOutcome, TraceStep};
/// Extension seams for domains.
pub use method::{Context, Deviation, Discovery, ExecOperator, Method, Operator};
/// Search results.
pub use plan::{Plan, SearchStats};
/// Seek-plan search.
pub use planner::{Planner, SearchNode, ValidationError};
/// Static facts.
pub use rigid::RigidRelations;
/// World state.
pub use state::{Relation, State, Value};
/// Tasks and task networks.
pub use task::{Task, TaskKind, TaskNetwork};
