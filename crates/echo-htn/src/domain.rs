// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain descriptor: name-keyed registries of operators and methods plus
//! the rigid relations they consult.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::DomainError;
use crate::method::{Context, Deviation, ExecOperator, Method, Operator};
use crate::rigid::RigidRelations;
use crate::state::State;
use crate::task::Task;

/// Cost assigned to a grounded primitive action.
pub type CostFn = Box<dyn Fn(&Task) -> u64>;

/// A method registered under a compound task name.
pub struct MethodEntry {
    label: String,
    method: Box<dyn Method>,
}

impl MethodEntry {
    /// Diagnostic label of the method.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn method(&self) -> &dyn Method {
        &*self.method
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Operators, methods, cost function, and rigid relations for one planning
/// session.
///
/// Registries are keyed by name; lookups of unregistered names surface as
/// [`PlanError::UnknownTask`](crate::PlanError::UnknownTask) during search.
/// Methods for a task are tried in registration order.
pub struct Domain {
    name: String,
    rigid: RigidRelations,
    operators: BTreeMap<String, Box<dyn Operator>>,
    exec_operators: BTreeMap<String, Box<dyn ExecOperator>>,
    methods: BTreeMap<String, Vec<MethodEntry>>,
    cost: CostFn,
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .field("methods", &self.methods)
            .field("rigid", &self.rigid)
            .finish_non_exhaustive()
    }
}

impl Domain {
    /// Creates an empty domain over `rigid`. Every action costs 1 until
    /// [`Domain::set_cost_fn`] says otherwise.
    pub fn new(name: impl Into<String>, rigid: RigidRelations) -> Self {
        Self {
            name: name.into(),
            rigid,
            operators: BTreeMap::new(),
            exec_operators: BTreeMap::new(),
            methods: BTreeMap::new(),
            cost: Box::new(|_: &Task| 1),
        }
    }

    /// Domain name (diagnostics only).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the operator for the atomic task `name`.
    pub fn declare_operator(
        &mut self,
        name: &str,
        operator: impl Operator + 'static,
    ) -> Result<(), DomainError> {
        if self.operators.contains_key(name) {
            return Err(DomainError::DuplicateOperator(name.to_owned()));
        }
        self.operators.insert(name.to_owned(), Box::new(operator));
        Ok(())
    }

    /// Appends a method for the compound task `task`.
    pub fn declare_method(
        &mut self,
        task: &str,
        label: &str,
        method: impl Method + 'static,
    ) -> Result<(), DomainError> {
        let entries = self.methods.entry(task.to_owned()).or_default();
        if entries.iter().any(|e| e.label == label) {
            return Err(DomainError::DuplicateMethod {
                task: task.to_owned(),
                label: label.to_owned(),
            });
        }
        entries.push(MethodEntry {
            label: label.to_owned(),
            method: Box::new(method),
        });
        Ok(())
    }

    /// Registers the execution-time variant of an existing operator.
    pub fn declare_exec_operator(
        &mut self,
        name: &str,
        operator: impl ExecOperator + 'static,
    ) -> Result<(), DomainError> {
        if !self.operators.contains_key(name) {
            return Err(DomainError::UnknownOperator(name.to_owned()));
        }
        if self.exec_operators.contains_key(name) {
            return Err(DomainError::DuplicateExecOperator(name.to_owned()));
        }
        self.exec_operators.insert(name.to_owned(), Box::new(operator));
        Ok(())
    }

    /// Replaces the action cost function.
    pub fn set_cost_fn(&mut self, cost: impl Fn(&Task) -> u64 + 'static) {
        self.cost = Box::new(cost);
    }

    /// Cost of one grounded action.
    pub fn cost_of(&self, task: &Task) -> u64 {
        (self.cost)(task)
    }

    /// Static facts.
    pub fn rigid(&self) -> &RigidRelations {
        &self.rigid
    }

    /// Removes a traversability fact learned during execution.
    ///
    /// Only the executor reaches this; planning sessions see the domain
    /// through a shared reference.
    pub(crate) fn remove_edge(&mut self, a: &str, b: &str) -> bool {
        let removed = self.rigid.remove_edge(a, b);
        debug!(domain = %self.name, a, b, removed, "rigid edge removed");
        removed
    }

    /// Operator registered for `name`.
    pub fn operator(&self, name: &str) -> Option<&dyn Operator> {
        self.operators.get(name).map(|op| &**op)
    }

    /// Methods registered for `name`, in declaration order.
    pub fn methods(&self, name: &str) -> Option<&[MethodEntry]> {
        self.methods.get(name).map(Vec::as_slice)
    }

    /// `true` if an execution variant exists for `name`.
    pub fn has_exec_operator(&self, name: &str) -> bool {
        self.exec_operators.contains_key(name)
    }

    /// Names of all registered operators.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Names of all compound tasks with at least one method.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Executes a primitive task against the actual world.
    ///
    /// Uses the execution variant when registered, otherwise the planning
    /// operator (whose precondition failures become deviations).
    pub fn execute(&self, state: &State, task: &Task) -> Result<State, Deviation> {
        let ctx = Context::new(&self.rigid, 0, 0);
        if let Some(exec) = self.exec_operators.get(task.name()) {
            return exec.execute(&ctx, state, task.args());
        }
        match self.operators.get(task.name()) {
            Some(op) => op.apply(&ctx, state, task.args()).map_err(Deviation::from),
            None => Err(Deviation::new("no operator registered")),
        }
    }
}
