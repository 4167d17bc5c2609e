// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Grounded tasks and the task network (ordered remaining work).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::state::Value;

/// Whether a task is executed by an operator or decomposed by methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Atomic task: exactly one operator applies it.
    Primitive,
    /// Compound task: decomposed by the methods registered under its name.
    Compound,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive => f.write_str("operator"),
            Self::Compound => f.write_str("method"),
        }
    }
}

/// A grounded task call: name plus concrete arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    kind: TaskKind,
    name: String,
    args: Vec<Value>,
}

impl Task {
    /// Atomic task applied by the operator named `name`.
    pub fn primitive(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            kind: TaskKind::Primitive,
            name: name.into(),
            args,
        }
    }

    /// Compound task decomposed by the methods registered under `name`.
    pub fn compound(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            kind: TaskKind::Compound,
            name: name.into(),
            args,
        }
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Operator or method-group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grounded arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// `true` for atomic tasks.
    pub fn is_primitive(&self) -> bool {
        self.kind == TaskKind::Primitive
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Builds a `Vec<Value>` from heterogeneous literals.
///
/// ```
/// use echo_htn::{args, Value};
/// let a = args!["R1", 3];
/// assert_eq!(a, vec![Value::from("R1"), Value::Int(3)]);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::Value::from($arg)),*]
    };
}

struct Link {
    task: Task,
    next: Option<Rc<Link>>,
}

/// Ordered sequence of tasks still to be accomplished.
///
/// Persistent list: prepending a decomposition shares the deferred tail with
/// the parent network, so a child node never copies or mutates the tasks
/// its siblings will see.
#[derive(Clone, Default)]
pub struct TaskNetwork {
    head: Option<Rc<Link>>,
    len: usize,
}

impl TaskNetwork {
    /// The empty network (nothing left to do).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks remaining.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no tasks remain.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Head task and the deferred tail.
    pub fn split_first(&self) -> Option<(&Task, TaskNetwork)> {
        let link = self.head.as_ref()?;
        let tail = Self {
            head: link.next.clone(),
            len: self.len - 1,
        };
        Some((&link.task, tail))
    }

    /// Returns `tasks ++ self`, sharing `self` as the tail.
    pub fn prepend(&self, tasks: Vec<Task>) -> TaskNetwork {
        let mut out = self.clone();
        for task in tasks.into_iter().rev() {
            out.head = Some(Rc::new(Link {
                task,
                next: out.head.take(),
            }));
            out.len += 1;
        }
        out
    }

    /// Iterates tasks from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cursor: self.head.as_deref(),
        }
    }

    /// Copies the remaining tasks into a vector.
    pub fn to_vec(&self) -> Vec<Task> {
        self.iter().cloned().collect()
    }
}

/// Borrowing iterator over a [`TaskNetwork`].
pub struct Iter<'a> {
    cursor: Option<&'a Link>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.cursor?;
        self.cursor = link.next.as_deref();
        Some(&link.task)
    }
}

impl<'a> IntoIterator for &'a TaskNetwork {
    type Item = &'a Task;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Task> for TaskNetwork {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self::new().prepend(iter.into_iter().collect())
    }
}

impl PartialEq for TaskNetwork {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for TaskNetwork {}

impl fmt::Debug for TaskNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for TaskNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, task) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{task}")?;
        }
        f.write_str("]")
    }
}
