// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World state: named relations mapping entity identifiers to values.
//!
//! Relations and entities are kept in `BTreeMap`s so iteration order (and
//! therefore every method that walks the state) is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A grounded value stored in a relation or passed as a task argument.
///
/// Variant order matters for untagged deserialization: booleans and
/// integers are tried before symbols so `3` never becomes `"3"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean fact.
    Bool(bool),
    /// Signed integer quantity (battery level, counters, indices).
    Int(i64),
    /// Entity identifier or other symbolic constant.
    Sym(String),
    /// Ordered list of values (cargo, candidate orderings).
    List(Vec<Value>),
    /// Keyed values (e.g. object → destination assignments).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the symbol if this value is a [`Value::Sym`].
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Self::Sym(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this value is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements if this value is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this value is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Sym(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Sym(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::Map(entries)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Sym(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// One relation: entity identifier → value.
pub type Relation = BTreeMap<String, Value>;

/// Mutable snapshot of domain facts.
///
/// Only operator effects change a `State`. Search branches receive their own
/// clone, so a failed branch is discarded by dropping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    name: String,
    #[serde(default)]
    relations: BTreeMap<String, Relation>,
}

impl State {
    /// Creates an empty state with a diagnostic name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: BTreeMap::new(),
        }
    }

    /// Diagnostic name of this snapshot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy of this state under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relations: self.relations.clone(),
        }
    }

    /// Builder-style [`State::set`].
    pub fn with(
        mut self,
        relation: &str,
        entity: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set(relation, entity, value);
        self
    }

    /// Full relation table, if any entity has a value for it.
    pub fn relation(&self, relation: &str) -> Option<&Relation> {
        self.relations.get(relation)
    }

    /// Names of all relations present in this state.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }

    /// Raw value of `relation[entity]`.
    pub fn get(&self, relation: &str, entity: &str) -> Option<&Value> {
        self.relations.get(relation)?.get(entity)
    }

    /// Symbolic value of `relation[entity]`.
    pub fn sym(&self, relation: &str, entity: &str) -> Option<&str> {
        self.get(relation, entity)?.as_sym()
    }

    /// Integer value of `relation[entity]`.
    pub fn int(&self, relation: &str, entity: &str) -> Option<i64> {
        self.get(relation, entity)?.as_int()
    }

    /// List value of `relation[entity]`.
    pub fn list(&self, relation: &str, entity: &str) -> Option<&[Value]> {
        self.get(relation, entity)?.as_list()
    }

    /// Sets `relation[entity] = value`, creating the relation if needed.
    pub fn set(&mut self, relation: &str, entity: impl Into<String>, value: impl Into<Value>) {
        self.relations
            .entry(relation.to_owned())
            .or_default()
            .insert(entity.into(), value.into());
    }

    /// Appends to the list stored at `relation[entity]`.
    ///
    /// A missing entry becomes a one-element list. Returns `false` (and
    /// leaves the state untouched) when the existing value is not a list.
    pub fn push(&mut self, relation: &str, entity: &str, value: impl Into<Value>) -> bool {
        let slot = self
            .relations
            .entry(relation.to_owned())
            .or_default()
            .entry(entity.to_owned())
            .or_insert_with(|| Value::List(Vec::new()));
        match slot {
            Value::List(items) => {
                items.push(value.into());
                true
            }
            _ => false,
        }
    }

    /// Removes the first occurrence of `value` from the list at
    /// `relation[entity]`. Returns whether anything was removed.
    pub fn remove_from(&mut self, relation: &str, entity: &str, value: &Value) -> bool {
        let Some(Value::List(items)) = self
            .relations
            .get_mut(relation)
            .and_then(|r| r.get_mut(entity))
        else {
            return false;
        };
        match items.iter().position(|v| v == value) {
            Some(idx) => {
                items.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (relation, entries) in &self.relations {
            write!(f, "{}.{relation} = {{", self.name)?;
            for (i, (entity, value)) in entries.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{entity}: {value}")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
