// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rigid (time-invariant) relations: type membership and undirected adjacency.
//!
//! Planning treats these facts as static. The only sanctioned mutation is
//! [`RigidRelations::remove_edge`], which the executor calls when execution
//! discovers that an edge is not traversable.

use std::collections::{BTreeMap, BTreeSet};

/// Static facts shared read-only by every search branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RigidRelations {
    types: BTreeMap<String, BTreeSet<String>>,
    /// Undirected edges stored as `(min, max)` pairs.
    adjacency: BTreeSet<(String, String)>,
}

fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

impl RigidRelations {
    /// Creates an empty set of rigid relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `ids` to the named category.
    pub fn declare_type<I, S>(&mut self, category: &str, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types
            .entry(category.to_owned())
            .or_default()
            .extend(ids.into_iter().map(Into::into));
    }

    /// Returns `true` when `id` belongs to `category`.
    pub fn is_a(&self, id: &str, category: &str) -> bool {
        self.types.get(category).is_some_and(|ids| ids.contains(id))
    }

    /// Members of `category` in ascending order.
    pub fn members(&self, category: &str) -> impl Iterator<Item = &str> {
        self.types
            .get(category)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// Adds an undirected edge between `a` and `b`.
    pub fn connect(&mut self, a: &str, b: &str) {
        self.adjacency.insert(edge_key(a, b));
    }

    /// Symmetric adjacency test.
    pub fn is_adjacent(&self, a: &str, b: &str) -> bool {
        self.adjacency.contains(&edge_key(a, b))
    }

    /// Neighbours of `id` in ascending order.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .adjacency
            .iter()
            .filter_map(|(a, b)| {
                if a == id {
                    Some(b.as_str())
                } else if b == id {
                    Some(a.as_str())
                } else {
                    None
                }
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Removes the undirected edge between `a` and `b`.
    ///
    /// Returns `true` if the edge existed.
    pub fn remove_edge(&mut self, a: &str, b: &str) -> bool {
        self.adjacency.remove(&edge_key(a, b))
    }

    /// All edges in canonical `(min, max)` order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }
}
