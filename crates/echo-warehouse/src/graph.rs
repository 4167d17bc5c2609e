// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Breadth-first helpers over the room graph.
//!
//! Neighbours are visited in name order, so ties between equally short
//! routes always resolve the same way.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use echo_htn::RigidRelations;

/// Category holding charging-station locations.
pub const CHARGING_STATION: &str = "charging_station";

/// BFS parent links from `start` to every reachable location.
fn parents<'r>(rigid: &'r RigidRelations, start: &'r str) -> BTreeMap<&'r str, Option<&'r str>> {
    let mut visited = BTreeMap::from([(start, None)]);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for next in rigid.neighbors(node) {
            if !visited.contains_key(next) {
                visited.insert(next, Some(node));
                queue.push_back(next);
            }
        }
    }
    visited
}

/// Locations visited after `start` on a shortest route to `end`, ending
/// with `end`. Empty when `start == end`; `None` when unreachable.
pub fn shortest_path(rigid: &RigidRelations, start: &str, end: &str) -> Option<Vec<String>> {
    let visited = parents(rigid, start);
    let mut path = Vec::new();
    let mut cursor = *visited.keys().find(|k| **k == end)?;
    while let Some(Some(prev)) = visited.get(cursor) {
        path.push(cursor.to_owned());
        cursor = *prev;
    }
    path.reverse();
    Some(path)
}

/// Number of moves on a shortest route; `None` when unreachable.
pub fn distance(rigid: &RigidRelations, a: &str, b: &str) -> Option<usize> {
    shortest_path(rigid, a, b).map(|path| path.len())
}

/// Reachable charging stations other than `loc`, nearest first.
pub fn charging_stations_by_distance(rigid: &RigidRelations, loc: &str) -> Vec<String> {
    let mut stations = Vec::new();
    let mut seen = BTreeSet::from([loc]);
    let mut queue = VecDeque::from([loc]);
    while let Some(node) = queue.pop_front() {
        for next in rigid.neighbors(node) {
            if seen.insert(next) {
                if rigid.is_a(next, CHARGING_STATION) {
                    stations.push(next.to_owned());
                }
                queue.push_back(next);
            }
        }
    }
    stations
}

/// `loc` itself when it is a station, otherwise the nearest reachable one.
pub fn closest_charging_station(rigid: &RigidRelations, loc: &str) -> Option<String> {
    if rigid.is_a(loc, CHARGING_STATION) {
        return Some(loc.to_owned());
    }
    charging_stations_by_distance(rigid, loc).into_iter().next()
}
