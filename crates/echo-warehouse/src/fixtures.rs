// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned scenarios used by tests and demos.

/// One robot, one package, no stations: the robot recharges wherever its
/// battery runs low.
pub const SIMPLE: &str = r"
name: simple
robots: [R1]
objects: [c1]
locations: [room1, room2, room3, room4]
adjacency:
  - [room1, room2]
  - [room1, room3]
  - [room2, room4]
cost_per_move: 25
full_battery: 100
initial:
  loc: { R1: room1, c1: room3 }
  battery: { R1: 50 }
deliveries:
  R1: { c1: room4 }
";

/// Nine rooms, three charging stations, three deliveries. No plan exists
/// without recharging.
pub const WAREHOUSE: &str = r"
name: warehouse
robots: [R1]
objects: [c1, c2, c3]
locations: [room1, room2, room3, room4, room5, room6, room7, room8, room9]
charging_stations: [room3, room6, room9]
adjacency:
  - [room1, room2]
  - [room2, room3]
  - [room2, room4]
  - [room2, room5]
  - [room5, room6]
  - [room3, room4]
  - [room3, room7]
  - [room7, room8]
  - [room8, room9]
  - [room6, room9]
cost_per_move: 20
full_battery: 100
initial:
  loc: { R1: room1, c1: room4, c2: room6, c3: room8 }
  battery: { R1: 100 }
deliveries:
  R1: { c1: room2, c2: room7, c3: room5 }
";

/// A ring of four rooms whose shorter-looking side is blocked.
pub const DETOUR: &str = r"
name: detour
robots: [R1]
objects: [c1]
locations: [room1, room2, room3, room4]
adjacency:
  - [room1, room2]
  - [room2, room4]
  - [room1, room3]
  - [room3, room4]
cost_per_move: 10
full_battery: 100
initial:
  loc: { R1: room1, c1: room1 }
  battery: { R1: 100 }
deliveries:
  R1: { c1: room4 }
obstacles:
  - [room1, room2]
";
