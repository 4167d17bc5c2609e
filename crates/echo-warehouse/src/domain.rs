// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Assembles the warehouse planning domain.

use echo_htn::{Domain, DomainError, RigidRelations, Task};

use crate::methods::{declare_methods, TravelStrategy};
use crate::operators::{DropOff, Move, Params, Pickup, Recharge};

/// Builds a domain with the four warehouse operators, the methods of the
/// chosen travel strategy, and route length as action cost.
pub fn warehouse_domain(
    name: &str,
    rigid: RigidRelations,
    params: Params,
    strategy: TravelStrategy,
) -> Result<Domain, DomainError> {
    let mut domain = Domain::new(name, rigid);
    domain.declare_operator("move", Move(params))?;
    domain.declare_operator("pickup", Pickup)?;
    domain.declare_operator("drop", DropOff)?;
    domain.declare_operator("recharge", Recharge(params))?;
    declare_methods(&mut domain, params, strategy)?;
    domain.set_cost_fn(route_length);
    Ok(domain)
}

/// One per move; handling and charging are free.
fn route_length(task: &Task) -> u64 {
    u64::from(task.name() == "move")
}
