use crate::st_model::Ship;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FleetRole {
    /// Buys scouts and runs the trades.
    Command,
    /// Keeps market data fresh.
    Scout,
}

impl FleetRole {
    pub fn of(ship: &Ship) -> Self {
        match ship.registration.role.as_str() {
            "COMMAND" => FleetRole::Command,
            _ => FleetRole::Scout,
        }
    }
}

pub fn count_scouts<'a>(ships: impl IntoIterator<Item = &'a Ship>) -> usize {
    ships.into_iter().filter(|ship| FleetRole::of(ship) == FleetRole::Scout).count()
}
