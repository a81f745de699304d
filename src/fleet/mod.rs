pub mod controller;
pub mod role;
pub mod scheduler;

pub use controller::{run_unit, IdleReason, TickOutcome};
pub use role::FleetRole;
pub use scheduler::{TurnScheduler, TurnSummary};
