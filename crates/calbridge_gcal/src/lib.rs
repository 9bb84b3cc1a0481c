// --- File: crates/calbridge_gcal/src/lib.rs ---
// Declare modules within this crate
pub mod auth;
#[cfg(test)]
mod auth_test;
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod queue;
#[cfg(test)]
mod queue_test;
pub mod routes;
pub mod service;
#[cfg(test)]
mod service_test;
pub mod sweeper;

pub use handlers::GcalState;
pub use queue::{PendingEvent, PendingEventQueue};
pub use sweeper::{RetrySweeper, SweeperHandle, SweeperSettings};
