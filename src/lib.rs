//! GearGuard: maintenance management server and board client.
//!
//! The server exposes an equipment registry, a maintenance-request board with
//! status transitions, a preventive-maintenance calendar and dashboard
//! aggregates under `/api`. The [`board`] module is the client half of the
//! request board.

pub mod board;
pub mod calendar;
pub mod core;
pub mod dashboards;
pub mod equipment;
pub mod main_module;
pub mod security;
pub mod tasks;
pub mod users;
