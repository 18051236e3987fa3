//! Client side of the maintenance board.
//!
//! [`BoardViewModel`] groups the server's task feed into status columns and
//! [`KanbanController`] turns drag gestures into `PATCH /api/tasks/{id}/status`
//! calls. A failed move is reconciled by refetching the whole list rather than
//! by undoing locally.

pub mod client;
pub mod controller;
pub mod view_model;

pub use client::{ApiClient, ClientError, TaskApi};
pub use controller::{DragError, DragState, DropOutcome, DropTarget, KanbanController};
pub use view_model::BoardViewModel;
