//! Core types for roomsync.
//!
//! This crate mirrors the calendars of bookable resources and reports how
//! they change between polls:
//! - `appointment` holds the provider-neutral data model
//! - `engine` reconciles a fresh snapshot against the in-memory mirror
//! - `sink` delivers the resulting change events
//! - `remote` talks to provider binaries over the JSON protocol

pub mod appointment;
pub mod change;
pub mod classify;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod poller;
pub mod remote;
pub mod sink;
pub mod store;

pub use appointment::*;
pub use change::{ChangeEvent, ChangeKind};
pub use engine::{PassStats, Reconciler};
pub use error::{IdentityError, RoomSyncError, RoomSyncResult};
