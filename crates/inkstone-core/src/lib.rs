//! Inkstone Core — event-sourced CQRS abstractions.
//!
//! This crate defines the domain-event and aggregate-root contracts, the
//! command/query buses, the event-store gateway consumed by the aggregate
//! repository, the projection engine, and the module configuration
//! registry. It contains no infrastructure code.

pub mod aggregate;
pub mod bus;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod projection;
pub mod query;
pub mod repository;
pub mod store;
