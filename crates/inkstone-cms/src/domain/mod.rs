//! Domain layer for the Pages context.

pub mod aggregates;
pub mod commands;
pub mod events;
