//! Application layer for the Pages context.

pub mod command_handlers;
pub mod query_handlers;
