//! Inkstone CMS — Pages bounded context.
//!
//! Event-sourced page management: the `Page` aggregate, its domain events
//! and commands, command/query handlers, the page-index projection, and
//! the configuration-gated module bootstrap.

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod projection;
