//! Adapters behind the domain ports: in-memory stores and notifiers.

pub mod in_memory;
pub mod notify;
