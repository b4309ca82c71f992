//! Domain types for a tip submission: validated values, the gateway port and
//! the state a session exposes to its host.

pub mod amount;
pub mod phone;
pub mod ports;
pub mod session;
pub mod tip;
