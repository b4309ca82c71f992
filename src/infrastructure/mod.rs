//! Adapters implementing the `PaymentGateway` port.

pub mod http;
pub mod simulated;
