//! Application layer orchestrating a tip submission.
//!
//! `TippingSession` owns the submission state machine and is the only thing
//! that talks to a `PaymentGateway`.

pub mod session;
