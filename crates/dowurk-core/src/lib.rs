//! Client-side interaction logic for the DowUrk platform.
//!
//! This crate defines the ports (`BackendGateway`, `SessionStore`) that the
//! infrastructure layer implements, plus the payment confirmation poller and
//! the assistant conversation managers built on top of them. It depends only
//! on `dowurk-types` -- never on `dowurk-infra` or any HTTP/IO crate.

pub mod chat;
pub mod gateway;
pub mod payment;
pub mod store;

#[cfg(test)]
mod testing;
