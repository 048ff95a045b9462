//! Shared domain types for the DowUrk interaction client.
//!
//! This crate contains the wire and domain types used across the workspace:
//! checkout/payment status, chat messages, the locally persisted user record,
//! client configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod payment;
pub mod user;
