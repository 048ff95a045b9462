//! Infrastructure layer for DowUrk.
//!
//! Contains implementations of the ports defined in `dowurk-core`: the
//! reqwest-backed [`http::HttpBackendGateway`], the file and in-memory
//! session stores, and the `config.toml` loader.

pub mod config;
pub mod http;
pub mod store;
