//! Transports the builder sends requests through.
//!
//! [`HttpClient`] is the seam: [`BasicClient`] is the reqwest-backed default,
//! and the [`auth`] wrappers decorate any other client with credentials.

mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;
