//! Library crate for unison-back, exposing modules for binaries and tests.

pub mod config;
mod dto;
mod error;
/// HTTP routes.
pub mod routes;
/// Business services between routes and state.
pub mod services;
pub mod state;
