//! HTTP handlers for the server.

pub mod carousel;
pub mod health;
