//! WebSocket HTTP handler for the web layer.
//!
//! Only the upgrade and the frame translation live here. Registration,
//! routing and liveness are owned by `hub::Session`.

pub mod handler;
