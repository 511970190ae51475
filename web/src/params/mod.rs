//! Typed inputs for the HTTP and WebSocket endpoints.
//!
//! Query strings and JSON bodies are deserialized into these structs before a
//! handler runs, so malformed requests are rejected by the extractor.

pub(crate) mod broadcast;
pub(crate) mod connection;
pub(crate) mod job;
