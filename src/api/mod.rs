//! API module - HTTP routes, request handlers, and the WebSocket endpoint

pub mod handlers;
pub mod routes;
pub mod ws;
