//! Registry module - live display connections and the push message envelope

pub mod connection;
pub mod message;

pub use connection::{ConnectionId, ConnectionRegistry, Delivery};
pub use message::DisplayMessage;
